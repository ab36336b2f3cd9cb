//! Admin flows: the login gate, product management with CSV import, and
//! command tracking.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use garage_api::{
    config::AppConfig,
    dto::auth::LoginRequest,
    dto::commands::UpdateStatusRequest,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppError,
    media::LocalMediaHost,
    routes::params::{CommandListQuery, Pagination, ProductQuery},
    middleware::auth::AdminSession,
    services::{admin_service, command_service, product_service},
    sessions::Sessions,
    state::AppState,
    store::{Collection, MemoryStore},
};

const PASSWORD: &str = "atelier-secret";

fn test_state() -> AppState {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        admin_password_hash: Some(hash),
        cart_sync_seconds: 5,
        session_ttl_minutes: 120,
        media_dir: std::env::temp_dir()
            .join("garage-api-test-media")
            .to_string_lossy()
            .into_owned(),
        public_base_url: String::new(),
        frontend_origin: "http://localhost:5173".to_string(),
    };
    AppState {
        config: Arc::new(config),
        store: Arc::new(MemoryStore::new()),
        sessions: Arc::new(Sessions::new(Duration::from_secs(3600))),
        images: Arc::new(LocalMediaHost::new(std::env::temp_dir(), "")),
    }
}

fn product_query() -> ProductQuery {
    ProductQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        q: None,
        category: None,
        sort_by: None,
        sort_order: None,
    }
}

#[test]
fn login_flips_the_session_flag_and_logout_clears_it() {
    let state = test_state();
    let session = state.sessions.create();
    assert!(!session.is_admin());

    let err = admin_service::login(
        &state,
        &session,
        LoginRequest {
            password: "wrong".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert!(!session.is_admin());

    admin_service::login(
        &state,
        &session,
        LoginRequest {
            password: PASSWORD.to_string(),
        },
    )
    .unwrap();
    assert!(session.is_admin());

    admin_service::logout(&session);
    assert!(!session.is_admin());
}

#[tokio::test]
async fn admin_extractor_answers_401_until_login() {
    let state = test_state();
    let session = state.sessions.create();

    let request = Request::builder()
        .uri("/api/admin/dashboard")
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    parts.extensions.insert(session.clone());

    // Before login the gate rejects with 401.
    let err = AdminSession::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);

    admin_service::login(
        &state,
        &session,
        LoginRequest {
            password: PASSWORD.to_string(),
        },
    )
    .unwrap();

    // After login the same request passes through to the session.
    let AdminSession(admin) = AdminSession::from_request_parts(&mut parts, &())
        .await
        .unwrap();
    assert_eq!(admin.id, session.id);
}

#[test]
fn login_is_disabled_without_a_configured_hash() {
    let mut state = test_state();
    let mut config = (*state.config).clone();
    config.admin_password_hash = None;
    state.config = Arc::new(config);
    let session = state.sessions.create();

    let err = admin_service::login(
        &state,
        &session,
        LoginRequest {
            password: PASSWORD.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn product_crud_and_admin_listing() {
    let state = test_state();
    let session = state.sessions.create();

    let created = product_service::create(
        &state,
        session.id,
        CreateProductRequest {
            name: "Filtre à air".to_string(),
            description: None,
            price: 18.90,
            image_url: None,
            category: Some("Entretien".to_string()),
            stock: 5,
            available: Some(false),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();

    // Unavailable products are hidden from the storefront but visible to
    // the admin listing.
    let public = product_service::list_public(&state, product_query())
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(public.items.is_empty());
    let admin = product_service::list_admin(&state, product_query())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(admin.items.len(), 1);

    let updated = product_service::update(
        &state,
        session.id,
        created.id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: Some(21.50),
            image_url: None,
            category: None,
            stock: None,
            available: Some(true),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(updated.price, 21.50);
    assert!(updated.available);

    product_service::delete(&state, session.id, created.id)
        .await
        .unwrap();
    let err = product_service::get(&state, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn csv_import_reports_per_line_errors() {
    let state = test_state();
    let session = state.sessions.create();

    let csv = "\
name,price,category,stock\n\
Huile 5W40,39.90,Entretien,12\n\
\"Plaquettes, avant\",\"49,90\",Freinage,6\n\
,10.00,Entretien,1\n\
Bougie,free,Allumage,4\n\
Ampoule H7,6.50,Éclairage,notanumber\n";

    let report = product_service::import_csv(&state, session.id, csv)
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(report.created, 2);
    let lines: Vec<usize> = report.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![4, 5, 6]);

    let listed = product_service::list_admin(&state, product_query())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 2);
    let pads = listed
        .items
        .iter()
        .find(|p| p.name == "Plaquettes, avant")
        .unwrap();
    assert!((pads.price - 49.90).abs() < 1e-9);
}

#[tokio::test]
async fn csv_import_requires_name_and_price_columns() {
    let state = test_state();
    let session = state.sessions.create();

    let err = product_service::import_csv(&state, session.id, "title,cost\nfoo,1\n")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn command_status_transitions_are_validated() {
    let state = test_state();
    let session = state.sessions.create();

    let doc = state
        .store
        .create(
            Collection::Commands,
            json!({
                "customer": {"name": "A", "phone": "0600000000", "email": "a@b.fr"},
                "items": [],
                "total": 0.0,
                "status": "pending",
            }),
        )
        .await
        .unwrap();

    let updated = command_service::update_status(
        &state,
        session.id,
        doc.id,
        UpdateStatusRequest {
            status: "confirmed".to_string(),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(updated.status, "confirmed");

    let err = command_service::update_status(
        &state,
        session.id,
        doc.id,
        UpdateStatusRequest {
            status: "teleported".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Status filter on the listing.
    let filtered = command_service::list(
        &state,
        CommandListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            status: Some("confirmed".to_string()),
            sort_order: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(filtered.items.len(), 1);
}

#[tokio::test]
async fn dashboard_counts_every_collection() {
    let state = test_state();

    state
        .store
        .create(Collection::Products, json!({ "name": "p", "price": 1.0 }))
        .await
        .unwrap();
    state
        .store
        .create(
            Collection::Reservations,
            json!({
                "date": "2026-09-01", "time_slot": "09:00",
                "name": "n", "phone": "0600000000", "email": "n@b.fr",
                "status": "pending",
            }),
        )
        .await
        .unwrap();

    let dashboard = admin_service::dashboard(&state).await.unwrap().data.unwrap();
    assert_eq!(dashboard.products, 1);
    assert_eq!(dashboard.reservations, 1);
    assert_eq!(dashboard.commands, 0);
    assert_eq!(dashboard.messages, 0);
    assert_eq!(dashboard.recent_reservations.len(), 1);
}
