//! Storefront flows against the in-memory adapters: catalog, cart to
//! checkout, reservation slots, contact messages, and collection watches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use uuid::Uuid;

use garage_api::{
    config::AppConfig,
    dto::cart::AddToCartRequest,
    dto::commands::CheckoutRequest,
    dto::contact::ContactRequest,
    dto::reservations::CreateReservationRequest,
    error::AppError,
    media::LocalMediaHost,
    models::{Product, decode_document},
    routes::params::Pagination,
    services::{cart_service, command_service, contact_service, reservation_service},
    sessions::{Session, Sessions},
    state::AppState,
    store::{Collection, MemoryStore},
};

fn test_state() -> AppState {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        admin_password_hash: None,
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

async fn seed_product(state: &AppState, name: &str, price: f64, stock: i32) -> Product {
    let doc = state
        .store
        .create(
            Collection::Products,
            json!({
                "name": name,
                "price": price,
                "stock": stock,
                "available": true,
            }),
        )
        .await
        .unwrap();
    decode_document(&doc).unwrap()
}

fn customer() -> CheckoutRequest {
    CheckoutRequest {
        name: "Claire Dubois".to_string(),
        phone: "+33 6 12 34 56 78".to_string(),
        email: "claire@example.fr".to_string(),
        address: Some("3 rue du Port, Lyon".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn checkout_snapshots_cart_decrements_stock_and_clears() {
    let state = test_state();
    let session: Arc<Session> = state.sessions.create();
    let oil = seed_product(&state, "Huile 5W30", 42.90, 10).await;
    let pads = seed_product(&state, "Plaquettes", 49.90, 4).await;

    cart_service::add(
        &state,
        &session,
        AddToCartRequest {
            product_id: oil.id,
            quantity: 2,
        },
    )
    .await
    .unwrap();
    cart_service::add(
        &state,
        &session,
        AddToCartRequest {
            product_id: pads.id,
            quantity: 1,
        },
    )
    .await
    .unwrap();

    let resp = command_service::checkout(&state, &session, customer())
        .await
        .unwrap();
    let command = resp.data.unwrap();
    assert_eq!(command.items.len(), 2);
    assert_eq!(command.status, "pending");
    assert!((command.total - (42.90 * 2.0 + 49.90)).abs() < 1e-9);

    // Stock went down, clamped decrement per product.
    let oil_after: Product = decode_document(
        &state
            .store
            .get(Collection::Products, oil.id)
            .await
            .unwrap()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(oil_after.stock, 8);

    // Checkout cleared the session cart.
    assert_eq!(session.cart.total_items(), 0);
    assert_eq!(session.cart.total(), 0.0);
}

#[tokio::test]
async fn checkout_rejects_insufficient_stock_and_empty_cart() {
    let state = test_state();
    let session = state.sessions.create();
    let rare = seed_product(&state, "Batterie", 109.0, 1).await;

    let err = command_service::checkout(&state, &session, customer())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    cart_service::add(
        &state,
        &session,
        AddToCartRequest {
            product_id: rare.id,
            quantity: 3,
        },
    )
    .await
    .unwrap();
    let err = command_service::checkout(&state, &session, customer())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    // Rejected checkout leaves the cart untouched.
    assert_eq!(session.cart.total_items(), 3);
}

#[tokio::test]
async fn adding_unknown_product_is_a_validation_error() {
    let state = test_state();
    let session = state.sessions.create();

    let err = cart_service::add(
        &state,
        &session,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn reserved_slots_are_marked_taken_and_past_dates_blocked() {
    let state = test_state();
    let date = Utc::now().date_naive() + ChronoDuration::days(3);

    for slot in ["09:00", "10:00"] {
        reservation_service::book(
            &state,
            CreateReservationRequest {
                date,
                time_slot: slot.to_string(),
                name: "Marc".to_string(),
                phone: "0612345678".to_string(),
                email: "marc@example.fr".to_string(),
                vehicle: Some("Clio IV".to_string()),
                reason: None,
            },
        )
        .await
        .unwrap();
    }

    let availability = reservation_service::availability(&state, date)
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(!availability.past);
    for slot in &availability.slots {
        let expected_taken = slot.time == "09:00" || slot.time == "10:00";
        assert_eq!(slot.available, !expected_taken, "slot {}", slot.time);
    }

    // A past date is not bookable at all.
    let yesterday = Utc::now().date_naive() - ChronoDuration::days(1);
    let past = reservation_service::availability(&state, yesterday)
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(past.past);
    assert!(past.slots.iter().all(|s| !s.available));

    let err = reservation_service::book(
        &state,
        CreateReservationRequest {
            date: yesterday,
            time_slot: "09:00".to_string(),
            name: "Marc".to_string(),
            phone: "0612345678".to_string(),
            email: "marc@example.fr".to_string(),
            vehicle: None,
            reason: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn double_booking_same_slot_is_rejected_by_the_precheck() {
    let state = test_state();
    let date = Utc::now().date_naive() + ChronoDuration::days(1);
    let request = || CreateReservationRequest {
        date,
        time_slot: "14:00".to_string(),
        name: "Ana".to_string(),
        phone: "0698765432".to_string(),
        email: "ana@example.fr".to_string(),
        vehicle: None,
        reason: Some("Révision".to_string()),
    };

    reservation_service::book(&state, request()).await.unwrap();
    let err = reservation_service::book(&state, request()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn contact_messages_round_trip() {
    let state = test_state();

    let created = contact_service::create(
        &state,
        ContactRequest {
            name: "Sophie".to_string(),
            email: "sophie@example.fr".to_string(),
            phone: None,
            subject: Some("Devis".to_string()),
            message: "Bonjour, je voudrais un devis pour un embrayage.".to_string(),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();

    let listed = contact_service::list(
        &state,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, created.id);

    let err = contact_service::create(
        &state,
        ContactRequest {
            name: "".to_string(),
            email: "sophie@example.fr".to_string(),
            phone: None,
            subject: None,
            message: "hi".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn collection_watch_yields_fresh_snapshots() {
    let state = test_state();

    let mut watch = state.store.watch(Collection::Commands).await.unwrap();
    assert!(watch.current.is_empty());

    let doc = state
        .store
        .create(Collection::Commands, json!({ "status": "pending" }))
        .await
        .unwrap();
    let after_create = watch.changed().await.unwrap();
    assert_eq!(after_create.len(), 1);

    state
        .store
        .update(Collection::Commands, doc.id, json!({ "status": "ready" }))
        .await
        .unwrap();
    let after_update = watch.changed().await.unwrap();
    assert_eq!(after_update[0].data["status"], "ready");

    state
        .store
        .delete(Collection::Commands, doc.id)
        .await
        .unwrap();
    let after_delete = watch.changed().await.unwrap();
    assert!(after_delete.is_empty());
}
