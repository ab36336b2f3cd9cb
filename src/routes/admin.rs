//! Admin surface. Every route except login takes the [`AdminSession`]
//! extractor, which answers 401 until the session's admin flag is set.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch, post},
};
use futures_util::{Stream, StreamExt, stream};
use uuid::Uuid;

use crate::{
    dto::admin::Dashboard,
    dto::auth::{LoginRequest, SessionInfo},
    dto::commands::{CommandList, UpdateStatusRequest},
    dto::contact::MessageList,
    dto::products::{
        CreateProductRequest, ImportReport, ProductList, UpdateProductRequest, UploadedImage,
    },
    dto::reservations::ReservationList,
    error::{AppError, AppResult},
    middleware::auth::{AdminSession, ClientSession},
    models::{Command, ContactMessage, Product, Reservation, decode_or_skip},
    response::ApiResponse,
    routes::params::{CommandListQuery, Pagination, ProductQuery, ReservationListQuery},
    services::{admin_service, command_service, contact_service, product_service, reservation_service},
    state::AppState,
    store::{Collection, Document},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .route("/dashboard", get(dashboard))
        .route("/products", get(list_products).post(create_product))
        .route("/products/import", post(import_products))
        .route("/products/image", post(upload_product_image))
        .route(
            "/products/{id}",
            axum::routing::put(update_product).delete(delete_product),
        )
        .route("/commands", get(list_commands))
        .route("/commands/stream", get(stream_commands))
        .route("/commands/{id}", get(get_command).delete(delete_command))
        .route("/commands/{id}/status", patch(update_command_status))
        .route("/reservations", get(list_reservations))
        .route(
            "/reservations/{id}",
            get(get_reservation).delete(delete_reservation),
        )
        .route("/reservations/{id}/status", patch(update_reservation_status))
        .route("/messages", get(list_messages))
        .route("/messages/{id}", get(get_message).delete(delete_message))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session is now admin", body = ApiResponse<SessionInfo>),
        (status = 401, description = "Wrong password or login disabled"),
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionInfo>>> {
    let resp = admin_service::login(&state, &session, payload)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Admin flag cleared", body = ApiResponse<SessionInfo>),
    ),
    tag = "Admin"
)]
pub async fn logout(ClientSession(session): ClientSession) -> Json<ApiResponse<SessionInfo>> {
    Json(admin_service::logout(&session))
}

#[utoipa::path(
    get,
    path = "/api/admin/session",
    responses(
        (status = 200, description = "Whether this session is admin", body = ApiResponse<SessionInfo>),
    ),
    tag = "Admin"
)]
pub async fn session_info(ClientSession(session): ClientSession) -> Json<ApiResponse<SessionInfo>> {
    Json(admin_service::session_info(&session))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Counts and recent activity", body = ApiResponse<Dashboard>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = admin_service::dashboard(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search"),
        ("category" = Option<String>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "All products, unavailable included", body = ApiResponse<ProductList>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_admin(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create(&state, session.id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update(&state, session.id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete(&state, session.id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Created count plus per-line errors", body = ApiResponse<ImportReport>),
        (status = 400, description = "Unusable file"),
    ),
    tag = "Admin"
)]
pub async fn import_products(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    body: String,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    let resp = product_service::import_csv(&state, session.id, &body).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/image",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Hosted image URL", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Missing image field"),
        (status = 502, description = "Upload failed"),
    ),
    tag = "Admin"
)]
pub async fn upload_product_image(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedImage>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::field("image", "missing content type"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
        let resp =
            product_service::upload_image(&state, session.id, &content_type, bytes.to_vec())
                .await?;
        return Ok(Json(resp));
    }
    Err(AppError::field("image", "field is missing"))
}

#[utoipa::path(
    get,
    path = "/api/admin/commands",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc for oldest first"),
    ),
    responses(
        (status = 200, description = "Commands, newest first", body = ApiResponse<CommandList>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn list_commands(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<CommandListQuery>,
) -> AppResult<Json<ApiResponse<CommandList>>> {
    let resp = command_service::list(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/commands/stream",
    responses(
        (status = 200, description = "SSE stream of the full command listing on every change"),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn stream_commands(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let watch = state.store.watch(Collection::Commands).await?;
    let initial = commands_event(&watch.current);
    let updates = stream::unfold(watch, |mut watch| async move {
        let docs = watch.changed().await?;
        Some((commands_event(&docs), watch))
    });
    let events = stream::once(std::future::ready(initial))
        .chain(updates)
        .map(Ok::<_, Infallible>);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn commands_event(docs: &[Document]) -> Event {
    let items: Vec<Command> = docs.iter().filter_map(decode_or_skip).collect();
    match Event::default().event("commands").json_data(&items) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode command stream event");
            Event::default().event("commands").data("[]")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/commands/{id}",
    params(("id" = Uuid, Path, description = "Command ID")),
    responses(
        (status = 200, description = "Command detail", body = ApiResponse<Command>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn get_command(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Command>>> {
    let resp = command_service::get(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/commands/{id}/status",
    params(("id" = Uuid, Path, description = "Command ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Command>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_command_status(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Command>>> {
    let resp = command_service::update_status(&state, session.id, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/commands/{id}",
    params(("id" = Uuid, Path, description = "Command ID")),
    responses(
        (status = 200, description = "Command deleted"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_command(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = command_service::delete(&state, session.id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reservations",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("date" = Option<String>, Query, description = "Filter by date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Reservations, soonest first", body = ApiResponse<ReservationList>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<ReservationListQuery>,
) -> AppResult<Json<ApiResponse<ReservationList>>> {
    let resp = reservation_service::list(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation detail", body = ApiResponse<Reservation>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp = reservation_service::get(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/reservations/{id}/status",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Reservation>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_reservation_status(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp =
        reservation_service::update_status(&state, session.id, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation deleted"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_reservation(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = reservation_service::delete(&state, session.id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/messages",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Contact messages, newest first", body = ApiResponse<MessageList>),
        (status = 401, description = "Login required"),
    ),
    tag = "Admin"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = contact_service::list(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message detail", body = ApiResponse<ContactMessage>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn get_message(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = contact_service::get(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message deleted"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_message(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = contact_service::delete(&state, session.id, id).await?;
    Ok(Json(resp))
}
