use axum::{Json, extract::State};

use crate::{
    dto::commands::CheckoutRequest,
    error::AppResult,
    middleware::auth::ClientSession,
    models::Command,
    response::ApiResponse,
    services::command_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Command created from the session cart; cart is cleared", body = ApiResponse<Command>),
        (status = 400, description = "Empty cart, invalid customer form, or insufficient stock"),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<Command>>> {
    let resp = command_service::checkout(&state, &session, payload).await?;
    Ok(Json(resp))
}
