use axum::{Json, extract::State};

use crate::{
    dto::contact::ContactRequest,
    error::AppResult,
    models::ContactMessage,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message recorded", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Invalid form"),
    ),
    tag = "Contact"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = contact_service::create(&state, payload).await?;
    Ok(Json(resp))
}
