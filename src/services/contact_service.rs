use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::contact::{ContactRequest, MessageList},
    error::{AppError, AppResult},
    models::{ContactMessage, decode_document, decode_or_skip},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::validate,
    state::AppState,
    store::Collection,
};

pub async fn create(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    validate::require("name", &payload.name)?;
    validate::email("email", &payload.email)?;
    validate::require("message", &payload.message)?;
    if let Some(phone) = payload.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validate::phone("phone", phone)?;
    }

    let data = json!({
        "name": payload.name.trim(),
        "email": payload.email.trim(),
        "phone": payload.phone,
        "subject": payload.subject,
        "message": payload.message.trim(),
    });
    let doc = state.store.create(Collection::ContactMessages, data).await?;
    let message: ContactMessage =
        decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    Ok(ApiResponse::success("Message sent", message, Some(Meta::empty())))
}

pub async fn list(state: &AppState, pagination: Pagination) -> AppResult<ApiResponse<MessageList>> {
    let docs = state.store.list(Collection::ContactMessages).await?;
    let mut items: Vec<ContactMessage> = docs.iter().filter_map(decode_or_skip).collect();
    // Newest first.
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = items.len() as i64;
    let (page, per_page, offset) = pagination.normalize();
    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Messages", MessageList { items }, Some(meta)))
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ContactMessage>> {
    let doc = state
        .store
        .get(Collection::ContactMessages, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let message = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
    Ok(ApiResponse::success("Message", message, None))
}

pub async fn delete(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state.store.delete(Collection::ContactMessages, id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }
    audit::record(
        session_id,
        "message_delete",
        "contactMessages",
        json!({ "id": id }),
    );
    Ok(ApiResponse::success("Deleted", json!({}), Some(Meta::empty())))
}
