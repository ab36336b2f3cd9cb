use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::commands::{CheckoutRequest, CommandList, UpdateStatusRequest},
    error::{AppError, AppResult},
    models::{COMMAND_STATUSES, Command, Product, decode_document, decode_or_skip},
    response::{ApiResponse, Meta},
    routes::params::{CommandListQuery, SortOrder},
    services::validate,
    sessions::Session,
    state::AppState,
    store::Collection,
};

/// Turns the session cart into a command: validates the customer form,
/// checks stock, snapshots the lines and total, then clears the cart.
/// Stock is decremented best-effort after the command exists; a failed
/// decrement is logged and left for staff, not rolled back.
pub async fn checkout(
    state: &AppState,
    session: &Session,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Command>> {
    validate::require("name", &payload.name)?;
    validate::phone("phone", &payload.phone)?;
    validate::email("email", &payload.email)?;

    let lines = session.cart.items();
    if lines.is_empty() {
        return Err(AppError::Validation("cart is empty".to_string()));
    }

    // Stock check up front so the command is only created when every line
    // can be served. Concurrent checkouts can still race past this; the
    // decrement below clamps at zero.
    let mut products: Vec<(Product, u32)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let doc = state
            .store
            .get(Collection::Products, line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("product no longer exists: {}", line.name))
            })?;
        let product: Product = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
        if (product.stock as i64) < line.quantity as i64 {
            return Err(AppError::Validation(format!(
                "insufficient stock for {}",
                product.name
            )));
        }
        products.push((product, line.quantity));
    }

    let total = session.cart.total();
    let items: Vec<serde_json::Value> = lines
        .iter()
        .map(|line| {
            json!({
                "product_id": line.product_id,
                "name": line.name,
                "unit_price": line.unit_price,
                "quantity": line.quantity,
            })
        })
        .collect();
    let data = json!({
        "customer": {
            "name": payload.name.trim(),
            "phone": payload.phone.trim(),
            "email": payload.email.trim(),
            "address": payload.address,
            "notes": payload.notes,
        },
        "items": items,
        "total": total,
        "status": "pending",
    });
    let doc = state.store.create(Collection::Commands, data).await?;
    let command: Command = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    for (product, quantity) in products {
        let remaining = (product.stock as i64 - quantity as i64).max(0);
        let patch = json!({ "stock": remaining });
        if let Err(err) = state
            .store
            .update(Collection::Products, product.id, patch)
            .await
        {
            tracing::warn!(
                product = %product.id,
                error = %err,
                "stock decrement failed after checkout"
            );
        }
    }

    // Emits the zero summary to every cart subscriber.
    session.cart.clear();

    tracing::info!(command = %command.id, total, "checkout completed");
    Ok(ApiResponse::success("Command created", command, Some(Meta::empty())))
}

pub async fn list(state: &AppState, query: CommandListQuery) -> AppResult<ApiResponse<CommandList>> {
    let docs = state.store.list(Collection::Commands).await?;
    let mut items: Vec<Command> = docs.iter().filter_map(decode_or_skip).collect();

    if let Some(status) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        items.retain(|c| c.status == status);
    }
    // Newest first unless asked otherwise.
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if matches!(query.sort_order, Some(SortOrder::Asc)) {
        items.reverse();
    }

    let total = items.len() as i64;
    let (page, per_page, offset) = query.pagination.normalize();
    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Commands", CommandList { items }, Some(meta)))
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Command>> {
    let doc = state
        .store
        .get(Collection::Commands, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let command = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
    Ok(ApiResponse::success("Command", command, None))
}

pub async fn update_status(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<Command>> {
    if !COMMAND_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::field("status", "unknown status"));
    }
    let doc = state
        .store
        .update(Collection::Commands, id, json!({ "status": payload.status }))
        .await?;
    let command: Command = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    audit::record(
        session_id,
        "command_status",
        "commands",
        json!({ "id": id, "status": command.status }),
    );
    Ok(ApiResponse::success("Status updated", command, Some(Meta::empty())))
}

pub async fn delete(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state.store.delete(Collection::Commands, id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }
    audit::record(session_id, "command_delete", "commands", json!({ "id": id }));
    Ok(ApiResponse::success("Deleted", json!({}), Some(Meta::empty())))
}
