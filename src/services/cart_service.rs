use uuid::Uuid;

use crate::{
    cart::CartSummary,
    dto::cart::{AddToCartRequest, CartView, SetQuantityRequest},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    sessions::Session,
    state::AppState,
    store::Collection,
};

pub fn view(session: &Session) -> ApiResponse<CartView> {
    ApiResponse::success("Cart", current_view(session), Some(Meta::empty()))
}

pub fn summary(session: &Session) -> ApiResponse<CartSummary> {
    ApiResponse::success("Cart summary", session.cart.summary(), Some(Meta::empty()))
}

/// Adds a catalog product to the session cart. The product snapshot
/// (name, image, category, normalized price) is copied into the line at
/// add-time.
pub async fn add(
    state: &AppState,
    session: &Session,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity == 0 {
        return Err(AppError::field("quantity", "must be at least 1"));
    }
    let doc = state
        .store
        .get(Collection::Products, payload.product_id)
        .await?
        .ok_or_else(|| AppError::field("product_id", "unknown product"))?;
    let product: Product =
        crate::models::decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
    if !product.available {
        return Err(AppError::field("product_id", "product is not available"));
    }

    session.cart.add(&product, payload.quantity);
    Ok(ApiResponse::success(
        "Added to cart",
        current_view(session),
        Some(Meta::empty()),
    ))
}

/// Sets a line's quantity; zero or below removes the line.
pub fn set_quantity(
    session: &Session,
    product_id: Uuid,
    payload: SetQuantityRequest,
) -> ApiResponse<CartView> {
    session.cart.set_quantity(product_id, payload.quantity);
    ApiResponse::success("Cart updated", current_view(session), Some(Meta::empty()))
}

pub fn remove(session: &Session, product_id: Uuid) -> ApiResponse<CartView> {
    session.cart.remove(product_id);
    ApiResponse::success(
        "Removed from cart",
        current_view(session),
        Some(Meta::empty()),
    )
}

pub fn clear(session: &Session) -> ApiResponse<CartView> {
    session.cart.clear();
    ApiResponse::success("Cart cleared", current_view(session), Some(Meta::empty()))
}

fn current_view(session: &Session) -> CartView {
    CartView {
        items: session.cart.items(),
        summary: session.cart.summary(),
    }
}
