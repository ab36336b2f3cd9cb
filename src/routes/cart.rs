//! Session cart routes. Every mutation persists to the session's slot
//! and notifies cart subscribers before the response is returned.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    cart::CartSummary,
    dto::cart::{AddToCartRequest, CartView, SetQuantityRequest},
    error::AppResult,
    middleware::auth::ClientSession,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(add_to_cart).delete(clear_cart))
        .route("/summary", get(cart_summary))
        .route("/{product_id}", put(set_quantity).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current session cart", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(ClientSession(session): ClientSession) -> Json<ApiResponse<CartView>> {
    Json(cart_service::view(&session))
}

#[utoipa::path(
    get,
    path = "/api/cart/summary",
    responses(
        (status = 200, description = "Item count and total", body = ApiResponse<CartSummary>)
    ),
    tag = "Cart"
)]
pub async fn cart_summary(
    ClientSession(session): ClientSession,
) -> Json<ApiResponse<CartSummary>> {
    Json(cart_service::summary(&session))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added, merged by id", body = ApiResponse<CartView>),
        (status = 400, description = "Unknown product or invalid quantity"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add(&state, &session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity set; zero or below removes the line", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn set_quantity(
    ClientSession(session): ClientSession,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> Json<ApiResponse<CartView>> {
    Json(cart_service::set_quantity(&session, product_id, payload))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line removed (no-op for an absent id)", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    ClientSession(session): ClientSession,
    Path(product_id): Path<Uuid>,
) -> Json<ApiResponse<CartView>> {
    Json(cart_service::remove(&session, product_id))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(ClientSession(session): ClientSession) -> Json<ApiResponse<CartView>> {
    Json(cart_service::clear(&session))
}
