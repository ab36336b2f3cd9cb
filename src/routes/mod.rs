use axum::{Router, routing::post};

use crate::state::AppState;

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod reservations;
pub mod site;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/site", axum::routing::get(site::site_info))
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .route("/checkout", post(checkout::checkout))
        .nest("/reservations", reservations::router())
        .route("/contact", post(contact::send_message))
        .nest("/admin", admin::router())
}
