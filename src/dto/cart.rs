use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::{CartLineItem, CartSummary};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    /// Zero or negative removes the line.
    pub quantity: i64,
}

/// Cart contents plus aggregates in one payload, what the cart page and
/// the navbar badge both render from.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    #[serde(flatten)]
    pub summary: CartSummary,
}
