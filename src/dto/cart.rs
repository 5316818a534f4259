use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Asset;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub asset_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItemDto>,
    /// Sum of line quantities.
    pub total_items: i64,
    pub distinct_items: i64,
    pub total_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub asset: Asset,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartMutation {
    pub asset_id: Uuid,
    pub quantity: i32,
    pub cart_count: i64,
}
