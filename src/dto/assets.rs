use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Asset, AssetCategory};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAssetRequest {
    pub name: String,
    pub asset_code: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub quantity: i32,
    pub purchase_price: i64,
    #[serde(default)]
    pub is_refundable_wallet_deposit: bool,
    pub max_order_per_partner: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<i32>,
    pub purchase_price: Option<i64>,
    pub is_refundable_wallet_deposit: Option<bool>,
    /// Zero clears the limit.
    pub max_order_per_partner: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct AssetList {
    #[schema(value_type = Vec<Asset>)]
    pub items: Vec<Asset>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<AssetCategory>)]
    pub items: Vec<AssetCategory>,
}
