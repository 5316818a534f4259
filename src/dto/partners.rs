use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{AssetLimit, Partner, PartnerCategory, WalletTransaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAssetLimitRequest {
    pub asset_id: Uuid,
    pub max_purchase_limit: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCategoryRequest {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartnerProfile {
    pub partner: Partner,
    pub category: Option<PartnerCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartnerList {
    pub items: Vec<Partner>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LimitList {
    pub items: Vec<AssetLimit>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletView {
    pub balance: i64,
    pub transactions: Vec<WalletTransaction>,
}
