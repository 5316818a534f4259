use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CustomerAssetMapping;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCustomerRequest {
    pub serial_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Subscriber id in the partner's billing system.
    pub subscriber_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignedMapping {
    pub mapping: CustomerAssetMapping,
    pub serial_number: String,
    pub order_number: String,
    pub order_status: String,
    pub asset_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetAvailability {
    pub asset_id: Uuid,
    pub name: String,
    pub asset_code: String,
    /// `None` when no limit applies.
    pub max_allowed: Option<i64>,
    pub ordered_qty: i64,
    pub remaining_qty: Option<i64>,
    pub mapped: i64,
    pub serials_received: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SerialHolding {
    pub serial_id: Uuid,
    pub serial_number: String,
    pub asset_name: String,
    pub order_number: String,
    pub mapped: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MappingSummary {
    pub total_orders: i64,
    pub total_assets: i64,
    pub total_mapped: i64,
    pub total_unmapped: i64,
    pub serials: Vec<SerialHolding>,
    pub available_assets: Vec<AssetAvailability>,
}
