use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::ShipmentStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SerialInput {
    pub serial_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub mac_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSerialsRequest {
    pub serials: Vec<SerialInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddShipmentRequest {
    pub courier_name: String,
    pub tracking_id: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditShipmentRequest {
    pub courier_name: Option<String>,
    pub tracking_id: Option<String>,
    pub remarks: Option<String>,
    pub shipping_status: Option<ShipmentStatus>,
    pub dispatched_at: Option<chrono::DateTime<chrono::Utc>>,
    pub delivered_at: Option<chrono::DateTime<chrono::Utc>>,
}
