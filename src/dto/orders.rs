use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderItemSerial, OrderShipment};

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub gateway_order_id: String,
    pub gateway_key_id: String,
    pub currency: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub verified: bool,
    pub order: Order,
    pub redirect_to: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReceivedRequest {
    /// Receipt signature as a `data:image/png;base64,...` URL.
    pub signature: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub asset_name: String,
    pub serials: Vec<OrderItemSerial>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub shipment: Option<OrderShipment>,
    pub total_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceivedResponse {
    pub order_id: Uuid,
    pub order_status: String,
    pub shipment: OrderShipment,
}
