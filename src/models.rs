use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Superadmin,
    Partner,
    Store,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Superadmin => "superadmin",
            UserType::Partner => "partner",
            UserType::Store => "store",
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(UserType::Superadmin),
            "partner" => Ok(UserType::Partner),
            "store" => Ok(UserType::Store),
            other => Err(format!("unknown user type `{other}`")),
        }
    }
}

/// Lifecycle of an order. Stored as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Completed,
    #[serde(rename = "Serial Updated")]
    SerialUpdated,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
        OrderStatus::Completed,
        OrderStatus::SerialUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Failed => "Failed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Completed => "Completed",
            OrderStatus::SerialUpdated => "Serial Updated",
        }
    }

    /// Orders in these states do not count towards purchase limits.
    pub fn releases_quota(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Failed)
    }

    /// Paid-for orders the store may serialize, ship and hand over.
    pub fn is_fulfillable(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Pending | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    Returned,
}

impl ShipmentStatus {
    pub fn code(&self) -> i16 {
        match self {
            ShipmentStatus::Pending => 0,
            ShipmentStatus::InTransit => 1,
            ShipmentStatus::Delivered => 2,
            ShipmentStatus::Returned => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ShipmentStatus::Pending),
            1 => Some(ShipmentStatus::InTransit),
            2 => Some(ShipmentStatus::Delivered),
            3 => Some(ShipmentStatus::Returned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WalletTransactionType {
    Credit,
    Debit,
}

impl WalletTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionType::Credit => "Credit",
            WalletTransactionType::Debit => "Debit",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetCategory {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub asset_code: String,
    pub location: Option<String>,
    pub quantity: i32,
    pub purchase_price: i64,
    pub is_refundable_wallet_deposit: bool,
    pub max_order_per_partner: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub asset_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Partner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub code: Option<String>,
    pub refundable_wallet: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartnerCategory {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssetLimit {
    pub id: Uuid,
    /// Partner id or partner category id, depending on the limit kind.
    pub owner_id: Uuid,
    pub asset_id: Uuid,
    pub max_purchase_limit: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub amount: i64,
    pub status: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub dc_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub asset_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemSerial {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub serial_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub mac_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderShipment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_name: Option<String>,
    pub tracking_id: Option<String>,
    pub remarks: Option<String>,
    pub shipping_status: Option<ShipmentStatus>,
    pub signature_path: Option<String>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: i64,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerAssetMapping {
    pub id: Uuid,
    pub serial_id: Uuid,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub subscriber_id: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<entity::users::Model> for User {
    fn from(model: entity::users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            user_type: model.user_type,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::asset_categories::Model> for AssetCategory {
    fn from(model: entity::asset_categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            description: model.description,
        }
    }
}

impl From<entity::assets::Model> for Asset {
    fn from(model: entity::assets::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category_id: model.category_id,
            description: model.description,
            asset_code: model.asset_code,
            location: model.location,
            quantity: model.quantity,
            purchase_price: model.purchase_price,
            is_refundable_wallet_deposit: model.is_refundable_wallet_deposit,
            max_order_per_partner: model.max_order_per_partner,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::cart_items::Model> for CartItem {
    fn from(model: entity::cart_items::Model) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            asset_id: model.asset_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::partners::Model> for Partner {
    fn from(model: entity::partners::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            address: model.address,
            code: model.code,
            refundable_wallet: model.refundable_wallet,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::partner_categories::Model> for PartnerCategory {
    fn from(model: entity::partner_categories::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
        }
    }
}

impl From<entity::partner_asset_limits::Model> for AssetLimit {
    fn from(model: entity::partner_asset_limits::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.partner_id,
            asset_id: model.asset_id,
            max_purchase_limit: model.max_purchase_limit,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::partner_category_asset_limits::Model> for AssetLimit {
    fn from(model: entity::partner_category_asset_limits::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.category_id,
            asset_id: model.asset_id,
            max_purchase_limit: model.max_purchase_limit,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::orders::Model> for Order {
    fn from(model: entity::orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            order_number: model.order_number,
            amount: model.amount,
            status: model.status,
            gateway_order_id: model.gateway_order_id,
            gateway_payment_id: model.gateway_payment_id,
            dc_number: model.dc_number,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(model: entity::order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            asset_id: model.asset_id,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_item_serials::Model> for OrderItemSerial {
    fn from(model: entity::order_item_serials::Model) -> Self {
        Self {
            id: model.id,
            order_item_id: model.order_item_id,
            serial_number: model.serial_number,
            make: model.make,
            model: model.model,
            mac_id: model.mac_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_shipments::Model> for OrderShipment {
    fn from(model: entity::order_shipments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            courier_name: model.courier_name,
            tracking_id: model.tracking_id,
            remarks: model.remarks,
            shipping_status: ShipmentStatus::from_code(model.shipping_status),
            signature_path: model.signature_path,
            dispatched_at: model.dispatched_at.map(|dt| dt.with_timezone(&Utc)),
            delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<entity::wallet_transactions::Model> for WalletTransaction {
    fn from(model: entity::wallet_transactions::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            transaction_type: model.transaction_type,
            amount: model.amount,
            description: model.description,
            transaction_date: model.transaction_date.with_timezone(&Utc),
        }
    }
}

impl From<entity::customer_asset_mappings::Model> for CustomerAssetMapping {
    fn from(model: entity::customer_asset_mappings::Model) -> Self {
        Self {
            id: model.id,
            serial_id: model.serial_id,
            customer_name: model.customer_name,
            phone: model.phone,
            email: model.email,
            address: model.address,
            subscriber_id: model.subscriber_id,
            assigned_by: model.assigned_by,
            assigned_at: model.assigned_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::audit_logs::Model> for AuditLog {
    fn from(model: entity::audit_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource: model.resource,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_through_storage_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!("serial updated".parse::<OrderStatus>(), Ok(OrderStatus::SerialUpdated));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_cancelled_and_failed_release_quota() {
        let released: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::releases_quota)
            .collect();
        assert_eq!(released, vec![OrderStatus::Failed, OrderStatus::Cancelled]);
    }

    #[test]
    fn only_paid_orders_are_fulfillable() {
        let fulfillable: Vec<OrderStatus> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_fulfillable)
            .collect();
        assert_eq!(
            fulfillable,
            vec![
                OrderStatus::Paid,
                OrderStatus::Completed,
                OrderStatus::SerialUpdated
            ]
        );
    }

    #[test]
    fn shipment_status_codes_are_stable() {
        assert_eq!(ShipmentStatus::InTransit.code(), 1);
        assert_eq!(ShipmentStatus::from_code(2), Some(ShipmentStatus::Delivered));
        assert_eq!(ShipmentStatus::from_code(9), None);
    }
}
