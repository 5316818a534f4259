use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        fulfillment::{AddShipmentRequest, EditShipmentRequest, SerialInput, UpdateSerialsRequest},
        orders::{OrderDetail, OrderItemDetail, OrderList},
    },
    entity::{
        customer_asset_mappings::{Column as MappingCol, Entity as CustomerAssetMappings},
        order_item_serials::{ActiveModel as SerialActive, Column as SerialCol, Entity as OrderItemSerials},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        order_shipments::{ActiveModel as ShipmentActive, Column as ShipmentCol, Entity as OrderShipments},
        orders::{ActiveModel as OrderActive, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_store},
    models::{Order, OrderItem, OrderItemSerial, OrderShipment, OrderStatus, ShipmentStatus},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::{list_orders_where, load_order_detail},
    state::AppState,
};

pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_store(user)?;
    list_orders_where(state, Condition::all(), query).await
}

pub async fn get_store_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_store(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let detail = load_order_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", detail, Some(Meta::empty())))
}

/// Replace the serial numbers recorded against an order item.
pub async fn update_serials(
    state: &AppState,
    user: &AuthUser,
    order_item_id: Uuid,
    payload: UpdateSerialsRequest,
) -> AppResult<ApiResponse<OrderItemDetail>> {
    ensure_store(user)?;
    let serials = normalize_serials(payload.serials)?;

    let txn = state.orm.begin().await?;

    let item = OrderItems::find_by_id(order_item_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order item"))?;
    let order = Orders::find_by_id(item.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    ensure_fulfillable(&order.status, "serialize")?;

    if serials.len() > item.quantity as usize {
        return Err(AppError::BadRequest(format!(
            "Item quantity is {} but {} serial numbers were given",
            item.quantity,
            serials.len()
        )));
    }

    let numbers: Vec<String> = serials.iter().map(|s| s.serial_number.clone()).collect();
    let taken = OrderItemSerials::find()
        .filter(
            Condition::all()
                .add(SerialCol::SerialNumber.is_in(numbers.clone()))
                .add(SerialCol::OrderItemId.ne(item.id)),
        )
        .one(&txn)
        .await?;
    if let Some(taken) = taken {
        return Err(AppError::BadRequest(format!(
            "Serial number {} is already assigned to another item",
            taken.serial_number
        )));
    }

    let existing = OrderItemSerials::find()
        .filter(SerialCol::OrderItemId.eq(item.id))
        .all(&txn)
        .await?;
    let removed: Vec<Uuid> = existing
        .iter()
        .filter(|serial| !numbers.contains(&serial.serial_number))
        .map(|serial| serial.id)
        .collect();
    if !removed.is_empty() {
        let mapped = CustomerAssetMappings::find()
            .filter(MappingCol::SerialId.is_in(removed.clone()))
            .one(&txn)
            .await?;
        if mapped.is_some() {
            return Err(AppError::BadRequest(
                "A serial mapped to a customer cannot be removed".into(),
            ));
        }
        OrderItemSerials::delete_many()
            .filter(SerialCol::Id.is_in(removed))
            .exec(&txn)
            .await?;
    }

    let mut saved = Vec::with_capacity(serials.len());
    for input in serials {
        let current = existing
            .iter()
            .find(|serial| serial.serial_number == input.serial_number);
        let model = match current {
            Some(current) => {
                let mut active: SerialActive = current.clone().into();
                active.make = Set(input.make);
                active.model = Set(input.model);
                active.mac_id = Set(input.mac_id);
                active.update(&txn).await?
            }
            None => {
                SerialActive {
                    id: Set(Uuid::new_v4()),
                    order_item_id: Set(item.id),
                    serial_number: Set(input.serial_number),
                    make: Set(input.make),
                    model: Set(input.model),
                    mac_id: Set(input.mac_id),
                    created_at: NotSet,
                }
                .insert(&txn)
                .await?
            }
        };
        saved.push(OrderItemSerial::from(model));
    }

    // every unit of every line tagged
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let all_serials = OrderItemSerials::find()
        .filter(SerialCol::OrderItemId.is_in(item_ids))
        .all(&txn)
        .await?;
    let fully_serialized = items.iter().all(|i| {
        all_serials
            .iter()
            .filter(|s| s.order_item_id == i.id)
            .count()
            >= i.quantity as usize
    });

    let status = order.status.parse::<OrderStatus>().ok();
    if fully_serialized && status != Some(OrderStatus::Completed) {
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::SerialUpdated.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
    }

    let asset_name = crate::entity::Assets::find_by_id(item.asset_id)
        .one(&txn)
        .await?
        .map(|asset| asset.name)
        .unwrap_or_default();

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "serials_update",
        "order_item_serials",
        serde_json::json!({ "order_item_id": item.id, "count": saved.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Serial numbers updated for {asset_name}"),
        OrderItemDetail {
            item: OrderItem::from(item),
            asset_name,
            serials: saved,
        },
        Some(Meta::empty()),
    ))
}

pub async fn complete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_store(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let status = ensure_fulfillable(&order.status, "complete")?;
    if status == OrderStatus::Completed {
        return Err(AppError::BadRequest(format!(
            "Order {} is already completed",
            order.order_number
        )));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Completed.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_complete",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Order {} marked as completed", order.order_number),
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn add_shipment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddShipmentRequest,
) -> AppResult<ApiResponse<OrderShipment>> {
    ensure_store(user)?;
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    ensure_fulfillable(&order.status, "ship")?;

    let exist = OrderShipments::find()
        .filter(ShipmentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(
            "Shipment details already exist for this order.".into(),
        ));
    }

    let shipment = ShipmentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        courier_name: Set(Some(payload.courier_name)),
        tracking_id: Set(Some(payload.tracking_id)),
        remarks: Set(payload.remarks),
        shipping_status: Set(ShipmentStatus::InTransit.code()),
        signature_path: Set(None),
        dispatched_at: Set(Some(Utc::now().into())),
        delivered_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "shipment_add",
        "order_shipments",
        serde_json::json!({ "order_id": order.id, "shipment_id": shipment.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shipment details added",
        OrderShipment::from(shipment),
        Some(Meta::empty()),
    ))
}

pub async fn edit_shipment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: EditShipmentRequest,
) -> AppResult<ApiResponse<OrderShipment>> {
    ensure_store(user)?;
    let shipment = OrderShipments::find()
        .filter(ShipmentCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Shipment"))?;
    if let Some(requested) = payload.shipping_status {
        check_status_edit(ShipmentStatus::from_code(shipment.shipping_status), requested)?;
    }

    let mut active: ShipmentActive = shipment.into();
    if let Some(courier_name) = payload.courier_name {
        active.courier_name = Set(Some(courier_name));
    }
    if let Some(tracking_id) = payload.tracking_id {
        active.tracking_id = Set(Some(tracking_id));
    }
    if let Some(remarks) = payload.remarks {
        active.remarks = Set(Some(remarks));
    }
    if let Some(status) = payload.shipping_status {
        active.shipping_status = Set(status.code());
    }
    if let Some(dispatched_at) = payload.dispatched_at {
        active.dispatched_at = Set(Some(dispatched_at.into()));
    }
    if let Some(delivered_at) = payload.delivered_at {
        active.delivered_at = Set(Some(delivered_at.into()));
    }
    let shipment = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "shipment_edit",
        "order_shipments",
        serde_json::json!({ "order_id": order_id, "shipment_id": shipment.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shipment details updated",
        OrderShipment::from(shipment),
        Some(Meta::empty()),
    ))
}

/// Reject work on orders that are unpaid, failed or cancelled.
fn ensure_fulfillable(status: &str, action: &str) -> AppResult<OrderStatus> {
    let status = status.parse::<OrderStatus>().map_err(AppError::BadRequest)?;
    if !status.is_fulfillable() {
        return Err(AppError::BadRequest(format!(
            "Cannot {action} an order that is {status}"
        )));
    }
    Ok(status)
}

/// Delivery is recorded only by the partner's receipt, and is final.
fn check_status_edit(current: Option<ShipmentStatus>, requested: ShipmentStatus) -> AppResult<()> {
    if current == Some(ShipmentStatus::Delivered) && requested != ShipmentStatus::Delivered {
        return Err(AppError::BadRequest(
            "Shipment has already been delivered".into(),
        ));
    }
    if requested == ShipmentStatus::Delivered && current != Some(ShipmentStatus::Delivered) {
        return Err(AppError::BadRequest(
            "Delivery is confirmed by the partner marking the order received".into(),
        ));
    }
    Ok(())
}

/// Trim inputs, drop blank serials and reject duplicates within the request.
fn normalize_serials(inputs: Vec<SerialInput>) -> AppResult<Vec<SerialInput>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let serial_number = input.serial_number.trim().to_string();
        if serial_number.is_empty() {
            continue;
        }
        if !seen.insert(serial_number.clone()) {
            return Err(AppError::BadRequest(format!(
                "Serial number {serial_number} is repeated"
            )));
        }
        out.push(SerialInput {
            serial_number,
            make: non_blank(input.make),
            model: non_blank(input.model),
            mac_id: non_blank(input.mac_id),
        });
    }
    Ok(out)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(serial: &str, make: Option<&str>) -> SerialInput {
        SerialInput {
            serial_number: serial.into(),
            make: make.map(Into::into),
            model: None,
            mac_id: Some("  ".into()),
        }
    }

    #[test]
    fn serials_are_trimmed_and_blanks_dropped() {
        let out = normalize_serials(vec![
            input("  SN-1 ", Some(" Acme ")),
            input("   ", None),
            input("SN-2", Some("")),
        ])
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].serial_number, "SN-1");
        assert_eq!(out[0].make.as_deref(), Some("Acme"));
        assert_eq!(out[0].mac_id, None);
        assert_eq!(out[1].make, None);
    }

    #[test]
    fn repeated_serial_in_request_is_rejected() {
        let err = normalize_serials(vec![input("SN-1", None), input(" SN-1", None)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("SN-1")));
    }

    #[test]
    fn unpaid_orders_cannot_be_fulfilled() {
        for status in ["Pending", "Failed", "Cancelled"] {
            assert!(matches!(
                ensure_fulfillable(status, "ship"),
                Err(AppError::BadRequest(msg)) if msg == format!("Cannot ship an order that is {status}")
            ));
        }
        assert_eq!(ensure_fulfillable("Paid", "ship").unwrap(), OrderStatus::Paid);
        assert_eq!(
            ensure_fulfillable("Serial Updated", "serialize").unwrap(),
            OrderStatus::SerialUpdated
        );
    }

    #[test]
    fn store_cannot_mark_shipment_delivered() {
        assert!(check_status_edit(Some(ShipmentStatus::InTransit), ShipmentStatus::Delivered).is_err());
        assert!(check_status_edit(Some(ShipmentStatus::InTransit), ShipmentStatus::Returned).is_ok());
        assert!(check_status_edit(Some(ShipmentStatus::Pending), ShipmentStatus::InTransit).is_ok());
    }

    #[test]
    fn delivered_shipment_status_is_final() {
        assert!(check_status_edit(Some(ShipmentStatus::Delivered), ShipmentStatus::InTransit).is_err());
        assert!(check_status_edit(Some(ShipmentStatus::Delivered), ShipmentStatus::Delivered).is_ok());
    }
}
