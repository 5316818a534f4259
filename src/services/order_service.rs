use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CheckoutResponse, MarkReceivedRequest, OrderDetail, OrderItemDetail, OrderList,
        ReceivedResponse,
    },
    entity::{
        assets::{Entity as Assets, Model as AssetModel},
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_item_serials::{Column as SerialCol, Entity as OrderItemSerials},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_shipments::{
            ActiveModel as ShipmentActive, Column as ShipmentCol, Entity as OrderShipments,
            Model as ShipmentModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        partners::Model as PartnerModel,
    },
    error::{AppError, AppResult},
    limits::{LimitDecision, LimitUsage, check_purchase},
    middleware::auth::{AuthUser, ensure_partner},
    models::{Order, OrderItem, OrderItemSerial, OrderShipment, OrderStatus, ShipmentStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::{find_partner, lifetime_ordered_qty, limit_sources},
    state::AppState,
};

// Serializes delivery challan allocation across concurrent checkouts.
const DC_NUMBER_LOCK: i64 = 0x4443_4e4f;

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders_where(state, condition, query).await
}

/// Shared by the partner and store order listings.
pub(crate) async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse().map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let detail = load_order_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Order with line items, serials and shipment.
pub(crate) async fn load_order_detail<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderDetail> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .find_also_related(Assets)
        .all(conn)
        .await?;

    let item_ids: Vec<Uuid> = rows.iter().map(|(item, _)| item.id).collect();
    let mut serials = OrderItemSerials::find()
        .filter(SerialCol::OrderItemId.is_in(item_ids))
        .order_by_asc(SerialCol::CreatedAt)
        .all(conn)
        .await?;

    let shipment = OrderShipments::find()
        .filter(ShipmentCol::OrderId.eq(order.id))
        .one(conn)
        .await?
        .map(OrderShipment::from);

    let mut total_amount = 0;
    let mut items = Vec::with_capacity(rows.len());
    for (item, asset) in rows {
        total_amount += item.price * i64::from(item.quantity);
        let (own, rest): (Vec<_>, Vec<_>) = serials
            .into_iter()
            .partition(|serial| serial.order_item_id == item.id);
        serials = rest;
        items.push(OrderItemDetail {
            asset_name: asset.map(|a| a.name).unwrap_or_default(),
            serials: own.into_iter().map(OrderItemSerial::from).collect(),
            item: OrderItem::from(item),
        });
    }

    Ok(OrderDetail {
        order: Order::from(order),
        items,
        shipment,
        total_amount,
    })
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    ensure_partner(user)?;
    let partner = find_partner(state, user.user_id).await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let (lines, total_amount) = price_cart(state, &state.orm, &partner, cart.id).await?;

    // gateway round trip happens before any row is locked
    let order_id = Uuid::new_v4();
    let order_number = build_order_number(order_id);
    let gateway_order = state
        .gateway
        .create_order(total_amount, &order_number)
        .await?;

    let txn = state.orm.begin().await?;
    Carts::find_by_id(cart.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;

    // limits may have tightened and the cart may have moved since pricing
    let (locked_lines, locked_total) = price_cart(state, &txn, &partner, cart.id).await?;
    if line_keys(&locked_lines) != line_keys(&lines) || locked_total != total_amount {
        return Err(AppError::BadRequest(
            "Cart changed during checkout, please try again".into(),
        ));
    }

    let dc_number = allocate_dc_number(&txn).await?;

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        order_number: Set(order_number),
        amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        gateway_order_id: Set(Some(gateway_order.id.clone())),
        gateway_payment_id: Set(None),
        gateway_signature: Set(None),
        dc_number: Set(Some(dc_number)),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(locked_lines.len());
    for (asset, quantity) in &locked_lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            asset_id: Set(asset.id),
            quantity: Set(*quantity),
            price: Set(asset.purchase_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));
    }

    // clear cart
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        amount = order.amount,
        "order created"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "gateway_order_id": gateway_order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutResponse {
            order: Order::from(order),
            items: order_items,
            gateway_order_id: gateway_order.id,
            gateway_key_id: state.gateway.key_id().to_string(),
            currency: gateway_order.currency,
        },
        Some(Meta::empty()),
    ))
}

/// Load the cart lines, re-check each against the partner's limits and total them.
async fn price_cart<C: ConnectionTrait>(
    state: &AppState,
    conn: &C,
    partner: &PartnerModel,
    cart_id: Uuid,
) -> AppResult<(Vec<(AssetModel, i32)>, i64)> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .find_also_related(Assets)
        .all(conn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut lines = Vec::with_capacity(rows.len());
    for (item, asset) in rows {
        let asset = asset.ok_or(AppError::NotFound("Asset"))?;
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }

        let sources = limit_sources(conn, partner, &asset).await?;
        let usage = LimitUsage {
            lifetime_qty: lifetime_ordered_qty(&state.pool, partner.user_id, asset.id).await?,
            other_qty: 0,
        };
        let decision = check_purchase(
            &sources,
            state.config.limit_policy,
            usage,
            i64::from(item.quantity),
        );
        if let LimitDecision::Rejected { remaining } = decision {
            return Err(AppError::LimitExceeded { remaining });
        }

        lines.push((asset, item.quantity));
    }

    let total = order_total(lines.iter().map(|(asset, qty)| (asset.purchase_price, *qty)))?;
    Ok((lines, total))
}

/// Sum of `price * quantity`, rejecting totals that do not fit in `i64`.
fn order_total(lines: impl IntoIterator<Item = (i64, i32)>) -> AppResult<i64> {
    lines
        .into_iter()
        .try_fold(0i64, |total, (price, quantity)| {
            price
                .checked_mul(i64::from(quantity))
                .and_then(|line| total.checked_add(line))
        })
        .ok_or_else(|| AppError::BadRequest("Order total too large".into()))
}

fn line_keys(lines: &[(AssetModel, i32)]) -> Vec<(Uuid, i32)> {
    let mut keys: Vec<(Uuid, i32)> = lines.iter().map(|(asset, qty)| (asset.id, *qty)).collect();
    keys.sort();
    keys
}

/// Partner confirms receipt of a shipped order.
pub async fn mark_received(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkReceivedRequest,
) -> AppResult<ApiResponse<ReceivedResponse>> {
    let signature = payload
        .signature
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(decode_data_url)
        .transpose()?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let status = order.status.parse::<OrderStatus>().map_err(AppError::BadRequest)?;
    if !status.is_fulfillable() {
        return Err(AppError::BadRequest(format!(
            "Cannot receive an order that is {status}"
        )));
    }

    let shipment = OrderShipments::find()
        .filter(ShipmentCol::OrderId.eq(order.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("No shipment found for this order.".into()))?;

    if ShipmentStatus::from_code(shipment.shipping_status) == Some(ShipmentStatus::Delivered) {
        return Err(AppError::BadRequest("Order has already been received".into()));
    }

    let stored = match signature {
        Some((ext, bytes)) => Some(
            store_signature(&state.config.media_root, &order.order_number, &ext, &bytes).await?,
        ),
        None => None,
    };

    let relative = stored.as_ref().map(|s| s.relative.clone());
    let (order, shipment) = match finish_delivery(txn, order, shipment, relative).await {
        Ok(done) => done,
        Err(err) => {
            if let Some(stored) = &stored {
                discard_signature(stored).await;
            }
            return Err(err);
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "order_received",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Order #{} marked as received", order.order_number),
        ReceivedResponse {
            order_id: order.id,
            order_status: order.status,
            shipment: OrderShipment::from(shipment),
        },
        Some(Meta::empty()),
    ))
}

/// Mark the shipment delivered and the order completed, then commit.
async fn finish_delivery(
    txn: DatabaseTransaction,
    order: OrderModel,
    shipment: ShipmentModel,
    signature_path: Option<String>,
) -> AppResult<(OrderModel, ShipmentModel)> {
    let now = Utc::now();
    let mut active: ShipmentActive = shipment.into();
    active.shipping_status = Set(ShipmentStatus::Delivered.code());
    active.delivered_at = Set(Some(now.into()));
    if signature_path.is_some() {
        active.signature_path = Set(signature_path);
    }
    let shipment = active.update(&txn).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Completed.as_str().to_string());
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    Ok((order, shipment))
}

/// A receipt signature written under the media root.
struct StoredSignature {
    /// Path relative to the media root, as persisted on the shipment.
    relative: String,
    path: PathBuf,
}

async fn store_signature(
    media_root: &Path,
    order_number: &str,
    ext: &str,
    bytes: &[u8],
) -> AppResult<StoredSignature> {
    let relative = format!("signature/signature_{order_number}.{ext}");
    let path = media_root.join(&relative);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    }
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tracing::debug!(path = %path.display(), "receipt signature stored");
    Ok(StoredSignature { relative, path })
}

async fn discard_signature(stored: &StoredSignature) {
    if let Err(err) = tokio::fs::remove_file(&stored.path).await {
        tracing::warn!(path = %stored.path.display(), error = %err, "orphaned receipt signature");
    }
}

/// Split a `data:image/<ext>;base64,...` URL into extension and bytes.
fn decode_data_url(data_url: &str) -> AppResult<(String, Vec<u8>)> {
    let invalid = || AppError::BadRequest("signature must be a base64 data URL".into());
    let (header, payload) = data_url.split_once(";base64,").ok_or_else(invalid)?;
    let ext = header
        .rsplit('/')
        .next()
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(invalid)?
        .to_ascii_lowercase();
    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    Ok((ext, bytes))
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string().to_ascii_uppercase();
    format!("ORD-{}-{}", date, &suffix[..8])
}

/// Next delivery challan number. Holds a transaction-scoped advisory lock,
/// so `conn` must be a transaction.
pub(crate) async fn allocate_dc_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        format!("SELECT pg_advisory_xact_lock({DC_NUMBER_LOCK})"),
    ))
    .await?;

    let last = conn
        .query_one(Statement::from_string(
            backend,
            r#"
            SELECT dc_number FROM orders
            WHERE dc_number ~ '^DC[0-9]+$'
            ORDER BY LENGTH(dc_number) DESC, dc_number DESC
            LIMIT 1
            "#,
        ))
        .await?
        .map(|row| row.try_get::<String>("", "dc_number"))
        .transpose()?;

    next_dc_number(last.as_deref()).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "delivery challan sequence exhausted after {}",
            last.unwrap_or_default()
        ))
    })
}

/// Delivery challan number following `last`: `DC0001`, `DC0002`, ...
///
/// `None` when `last` is a `DC` number too large to continue.
fn next_dc_number(last: Option<&str>) -> Option<String> {
    let last = match last.and_then(|dc| dc.strip_prefix("DC")) {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse::<u64>().ok()?
        }
        _ => 0,
    };
    Some(format!("DC{:04}", last.checked_add(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_numbers_increase_from_last() {
        assert_eq!(next_dc_number(None).as_deref(), Some("DC0001"));
        assert_eq!(next_dc_number(Some("DC0001")).as_deref(), Some("DC0002"));
        assert_eq!(next_dc_number(Some("DC0099")).as_deref(), Some("DC0100"));
        assert_eq!(next_dc_number(Some("DC9999")).as_deref(), Some("DC10000"));
    }

    #[test]
    fn dc_numbers_continue_past_u32() {
        assert_eq!(
            next_dc_number(Some("DC4294967295")).as_deref(),
            Some("DC4294967296")
        );
    }

    #[test]
    fn exhausted_dc_sequence_never_restarts() {
        let max = format!("DC{}", u64::MAX);
        assert_eq!(next_dc_number(Some(&max)), None);
        assert_eq!(next_dc_number(Some("DC99999999999999999999999")), None);
    }

    #[test]
    fn non_dc_value_starts_sequence() {
        assert_eq!(next_dc_number(Some("CHALLAN-7")).as_deref(), Some("DC0001"));
    }

    #[test]
    fn order_total_sums_lines_and_rejects_overflow() {
        assert_eq!(order_total([(1500, 3), (5000, 1)]).unwrap(), 9500);
        assert!(matches!(
            order_total([(i64::MAX, 2)]),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            order_total([(i64::MAX, 1), (1, 1)]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn discarded_signature_leaves_no_file() {
        let root = std::env::temp_dir().join(format!("receipts-{}", Uuid::new_v4()));
        let stored = store_signature(&root, "ORD-1", "png", b"hello").await.unwrap();
        assert_eq!(stored.relative, "signature/signature_ORD-1.png");
        assert!(stored.path.exists());

        discard_signature(&stored).await;
        assert!(!stored.path.exists());
    }

    #[test]
    fn order_numbers_carry_date_and_id_prefix() {
        let id = Uuid::new_v4();
        let number = build_order_number(id);
        assert!(number.starts_with("ORD-"));
        let prefix = id.simple().to_string().to_ascii_uppercase();
        assert!(number.ends_with(&prefix[..8]));
    }

    #[test]
    fn data_url_signature_decodes() {
        let (ext, bytes) = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn data_url_without_base64_marker_is_rejected() {
        assert!(matches!(
            decode_data_url("data:image/png,plain"),
            Err(AppError::BadRequest(_))
        ));
        assert!(decode_data_url("data:image/p.ng;base64,aGVsbG8=").is_err());
    }
}
