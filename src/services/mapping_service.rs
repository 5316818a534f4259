use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::mappings::{
        AssetAvailability, AssignCustomerRequest, AssignedMapping, MappingSummary, SerialHolding,
    },
    entity::{
        assets::{Column as AssetCol, Entity as Assets},
        customer_asset_mappings::{
            ActiveModel as MappingActive, Column as MappingCol, Entity as CustomerAssetMappings,
        },
        partner_asset_limits::{Column as PartnerLimitCol, Entity as PartnerAssetLimits},
        partner_category_asset_limits::{
            Column as CategoryLimitCol, Entity as PartnerCategoryAssetLimits,
        },
    },
    error::{AppError, AppResult},
    limits::{LimitSources, LimitUsage},
    middleware::auth::{AuthUser, ensure_partner},
    models::{CustomerAssetMapping, OrderStatus},
    response::{ApiResponse, Meta},
    services::cart_service::find_partner,
    state::AppState,
};

#[derive(FromRow)]
struct SerialRow {
    serial_id: Uuid,
    serial_number: String,
    asset_id: Uuid,
    asset_name: String,
    order_number: String,
    order_status: String,
    mapped: bool,
}

pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MappingSummary>> {
    ensure_partner(user)?;
    let partner = find_partner(state, user.user_id).await?;

    let (total_orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let rows = serial_rows(state, user.user_id).await?;

    let released: Vec<&str> = OrderStatus::ALL
        .iter()
        .filter(|status| status.releases_quota())
        .map(|status| status.as_str())
        .collect();
    let ordered: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
        r#"
        SELECT oi.asset_id, COALESCE(SUM(oi.quantity), 0)::BIGINT
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.user_id = $1 AND o.status <> ALL($2)
        GROUP BY oi.asset_id
        "#,
    )
    .bind(user.user_id)
    .bind(released)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let partner_limits: HashMap<Uuid, i64> = PartnerAssetLimits::find()
        .filter(PartnerLimitCol::PartnerId.eq(partner.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|limit| (limit.asset_id, i64::from(limit.max_purchase_limit)))
        .collect();
    let category_limits: HashMap<Uuid, i64> = match partner.category_id {
        Some(category_id) => PartnerCategoryAssetLimits::find()
            .filter(CategoryLimitCol::CategoryId.eq(category_id))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|limit| (limit.asset_id, i64::from(limit.max_purchase_limit)))
            .collect(),
        None => HashMap::new(),
    };

    let assets = Assets::find()
        .order_by_asc(AssetCol::Name)
        .all(&state.orm)
        .await?;

    let available_assets = assets
        .into_iter()
        .map(|asset| {
            let sources = LimitSources {
                asset_default: asset.max_order_per_partner.map(i64::from),
                partner_override: partner_limits.get(&asset.id).copied(),
                category_override: category_limits.get(&asset.id).copied(),
            };
            let ordered_qty = ordered.get(&asset.id).copied().unwrap_or(0);
            let max_allowed = sources.effective_limit(state.config.limit_policy);
            let usage = LimitUsage {
                lifetime_qty: ordered_qty,
                other_qty: 0,
            };
            let (mapped, serials_received) = rows
                .iter()
                .filter(|row| row.asset_id == asset.id)
                .fold((0, 0), |(mapped, total), row| {
                    (mapped + i64::from(row.mapped), total + 1)
                });
            AssetAvailability {
                asset_id: asset.id,
                name: asset.name,
                asset_code: asset.asset_code,
                max_allowed,
                ordered_qty,
                remaining_qty: max_allowed.map(|limit| usage.remaining(limit)),
                mapped,
                serials_received,
            }
        })
        .collect();

    let total_assets = rows.len() as i64;
    let total_mapped = rows.iter().filter(|row| row.mapped).count() as i64;
    let serials = rows
        .into_iter()
        .map(|row| SerialHolding {
            serial_id: row.serial_id,
            serial_number: row.serial_number,
            asset_name: row.asset_name,
            order_number: row.order_number,
            mapped: row.mapped,
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        MappingSummary {
            total_orders,
            total_assets,
            total_mapped,
            total_unmapped: (total_assets - total_mapped).max(0),
            serials,
            available_assets,
        },
        Some(Meta::empty()),
    ))
}

/// Hand a received unit over to an end customer.
pub async fn assign_customer(
    state: &AppState,
    user: &AuthUser,
    payload: AssignCustomerRequest,
) -> AppResult<ApiResponse<AssignedMapping>> {
    ensure_partner(user)?;
    let name = payload.name.trim().to_string();
    let phone = payload.phone.trim().to_string();
    if name.is_empty() || phone.is_empty() {
        return Err(AppError::BadRequest("Missing required fields.".into()));
    }

    let serial = serial_rows(state, user.user_id)
        .await?
        .into_iter()
        .find(|row| row.serial_id == payload.serial_id)
        .ok_or(AppError::NotFound("Serial"))?;

    let exist = CustomerAssetMappings::find()
        .filter(MappingCol::SerialId.eq(serial.serial_id))
        .one(&state.orm)
        .await?;
    if serial.mapped || exist.is_some() {
        return Err(AppError::BadRequest("This serial is already mapped.".into()));
    }

    let mapping = MappingActive {
        id: Set(Uuid::new_v4()),
        serial_id: Set(serial.serial_id),
        customer_name: Set(name),
        phone: Set(phone),
        email: Set(payload.email.filter(|e| !e.trim().is_empty())),
        address: Set(payload.address.filter(|a| !a.trim().is_empty())),
        subscriber_id: Set(payload.subscriber_id.filter(|s| !s.trim().is_empty())),
        assigned_by: Set(Some(user.user_id)),
        assigned_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "customer_assign",
        "customer_asset_mappings",
        serde_json::json!({ "mapping_id": mapping.id, "serial_id": serial.serial_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Mapping successful.",
        AssignedMapping {
            mapping: CustomerAssetMapping::from(mapping),
            serial_number: serial.serial_number,
            order_number: serial.order_number,
            order_status: serial.order_status,
            asset_name: serial.asset_name,
        },
        Some(Meta::empty()),
    ))
}

/// Serials on the user's orders, most recently mapped first.
async fn serial_rows(state: &AppState, user_id: Uuid) -> AppResult<Vec<SerialRow>> {
    let rows = sqlx::query_as::<_, SerialRow>(
        r#"
        SELECT s.id AS serial_id, s.serial_number,
               a.id AS asset_id, a.name AS asset_name,
               o.order_number, o.status AS order_status,
               (m.id IS NOT NULL) AS mapped
        FROM order_item_serials s
        JOIN order_items oi ON oi.id = s.order_item_id
        JOIN orders o ON o.id = oi.order_id
        JOIN assets a ON a.id = oi.asset_id
        LEFT JOIN customer_asset_mappings m ON m.serial_id = s.id
        WHERE o.user_id = $1
        ORDER BY m.assigned_at DESC NULLS LAST, s.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(rows)
}
