use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartItemDto, CartMutation, CartView, UpdateCartRequest},
    entity::{
        assets::{Entity as Assets, Model as AssetModel},
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        partner_asset_limits::{Column as PartnerLimitCol, Entity as PartnerAssetLimits},
        partner_category_asset_limits::{
            Column as CategoryLimitCol, Entity as PartnerCategoryAssetLimits,
        },
        partners::{Column as PartnerCol, Entity as Partners, Model as PartnerModel},
    },
    error::{AppError, AppResult},
    limits::{LimitDecision, LimitSources, LimitUsage, check_purchase},
    middleware::auth::{AuthUser, ensure_partner},
    models::{Asset, OrderStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_partner(user)?;
    let cart = find_or_create_cart(state, user.user_id).await?;

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_desc(CartItemCol::CreatedAt)
        .find_also_related(Assets)
        .all(&state.orm)
        .await?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .filter_map(|(item, asset)| {
            let asset = asset?;
            let line_total = line_total(asset.purchase_price, item.quantity);
            Some(CartItemDto {
                id: item.id,
                asset: Asset::from(asset),
                quantity: item.quantity,
                line_total,
            })
        })
        .collect();

    let view = CartView {
        total_items: items.iter().map(|item| i64::from(item.quantity)).sum(),
        distinct_items: items.len() as i64,
        total_price: items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.line_total)),
        items,
    };

    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartMutation>> {
    ensure_partner(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let asset = find_asset(state, payload.asset_id).await?;
    let partner = find_partner(state, user.user_id).await?;
    let cart = find_or_create_cart(state, user.user_id).await?;

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart.id))
                .add(CartItemCol::AssetId.eq(asset.id)),
        )
        .one(&state.orm)
        .await?;
    let in_cart = existing.as_ref().map_or(0, |item| item.quantity);
    let quantity = grown_quantity(in_cart, payload.quantity)?;

    enforce_limit(
        state,
        &partner,
        &asset,
        i64::from(in_cart),
        i64::from(payload.quantity),
    )
    .await?;

    let item = match existing {
        Some(item) => {
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                asset_id: Set(asset.id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "asset_id": asset.id, "quantity": payload.quantity }),
    )
    .await;

    let cart_count = cart_count(&state.pool, cart.id).await?;
    Ok(ApiResponse::success(
        "Added to cart",
        CartMutation {
            asset_id: asset.id,
            quantity: item.quantity,
            cart_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    asset_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartMutation>> {
    ensure_partner(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let asset = find_asset(state, asset_id).await?;
    let partner = find_partner(state, user.user_id).await?;
    let cart = find_cart(state, user.user_id).await?;

    let item = CartItems::find()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart.id))
                .add(CartItemCol::AssetId.eq(asset.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    // the line being replaced does not count against the limit
    enforce_limit(state, &partner, &asset, 0, i64::from(payload.quantity)).await?;

    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "asset_id": asset.id, "quantity": item.quantity }),
    )
    .await;

    let cart_count = cart_count(&state.pool, cart.id).await?;
    Ok(ApiResponse::success(
        "Cart updated",
        CartMutation {
            asset_id: asset.id,
            quantity: item.quantity,
            cart_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    asset_id: Uuid,
) -> AppResult<ApiResponse<CartMutation>> {
    ensure_partner(user)?;
    let cart = find_cart(state, user.user_id).await?;

    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartItemCol::CartId.eq(cart.id))
                .add(CartItemCol::AssetId.eq(asset_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "asset_id": asset_id }),
    )
    .await;

    let cart_count = cart_count(&state.pool, cart.id).await?;
    Ok(ApiResponse::success(
        "Removed from cart",
        CartMutation {
            asset_id,
            quantity: 0,
            cart_count,
        },
        Some(Meta::empty()),
    ))
}

/// Quantity of a line after `added` more units.
fn grown_quantity(current: i32, added: i32) -> AppResult<i32> {
    current
        .checked_add(added)
        .ok_or_else(|| AppError::BadRequest("quantity too large".to_string()))
}

/// Price of a cart line for display; saturates instead of wrapping.
pub(crate) fn line_total(unit_price: i64, quantity: i32) -> i64 {
    unit_price.saturating_mul(i64::from(quantity))
}

async fn enforce_limit(
    state: &AppState,
    partner: &PartnerModel,
    asset: &AssetModel,
    other_qty: i64,
    requested: i64,
) -> AppResult<()> {
    let sources = limit_sources(&state.orm, partner, asset).await?;
    let usage = LimitUsage {
        lifetime_qty: lifetime_ordered_qty(&state.pool, partner.user_id, asset.id).await?,
        other_qty,
    };

    match check_purchase(&sources, state.config.limit_policy, usage, requested) {
        LimitDecision::Allowed => Ok(()),
        LimitDecision::Rejected { remaining } => {
            tracing::debug!(
                partner_id = %partner.id,
                asset_id = %asset.id,
                requested,
                remaining,
                "purchase limit rejected cart change"
            );
            Err(AppError::LimitExceeded { remaining })
        }
    }
}

/// Collect the configured limits for a partner and asset.
pub(crate) async fn limit_sources<C: ConnectionTrait>(
    conn: &C,
    partner: &PartnerModel,
    asset: &AssetModel,
) -> AppResult<LimitSources> {
    let partner_override = PartnerAssetLimits::find()
        .filter(
            Condition::all()
                .add(PartnerLimitCol::PartnerId.eq(partner.id))
                .add(PartnerLimitCol::AssetId.eq(asset.id)),
        )
        .one(conn)
        .await?
        .map(|limit| i64::from(limit.max_purchase_limit));

    let category_override = match partner.category_id {
        Some(category_id) => PartnerCategoryAssetLimits::find()
            .filter(
                Condition::all()
                    .add(CategoryLimitCol::CategoryId.eq(category_id))
                    .add(CategoryLimitCol::AssetId.eq(asset.id)),
            )
            .one(conn)
            .await?
            .map(|limit| i64::from(limit.max_purchase_limit)),
        None => None,
    };

    Ok(LimitSources {
        asset_default: asset.max_order_per_partner.map(i64::from),
        partner_override,
        category_override,
    })
}

/// Units of `asset_id` the user has ordered, ignoring cancelled and failed orders.
pub(crate) async fn lifetime_ordered_qty(
    pool: &DbPool,
    user_id: Uuid,
    asset_id: Uuid,
) -> AppResult<i64> {
    let released: Vec<&str> = OrderStatus::ALL
        .iter()
        .filter(|status| status.releases_quota())
        .map(|status| status.as_str())
        .collect();

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(oi.quantity), 0)::BIGINT
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.user_id = $1 AND oi.asset_id = $2 AND o.status <> ALL($3)
        "#,
    )
    .bind(user_id)
    .bind(asset_id)
    .bind(released)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

pub(crate) async fn find_partner(state: &AppState, user_id: Uuid) -> AppResult<PartnerModel> {
    Partners::find()
        .filter(PartnerCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Partner"))
}

async fn find_asset(state: &AppState, id: Uuid) -> AppResult<AssetModel> {
    Assets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Asset"))
}

async fn find_cart(state: &AppState, user_id: Uuid) -> AppResult<CartModel> {
    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart"))
}

async fn find_or_create_cart(state: &AppState, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
    {
        return Ok(cart);
    }

    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(cart)
}

/// Total units across all lines of the cart.
async fn cart_count(pool: &DbPool, cart_id: Uuid) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE cart_id = $1",
    )
    .bind(cart_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_a_line_adds_quantities() {
        assert_eq!(grown_quantity(2, 3).unwrap(), 5);
        assert_eq!(grown_quantity(0, 1).unwrap(), 1);
    }

    #[test]
    fn growing_past_i32_max_is_rejected() {
        assert!(matches!(
            grown_quantity(i32::MAX, 1),
            Err(AppError::BadRequest(msg)) if msg == "quantity too large"
        ));
    }

    #[test]
    fn line_total_saturates() {
        assert_eq!(line_total(1500, 3), 4500);
        assert_eq!(line_total(i64::MAX, 2), i64::MAX);
    }
}
