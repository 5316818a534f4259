use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::partners::{
        AssignCategoryRequest, LimitList, PartnerList, PartnerProfile, SetAssetLimitRequest,
        WalletView,
    },
    entity::{
        assets::Entity as Assets,
        partner_asset_limits::{
            ActiveModel as PartnerLimitActive, Column as PartnerLimitCol, Entity as PartnerAssetLimits,
        },
        partner_categories::{Column as PartnerCategoryCol, Entity as PartnerCategories},
        partner_category_asset_limits::{
            ActiveModel as CategoryLimitActive, Column as CategoryLimitCol,
            Entity as PartnerCategoryAssetLimits,
        },
        partners::{ActiveModel as PartnerActive, Column as PartnerCol, Entity as Partners},
        wallet_transactions::{Column as WalletCol, Entity as WalletTransactions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_partner},
    models::{AssetLimit, Partner, PartnerCategory, WalletTransaction},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::cart_service::find_partner,
    state::AppState,
};

pub async fn my_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PartnerProfile>> {
    ensure_partner(user)?;
    let partner = find_partner(state, user.user_id).await?;

    let category = match partner.category_id {
        Some(id) => PartnerCategories::find_by_id(id)
            .one(&state.orm)
            .await?
            .map(PartnerCategory::from),
        None => None,
    };

    Ok(ApiResponse::success(
        "OK",
        PartnerProfile {
            partner: Partner::from(partner),
            category,
        },
        Some(Meta::empty()),
    ))
}

pub async fn my_wallet(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<WalletView>> {
    ensure_partner(user)?;
    let partner = find_partner(state, user.user_id).await?;

    let transactions = WalletTransactions::find()
        .filter(WalletCol::PartnerId.eq(partner.id))
        .order_by_desc(WalletCol::TransactionDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WalletTransaction::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        WalletView {
            balance: partner.refundable_wallet,
            transactions,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_partners(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PartnerList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Partners::find().order_by_asc(PartnerCol::FirstName);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Partner::from)
        .collect();

    Ok(ApiResponse::success(
        "Partners",
        PartnerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_partner_categories(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<PartnerCategory>>> {
    ensure_admin(user)?;
    let items = PartnerCategories::find()
        .order_by_asc(PartnerCategoryCol::Code)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PartnerCategory::from)
        .collect();

    Ok(ApiResponse::success("Partner categories", items, None))
}

pub async fn assign_category(
    state: &AppState,
    user: &AuthUser,
    partner_id: Uuid,
    payload: AssignCategoryRequest,
) -> AppResult<ApiResponse<Partner>> {
    ensure_admin(user)?;
    let partner = Partners::find_by_id(partner_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Partner"))?;

    if let Some(category_id) = payload.category_id {
        PartnerCategories::find_by_id(category_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound("Partner category"))?;
    }

    let mut active: PartnerActive = partner.into();
    active.category_id = Set(payload.category_id);
    let partner = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "partner_category_assign",
        "partners",
        serde_json::json!({ "partner_id": partner.id, "category_id": partner.category_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Partner updated",
        Partner::from(partner),
        Some(Meta::empty()),
    ))
}

pub async fn list_partner_limits(
    state: &AppState,
    user: &AuthUser,
    partner_id: Uuid,
) -> AppResult<ApiResponse<LimitList>> {
    ensure_admin(user)?;
    let items = PartnerAssetLimits::find()
        .filter(PartnerLimitCol::PartnerId.eq(partner_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AssetLimit::from)
        .collect();

    Ok(ApiResponse::success("Limits", LimitList { items }, None))
}

/// Create or replace a partner-specific limit for one asset.
pub async fn set_partner_limit(
    state: &AppState,
    user: &AuthUser,
    partner_id: Uuid,
    payload: SetAssetLimitRequest,
) -> AppResult<ApiResponse<AssetLimit>> {
    ensure_admin(user)?;
    validate_limit(payload.max_purchase_limit)?;
    Partners::find_by_id(partner_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Partner"))?;
    ensure_asset_exists(state, payload.asset_id).await?;

    let existing = PartnerAssetLimits::find()
        .filter(
            Condition::all()
                .add(PartnerLimitCol::PartnerId.eq(partner_id))
                .add(PartnerLimitCol::AssetId.eq(payload.asset_id)),
        )
        .one(&state.orm)
        .await?;

    let limit = match existing {
        Some(limit) => {
            let mut active: PartnerLimitActive = limit.into();
            active.max_purchase_limit = Set(payload.max_purchase_limit);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            PartnerLimitActive {
                id: Set(Uuid::new_v4()),
                partner_id: Set(partner_id),
                asset_id: Set(payload.asset_id),
                max_purchase_limit: Set(payload.max_purchase_limit),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "partner_limit_set",
        "partner_asset_limits",
        serde_json::json!({
            "partner_id": partner_id,
            "asset_id": payload.asset_id,
            "max_purchase_limit": payload.max_purchase_limit,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Limit saved",
        AssetLimit::from(limit),
        Some(Meta::empty()),
    ))
}

pub async fn list_category_limits(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
) -> AppResult<ApiResponse<LimitList>> {
    ensure_admin(user)?;
    let items = PartnerCategoryAssetLimits::find()
        .filter(CategoryLimitCol::CategoryId.eq(category_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AssetLimit::from)
        .collect();

    Ok(ApiResponse::success("Limits", LimitList { items }, None))
}

/// Create or replace a partner-category limit for one asset.
pub async fn set_category_limit(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    payload: SetAssetLimitRequest,
) -> AppResult<ApiResponse<AssetLimit>> {
    ensure_admin(user)?;
    validate_limit(payload.max_purchase_limit)?;
    PartnerCategories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Partner category"))?;
    ensure_asset_exists(state, payload.asset_id).await?;

    let existing = PartnerCategoryAssetLimits::find()
        .filter(
            Condition::all()
                .add(CategoryLimitCol::CategoryId.eq(category_id))
                .add(CategoryLimitCol::AssetId.eq(payload.asset_id)),
        )
        .one(&state.orm)
        .await?;

    let limit = match existing {
        Some(limit) => {
            let mut active: CategoryLimitActive = limit.into();
            active.max_purchase_limit = Set(payload.max_purchase_limit);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            CategoryLimitActive {
                id: Set(Uuid::new_v4()),
                category_id: Set(category_id),
                asset_id: Set(payload.asset_id),
                max_purchase_limit: Set(payload.max_purchase_limit),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "category_limit_set",
        "partner_category_asset_limits",
        serde_json::json!({
            "category_id": category_id,
            "asset_id": payload.asset_id,
            "max_purchase_limit": payload.max_purchase_limit,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Limit saved",
        AssetLimit::from(limit),
        Some(Meta::empty()),
    ))
}

async fn ensure_asset_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    Assets::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Asset"))
}

fn validate_limit(limit: i32) -> AppResult<()> {
    if limit < 0 {
        return Err(AppError::BadRequest(
            "max_purchase_limit must not be negative".into(),
        ));
    }
    Ok(())
}
