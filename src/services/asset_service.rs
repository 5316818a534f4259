use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::assets::{AssetList, CategoryList, CreateAssetRequest, CreateCategoryRequest, UpdateAssetRequest},
    entity::{
        asset_categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as AssetCategories,
        },
        assets::{ActiveModel as AssetActive, Column as AssetCol, Entity as Assets},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Asset, AssetCategory},
    response::{ApiResponse, Meta},
    routes::params::{AssetQuery, AssetSortBy, SortOrder},
    state::AppState,
};

pub async fn list_assets(
    state: &AppState,
    query: AssetQuery,
) -> AppResult<ApiResponse<AssetList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_ref().map(|q| q.trim()).filter(|q| !q.is_empty()) {
        let pattern = format!("%{q}%");
        condition = condition.add(
            Condition::any()
                .add(AssetCol::Name.like(pattern.as_str()))
                .add(AssetCol::AssetCode.like(pattern.as_str()))
                .add(AssetCol::Description.like(pattern.as_str())),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(AssetCol::CategoryId.eq(category_id));
    }

    let sort_by = query.sort_by.unwrap_or(AssetSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let column = match sort_by {
        AssetSortBy::CreatedAt => AssetCol::CreatedAt,
        AssetSortBy::Price => AssetCol::PurchasePrice,
        AssetSortBy::Name => AssetCol::Name,
    };

    let mut finder = Assets::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Asset::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", AssetList { items }, Some(meta)))
}

pub async fn get_asset(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Asset>> {
    let asset = Assets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;

    Ok(ApiResponse::success("OK", Asset::from(asset), None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = AssetCategories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AssetCategory::from)
        .collect();

    Ok(ApiResponse::success("OK", CategoryList { items }, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<AssetCategory>> {
    ensure_admin(user)?;
    let code = payload.code.trim().to_string();
    if payload.name.trim().is_empty() || code.is_empty() {
        return Err(AppError::BadRequest("name and code are required".into()));
    }

    let exist = AssetCategories::find()
        .filter(CategoryCol::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(format!("Category code {code} already exists")));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        code: Set(code),
        description: Set(payload.description),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_create",
        "asset_categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        AssetCategory::from(category),
        Some(Meta::empty()),
    ))
}

pub async fn create_asset(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAssetRequest,
) -> AppResult<ApiResponse<Asset>> {
    ensure_admin(user)?;
    validate_asset_numbers(
        Some(payload.quantity),
        Some(payload.purchase_price),
        payload.max_order_per_partner,
    )?;
    let asset_code = payload.asset_code.trim().to_string();
    if payload.name.trim().is_empty() || asset_code.is_empty() {
        return Err(AppError::BadRequest("name and asset_code are required".into()));
    }

    let exist = Assets::find()
        .filter(AssetCol::AssetCode.eq(asset_code.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(format!(
            "Asset code {asset_code} already exists"
        )));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let asset = AssetActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        category_id: Set(payload.category_id),
        description: Set(payload.description),
        asset_code: Set(asset_code),
        location: Set(payload.location),
        quantity: Set(payload.quantity),
        purchase_price: Set(payload.purchase_price),
        is_refundable_wallet_deposit: Set(payload.is_refundable_wallet_deposit),
        max_order_per_partner: Set(payload.max_order_per_partner.filter(|limit| *limit > 0)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "asset_create",
        "assets",
        serde_json::json!({ "asset_id": asset.id, "asset_code": asset.asset_code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Asset created",
        Asset::from(asset),
        Some(Meta::empty()),
    ))
}

pub async fn update_asset(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAssetRequest,
) -> AppResult<ApiResponse<Asset>> {
    ensure_admin(user)?;
    validate_asset_numbers(
        payload.quantity,
        payload.purchase_price,
        payload.max_order_per_partner,
    )?;

    let existing = Assets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Asset"))?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let mut active: AssetActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(location) = payload.location {
        active.location = Set(Some(location));
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(price) = payload.purchase_price {
        active.purchase_price = Set(price);
    }
    if let Some(flag) = payload.is_refundable_wallet_deposit {
        active.is_refundable_wallet_deposit = Set(flag);
    }
    if let Some(limit) = payload.max_order_per_partner {
        active.max_order_per_partner = Set(Some(limit).filter(|limit| *limit > 0));
    }

    let asset = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "asset_update",
        "assets",
        serde_json::json!({ "asset_id": asset.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Asset updated",
        Asset::from(asset),
        Some(Meta::empty()),
    ))
}

pub async fn delete_asset(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let ordered: Option<(i64,)> =
        sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE asset_id = $1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if ordered.is_some_and(|(count,)| count > 0) {
        return Err(AppError::BadRequest(
            "Asset has been ordered and cannot be deleted".into(),
        ));
    }

    let result = Assets::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Asset"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "asset_delete",
        "assets",
        serde_json::json!({ "asset_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Asset deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn ensure_category_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    AssetCategories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Asset category"))
}

fn validate_asset_numbers(
    quantity: Option<i32>,
    price: Option<i64>,
    max_order: Option<i32>,
) -> AppResult<()> {
    if quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("purchase_price must not be negative".into()));
    }
    if max_order.is_some_and(|m| m < 0) {
        return Err(AppError::BadRequest(
            "max_order_per_partner must not be negative".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_asset_numbers_are_rejected() {
        assert!(validate_asset_numbers(Some(-1), None, None).is_err());
        assert!(validate_asset_numbers(None, Some(-5), None).is_err());
        assert!(validate_asset_numbers(None, None, Some(-2)).is_err());
        assert!(validate_asset_numbers(Some(0), Some(0), Some(0)).is_ok());
    }
}
