use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::assets::{AssetList, CategoryList},
    error::AppResult,
    models::Asset,
    response::ApiResponse,
    routes::params::AssetQuery,
    services::asset_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets))
        .route("/{id}", get(get_asset))
}

pub fn category_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/assets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name, code or description"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by asset category"),
        ("sort_by" = Option<String>, Query, description = "created_at, price or name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "List assets", body = ApiResponse<AssetList>)
    ),
    tag = "Catalog"
)]
pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<AssetQuery>,
) -> AppResult<Json<ApiResponse<AssetList>>> {
    let resp = asset_service::list_assets(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Get asset", body = ApiResponse<Asset>),
        (status = 404, description = "Asset not found")
    ),
    tag = "Catalog"
)]
pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Asset>>> {
    let resp = asset_service::get_asset(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List asset categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = asset_service::list_categories(&state).await?;
    Ok(Json(resp))
}
