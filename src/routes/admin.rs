use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        assets::{CreateAssetRequest, CreateCategoryRequest, UpdateAssetRequest},
        orders::UpdateOrderStatusRequest,
        partners::{AssignCategoryRequest, LimitList, PartnerList, SetAssetLimitRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Asset, AssetCategory, AssetLimit, AuditLog, Order, Partner, PartnerCategory},
    response::ApiResponse,
    routes::{
        auth::register_user,
        params::{AuditLogQuery, Pagination},
    },
    services::{admin_service, asset_service, partner_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/assets", post(create_asset))
        .route("/assets/{id}", put(update_asset).delete(delete_asset))
        .route("/categories", post(create_category))
        .route("/partners", get(list_partners))
        .route("/partners/{id}/category", put(assign_category))
        .route(
            "/partners/{id}/limits",
            get(list_partner_limits).put(set_partner_limit),
        )
        .route("/partner-categories", get(list_partner_categories))
        .route(
            "/partner-categories/{id}/limits",
            get(list_category_limits).put(set_category_limit),
        )
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/audit-logs", get(list_audit_logs))
}

#[utoipa::path(
    post,
    path = "/api/admin/assets",
    request_body = CreateAssetRequest,
    responses(
        (status = 201, description = "Asset created", body = ApiResponse<Asset>),
        (status = 400, description = "Invalid payload or duplicate code"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAssetRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Asset>>)> {
    let resp = asset_service::create_asset(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Asset updated", body = ApiResponse<Asset>),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssetRequest>,
) -> AppResult<Json<ApiResponse<Asset>>> {
    let resp = asset_service::update_asset(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/assets/{id}",
    params(("id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 400, description = "Asset has orders"),
        (status = 404, description = "Asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = asset_service::delete_asset(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Asset category created", body = ApiResponse<AssetCategory>),
        (status = 400, description = "Duplicate code")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AssetCategory>>)> {
    let resp = asset_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/partners",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List partners", body = ApiResponse<PartnerList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_partners(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PartnerList>>> {
    let resp = partner_service::list_partners(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/partners/{id}/category",
    params(("id" = Uuid, Path, description = "Partner ID")),
    request_body = AssignCategoryRequest,
    responses(
        (status = 200, description = "Partner category assigned", body = ApiResponse<Partner>),
        (status = 404, description = "Partner or category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn assign_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignCategoryRequest>,
) -> AppResult<Json<ApiResponse<Partner>>> {
    let resp = partner_service::assign_category(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/partners/{id}/limits",
    params(("id" = Uuid, Path, description = "Partner ID")),
    responses(
        (status = 200, description = "Partner-specific asset limits", body = ApiResponse<LimitList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_partner_limits(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LimitList>>> {
    let resp = partner_service::list_partner_limits(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/partners/{id}/limits",
    params(("id" = Uuid, Path, description = "Partner ID")),
    request_body = SetAssetLimitRequest,
    responses(
        (status = 200, description = "Limit saved", body = ApiResponse<AssetLimit>),
        (status = 404, description = "Partner or asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_partner_limit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAssetLimitRequest>,
) -> AppResult<Json<ApiResponse<AssetLimit>>> {
    let resp = partner_service::set_partner_limit(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/partner-categories",
    responses(
        (status = 200, description = "Partner categories", body = ApiResponse<Vec<PartnerCategory>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_partner_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<PartnerCategory>>>> {
    let resp = partner_service::list_partner_categories(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/partner-categories/{id}/limits",
    params(("id" = Uuid, Path, description = "Partner category ID")),
    responses(
        (status = 200, description = "Category asset limits", body = ApiResponse<LimitList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_category_limits(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LimitList>>> {
    let resp = partner_service::list_category_limits(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/partner-categories/{id}/limits",
    params(("id" = Uuid, Path, description = "Partner category ID")),
    request_body = SetAssetLimitRequest,
    responses(
        (status = 200, description = "Limit saved", body = ApiResponse<AssetLimit>),
        (status = 404, description = "Category or asset not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_category_limit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAssetLimitRequest>,
) -> AppResult<Json<ApiResponse<AssetLimit>>> {
    let resp = partner_service::set_category_limit(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by acting user"),
        ("action" = Option<String>, Query, description = "Filter by action")
    ),
    responses(
        (status = 200, description = "Audit trail, newest first", body = ApiResponse<Vec<AuditLog>>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<ApiResponse<Vec<AuditLog>>>> {
    let resp = admin_service::list_audit_logs(&state, &user, query).await?;
    Ok(Json(resp))
}
