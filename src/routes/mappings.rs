use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::mappings::{AssignCustomerRequest, AssignedMapping, MappingSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::mapping_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(assign_customer))
        .route("/summary", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/customer-mappings/summary",
    responses(
        (status = 200, description = "Serial holdings and remaining quota per asset", body = ApiResponse<MappingSummary>),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer Mapping"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MappingSummary>>> {
    let resp = mapping_service::summary(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/customer-mappings",
    request_body = AssignCustomerRequest,
    responses(
        (status = 200, description = "Serial assigned to customer", body = ApiResponse<AssignedMapping>),
        (status = 400, description = "Missing fields or serial already mapped"),
        (status = 404, description = "Serial not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer Mapping"
)]
pub async fn assign_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AssignCustomerRequest>,
) -> AppResult<Json<ApiResponse<AssignedMapping>>> {
    let resp = mapping_service::assign_customer(&state, &user, payload).await?;
    Ok(Json(resp))
}
