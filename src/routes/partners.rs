use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::partners::{PartnerProfile, WalletView},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::partner_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(my_profile))
        .route("/me/wallet", get(my_wallet))
}

#[utoipa::path(
    get,
    path = "/api/partners/me",
    responses(
        (status = 200, description = "Partner profile and category", body = ApiResponse<PartnerProfile>),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Partners"
)]
pub async fn my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PartnerProfile>>> {
    let resp = partner_service::my_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/partners/me/wallet",
    responses(
        (status = 200, description = "Refundable wallet balance and history", body = ApiResponse<WalletView>),
        (status = 404, description = "Partner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Partners"
)]
pub async fn my_wallet(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WalletView>>> {
    let resp = partner_service::my_wallet(&state, &user).await?;
    Ok(Json(resp))
}
