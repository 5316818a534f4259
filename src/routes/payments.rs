use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::orders::{PaymentConfirmation, PaymentResult},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/confirm", post(confirm_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/confirm",
    request_body = PaymentConfirmation,
    responses(
        (status = 200, description = "Signature checked; order is Paid or Failed", body = ApiResponse<PaymentResult>),
        (status = 400, description = "Order is not awaiting payment"),
        (status = 404, description = "Order not found")
    ),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(payload): Json<PaymentConfirmation>,
) -> AppResult<Json<ApiResponse<PaymentResult>>> {
    let resp = payment_service::confirm_payment(&state, payload).await?;
    Ok(Json(resp))
}
