use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        fulfillment::{AddShipmentRequest, EditShipmentRequest, UpdateSerialsRequest},
        orders::{OrderDetail, OrderItemDetail, OrderList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderShipment},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::fulfillment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_store_orders))
        .route("/orders/{id}", get(get_store_order))
        .route("/orders/{id}/complete", post(complete_order))
        .route("/orders/{id}/shipment", post(add_shipment).put(edit_shipment))
        .route("/order-items/{id}/serials", put(update_serials))
}

#[utoipa::path(
    get,
    path = "/api/store/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "All orders (store staff)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn list_store_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = fulfillment_service::list_store_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/store/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Any order with items (store staff)", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn get_store_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = fulfillment_service::get_store_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/store/order-items/{id}/serials",
    params(("id" = Uuid, Path, description = "Order item ID")),
    request_body = UpdateSerialsRequest,
    responses(
        (status = 200, description = "Serials replaced", body = ApiResponse<OrderItemDetail>),
        (status = 400, description = "Too many, repeated or already assigned serials"),
        (status = 404, description = "Order item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn update_serials(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSerialsRequest>,
) -> AppResult<Json<ApiResponse<OrderItemDetail>>> {
    let resp = fulfillment_service::update_serials(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/store/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order marked completed", body = ApiResponse<Order>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = fulfillment_service::complete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/store/orders/{id}/shipment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddShipmentRequest,
    responses(
        (status = 200, description = "Shipment dispatched", body = ApiResponse<OrderShipment>),
        (status = 400, description = "Order unpaid or shipment exists"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn add_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddShipmentRequest>,
) -> AppResult<Json<ApiResponse<OrderShipment>>> {
    let resp = fulfillment_service::add_shipment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/store/orders/{id}/shipment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = EditShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated", body = ApiResponse<OrderShipment>),
        (status = 404, description = "Shipment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Store"
)]
pub async fn edit_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditShipmentRequest>,
) -> AppResult<Json<ApiResponse<OrderShipment>>> {
    let resp = fulfillment_service::edit_shipment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
