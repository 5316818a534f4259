use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod assets;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod mappings;
pub mod orders;
pub mod params;
pub mod partners;
pub mod payments;
pub mod store;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/assets", assets::router())
        .nest("/categories", assets::category_router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/store", store::router())
        .nest("/partners", partners::router())
        .nest("/customer-mappings", mappings::router())
        .nest("/admin", admin::router())
}
