pub mod admin_service;
pub mod asset_service;
pub mod auth_service;
pub mod cart_service;
pub mod fulfillment_service;
pub mod mapping_service;
pub mod order_service;
pub mod partner_service;
pub mod payment_service;
