pub mod assets;
pub mod auth;
pub mod cart;
pub mod fulfillment;
pub mod mappings;
pub mod orders;
pub mod partners;
