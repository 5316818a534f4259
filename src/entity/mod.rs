pub mod asset_categories;
pub mod assets;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod customer_asset_mappings;
pub mod order_item_serials;
pub mod order_items;
pub mod order_shipments;
pub mod orders;
pub mod partner_asset_limits;
pub mod partner_categories;
pub mod partner_category_asset_limits;
pub mod partners;
pub mod users;
pub mod wallet_transactions;

pub use asset_categories::Entity as AssetCategories;
pub use assets::Entity as Assets;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use customer_asset_mappings::Entity as CustomerAssetMappings;
pub use order_item_serials::Entity as OrderItemSerials;
pub use order_items::Entity as OrderItems;
pub use order_shipments::Entity as OrderShipments;
pub use orders::Entity as Orders;
pub use partner_asset_limits::Entity as PartnerAssetLimits;
pub use partner_categories::Entity as PartnerCategories;
pub use partner_category_asset_limits::Entity as PartnerCategoryAssetLimits;
pub use partners::Entity as Partners;
pub use users::Entity as Users;
pub use wallet_transactions::Entity as WalletTransactions;
