use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        assets::{AssetList, CategoryList, CreateAssetRequest, CreateCategoryRequest, UpdateAssetRequest},
        auth::{CreateUserRequest, LoginRequest, LoginResponse},
        cart::{AddToCartRequest, CartItemDto, CartMutation, CartView, UpdateCartRequest},
        fulfillment::{AddShipmentRequest, EditShipmentRequest, SerialInput, UpdateSerialsRequest},
        mappings::{
            AssetAvailability, AssignCustomerRequest, AssignedMapping, MappingSummary,
            SerialHolding,
        },
        orders::{
            CheckoutResponse, MarkReceivedRequest, OrderDetail, OrderItemDetail, OrderList,
            PaymentConfirmation, PaymentResult, ReceivedResponse, UpdateOrderStatusRequest,
        },
        partners::{
            AssignCategoryRequest, LimitList, PartnerList, PartnerProfile, SetAssetLimitRequest,
            WalletView,
        },
    },
    limits::LimitPolicy,
    models::{
        Asset, AssetCategory, AssetLimit, AuditLog, CartItem, CustomerAssetMapping, Order,
        OrderItem, OrderItemSerial, OrderShipment, OrderStatus, Partner, PartnerCategory,
        ShipmentStatus, User, UserType, WalletTransaction,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, assets, auth, cart, health, mappings, orders, params, partners, payments, store,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::login,
        auth::register_user,
        assets::list_assets,
        assets::get_asset,
        assets::list_categories,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::mark_received,
        payments::confirm_payment,
        store::list_store_orders,
        store::get_store_order,
        store::update_serials,
        store::complete_order,
        store::add_shipment,
        store::edit_shipment,
        partners::my_profile,
        partners::my_wallet,
        mappings::summary,
        mappings::assign_customer,
        admin::create_asset,
        admin::update_asset,
        admin::delete_asset,
        admin::create_category,
        admin::list_partners,
        admin::assign_category,
        admin::list_partner_limits,
        admin::set_partner_limit,
        admin::list_partner_categories,
        admin::list_category_limits,
        admin::set_category_limit,
        admin::update_order_status,
        admin::list_audit_logs
    ),
    components(
        schemas(
            User,
            UserType,
            Asset,
            AssetCategory,
            AssetLimit,
            AuditLog,
            CartItem,
            CustomerAssetMapping,
            Order,
            OrderItem,
            OrderItemSerial,
            OrderShipment,
            OrderStatus,
            Partner,
            PartnerCategory,
            ShipmentStatus,
            WalletTransaction,
            LimitPolicy,
            LoginRequest,
            LoginResponse,
            CreateUserRequest,
            AssetList,
            CategoryList,
            CreateAssetRequest,
            UpdateAssetRequest,
            CreateCategoryRequest,
            AddToCartRequest,
            UpdateCartRequest,
            CartView,
            CartItemDto,
            CartMutation,
            CheckoutResponse,
            PaymentConfirmation,
            PaymentResult,
            MarkReceivedRequest,
            ReceivedResponse,
            OrderDetail,
            OrderItemDetail,
            OrderList,
            UpdateOrderStatusRequest,
            SerialInput,
            UpdateSerialsRequest,
            AddShipmentRequest,
            EditShipmentRequest,
            PartnerProfile,
            PartnerList,
            LimitList,
            SetAssetLimitRequest,
            AssignCategoryRequest,
            WalletView,
            AssignCustomerRequest,
            AssignedMapping,
            AssetAvailability,
            SerialHolding,
            MappingSummary,
            params::Pagination,
            params::AssetQuery,
            params::OrderListQuery,
            params::AuditLogQuery,
            Meta,
            ApiResponse<Asset>,
            ApiResponse<AssetList>,
            ApiResponse<CartView>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentResult>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Catalog", description = "Asset catalog"),
        (name = "Cart", description = "Cart with purchase limit enforcement"),
        (name = "Orders", description = "Partner orders and checkout"),
        (name = "Payments", description = "Payment gateway callbacks"),
        (name = "Store", description = "Fulfillment: serials and shipments"),
        (name = "Partners", description = "Partner self-service"),
        (name = "Customer Mapping", description = "Assign delivered units to customers"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
