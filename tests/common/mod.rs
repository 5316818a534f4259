#![allow(dead_code)]

use partner_portal::{
    config::{AppConfig, PaymentConfig},
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::AddToCartRequest,
        fulfillment::SerialInput,
        orders::{CheckoutResponse, PaymentConfirmation},
    },
    entity::{
        assets::{ActiveModel as AssetActive, Model as AssetModel},
        partners::ActiveModel as PartnerActive,
        users::ActiveModel as UserActive,
    },
    error::AppResult,
    limits::LimitPolicy,
    middleware::auth::AuthUser,
    services::{cart_service, order_service, payment_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE customer_asset_mappings, wallet_transactions, order_shipments, \
         order_item_serials, order_items, orders, cart_items, carts, \
         partner_category_asset_limits, partner_asset_limits, partners, assets, \
         asset_categories, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".to_string().into(),
        payment: PaymentConfig {
            key_id: "key_test".into(),
            key_secret: "gateway-secret".to_string().into(),
            base_url: None,
            currency: "INR".into(),
        },
        media_root: std::env::temp_dir().join(format!("portal-media-{}", Uuid::new_v4())),
        limit_policy: LimitPolicy::MostSpecific,
    };

    Ok(AppState::new(pool, orm, config))
}

pub fn auth(user_id: Uuid, role: &str) -> AuthUser {
    AuthUser {
        user_id,
        role: role.into(),
    }
}

pub async fn create_user(state: &AppState, username: &str, user_type: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("dummy".into()),
        user_type: Set(user_type.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

/// Returns the partner id.
pub async fn create_partner(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let partner = PartnerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        category_id: Set(None),
        first_name: Set("Flow".into()),
        last_name: Set("Partner".into()),
        phone: Set(None),
        address: Set(None),
        code: Set(None),
        refundable_wallet: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(partner.id)
}

pub async fn create_asset(
    state: &AppState,
    name: &str,
    code: &str,
    price: i64,
    refundable: bool,
    limit: Option<i32>,
) -> anyhow::Result<AssetModel> {
    let asset = AssetActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        category_id: Set(None),
        description: Set(None),
        asset_code: Set(code.into()),
        location: Set(None),
        quantity: Set(100),
        purchase_price: Set(price),
        is_refundable_wallet_deposit: Set(refundable),
        max_order_per_partner: Set(limit),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(asset)
}

pub fn serial(number: &str) -> SerialInput {
    SerialInput {
        serial_number: number.into(),
        make: None,
        model: None,
        mac_id: None,
    }
}

pub async fn add_to_cart(
    state: &AppState,
    partner: &AuthUser,
    asset_id: Uuid,
    quantity: i32,
) -> AppResult<i64> {
    let added = cart_service::add_to_cart(state, partner, AddToCartRequest { asset_id, quantity })
        .await?;
    Ok(added.data.map_or(0, |m| m.cart_count))
}

/// Check out the partner's cart and confirm payment with a valid signature.
pub async fn checkout_and_pay(state: &AppState, partner: &AuthUser) -> anyhow::Result<CheckoutResponse> {
    let checkout = order_service::checkout(state, partner)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("checkout returned no data"))?;
    let payment_id = format!("pay_{}", Uuid::new_v4().simple());
    let signature = state.gateway.sign(&checkout.gateway_order_id, &payment_id);
    payment_service::confirm_payment(
        state,
        PaymentConfirmation {
            gateway_order_id: checkout.gateway_order_id.clone(),
            payment_id,
            signature,
        },
    )
    .await?;
    Ok(checkout)
}
