mod common;

use common::{create_asset, create_partner, create_user, database_url, serial, setup_state};
use partner_portal::{
    dto::{
        cart::{AddToCartRequest, UpdateCartRequest},
        fulfillment::{AddShipmentRequest, UpdateSerialsRequest},
        orders::{MarkReceivedRequest, PaymentConfirmation},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::ShipmentStatus,
    services::{cart_service, fulfillment_service, order_service, partner_service, payment_service},
};

// Integration flow: partner fills cart within limit -> checkout -> pay;
// store serializes and ships; partner receives once.
#[tokio::test]
async fn cart_checkout_payment_and_delivery_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url).await?;

    let partner_user_id = create_user(&state, "flowpartner", "partner").await?;
    let store_user_id = create_user(&state, "flowstore", "store").await?;
    create_partner(&state, partner_user_id).await?;

    // Limited router plus a refundable deposit kit
    let router = create_asset(&state, "Router", "ROU-0001", 1500, false, Some(3)).await?;
    let deposit = create_asset(&state, "Deposit Kit", "DEP-0001", 5000, true, None).await?;

    let partner = AuthUser {
        user_id: partner_user_id,
        role: "partner".into(),
    };
    let store = AuthUser {
        user_id: store_user_id,
        role: "store".into(),
    };

    let added = cart_service::add_to_cart(
        &state,
        &partner,
        AddToCartRequest {
            asset_id: router.id,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(added.data.unwrap().cart_count, 2);

    // 2 in cart, limit 3: two more must be rejected with one remaining
    let err = cart_service::add_to_cart(
        &state,
        &partner,
        AddToCartRequest {
            asset_id: router.id,
            quantity: 2,
        },
    )
    .await
    .expect_err("limit should be enforced");
    assert!(matches!(err, AppError::LimitExceeded { remaining: 1 }));

    // Updating the line ignores its own quantity
    let updated = cart_service::update_cart_item(
        &state,
        &partner,
        router.id,
        UpdateCartRequest { quantity: 3 },
    )
    .await?;
    assert_eq!(updated.data.unwrap().quantity, 3);

    cart_service::add_to_cart(
        &state,
        &partner,
        AddToCartRequest {
            asset_id: deposit.id,
            quantity: 1,
        },
    )
    .await?;

    let cart = cart_service::view_cart(&state, &partner).await?.data.unwrap();
    assert_eq!(cart.total_items, 4);
    assert_eq!(cart.distinct_items, 2);
    assert_eq!(cart.total_price, 3 * 1500 + 5000);

    let checkout = order_service::checkout(&state, &partner).await?.data.unwrap();
    let order_id = checkout.order.id;
    assert_eq!(checkout.order.status, "Pending");
    assert_eq!(checkout.order.amount, 3 * 1500 + 5000);
    assert_eq!(checkout.order.dc_number.as_deref(), Some("DC0001"));

    let cart = cart_service::view_cart(&state, &partner).await?.data.unwrap();
    assert!(cart.items.is_empty());

    // Nothing shipped yet
    let not_shipped = order_service::mark_received(
        &state,
        &partner,
        order_id,
        MarkReceivedRequest { signature: None },
    )
    .await;
    assert!(matches!(not_shipped, Err(AppError::BadRequest(_))));

    // The pending order now counts toward the lifetime quantity
    let err = cart_service::add_to_cart(
        &state,
        &partner,
        AddToCartRequest {
            asset_id: router.id,
            quantity: 1,
        },
    )
    .await
    .expect_err("lifetime quantity should count");
    assert!(matches!(err, AppError::LimitExceeded { remaining: 0 }));

    // Paying with a forged signature is rejected
    let failed = payment_service::confirm_payment(
        &state,
        PaymentConfirmation {
            gateway_order_id: checkout.gateway_order_id.clone(),
            payment_id: "pay_forged".into(),
            signature: "00ff".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!failed.verified);
    assert_eq!(failed.order.status, "Failed");
    assert_eq!(failed.redirect_to, "/cart?payment=failed");

    // A second order goes through with a valid signature
    cart_service::add_to_cart(
        &state,
        &partner,
        AddToCartRequest {
            asset_id: deposit.id,
            quantity: 2,
        },
    )
    .await?;
    let checkout = order_service::checkout(&state, &partner).await?.data.unwrap();
    assert_eq!(checkout.order.dc_number.as_deref(), Some("DC0002"));
    let paid_order_id = checkout.order.id;

    let signature = state.gateway.sign(&checkout.gateway_order_id, "pay_ok");
    let paid = payment_service::confirm_payment(
        &state,
        PaymentConfirmation {
            gateway_order_id: checkout.gateway_order_id.clone(),
            payment_id: "pay_ok".into(),
            signature,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(paid.verified);
    assert_eq!(paid.order.status, "Paid");
    assert!(paid.order.paid_at.is_some());

    let wallet = partner_service::my_wallet(&state, &partner).await?.data.unwrap();
    assert_eq!(wallet.balance, 2 * 5000);
    assert_eq!(wallet.transactions.len(), 1);
    assert_ne!(order_id, paid_order_id);

    // Store attaches serials to the only line
    let detail = order_service::get_order(&state, &partner, paid_order_id)
        .await?
        .data
        .unwrap();
    let item_id = detail.items[0].item.id;
    let serialized = fulfillment_service::update_serials(
        &state,
        &store,
        item_id,
        UpdateSerialsRequest {
            serials: vec![serial(" SN-1 "), serial(""), serial("SN-2")],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(serialized.serials.len(), 2);

    let detail = fulfillment_service::get_store_order(&state, &store, paid_order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order.status, "Serial Updated");

    let shipment = fulfillment_service::add_shipment(
        &state,
        &store,
        paid_order_id,
        AddShipmentRequest {
            courier_name: "BlueDart".into(),
            tracking_id: "BD123".into(),
            remarks: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipment.shipping_status, Some(ShipmentStatus::InTransit));

    let received = order_service::mark_received(
        &state,
        &partner,
        paid_order_id,
        MarkReceivedRequest { signature: None },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(received.order_status, "Completed");
    assert_eq!(received.shipment.shipping_status, Some(ShipmentStatus::Delivered));
    assert!(received.shipment.delivered_at.is_some());

    let again = order_service::mark_received(
        &state,
        &partner,
        paid_order_id,
        MarkReceivedRequest { signature: None },
    )
    .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    Ok(())
}
