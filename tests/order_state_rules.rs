mod common;

use common::{
    add_to_cart, auth, checkout_and_pay, create_asset, create_partner, create_user, database_url,
    serial, setup_state,
};
use partner_portal::{
    dto::{
        fulfillment::{AddShipmentRequest, EditShipmentRequest, UpdateSerialsRequest},
        orders::{MarkReceivedRequest, PaymentConfirmation, UpdateOrderStatusRequest},
    },
    error::AppError,
    models::ShipmentStatus,
    services::{admin_service, cart_service, fulfillment_service, order_service, payment_service},
};

fn shipment_request() -> AddShipmentRequest {
    AddShipmentRequest {
        courier_name: "BlueDart".into(),
        tracking_id: "BD123".into(),
        remarks: None,
    }
}

fn status_edit(status: ShipmentStatus) -> EditShipmentRequest {
    EditShipmentRequest {
        courier_name: None,
        tracking_id: None,
        remarks: None,
        shipping_status: Some(status),
        dispatched_at: None,
        delivered_at: None,
    }
}

// Cart overflow, unpaid fulfillment, store-side delivery and receiving a
// cancelled order are all rejected without changing state.
#[tokio::test]
async fn order_and_shipment_transitions_are_guarded() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url).await?;
    let partner_user_id = create_user(&state, "rulespartner", "partner").await?;
    create_partner(&state, partner_user_id).await?;
    let partner = auth(partner_user_id, "partner");
    let store = auth(create_user(&state, "rulesstore", "store").await?, "store");
    let admin = auth(create_user(&state, "rulesadmin", "superadmin").await?, "superadmin");

    let cable = create_asset(&state, "Cable", "CAB-0001", 100, false, None).await?;

    // Unlimited asset: growing a line past i32::MAX is refused
    assert_eq!(add_to_cart(&state, &partner, cable.id, i32::MAX).await?, i64::from(i32::MAX));
    let overflow = add_to_cart(&state, &partner, cable.id, 1).await;
    assert!(matches!(overflow, Err(AppError::BadRequest(msg)) if msg == "quantity too large"));
    let cart = cart_service::view_cart(&state, &partner).await?.data.unwrap();
    assert_eq!(cart.total_items, i64::from(i32::MAX));
    cart_service::remove_from_cart(&state, &partner, cable.id).await?;

    // Unpaid order: no serials, no shipment, no completion
    add_to_cart(&state, &partner, cable.id, 1).await?;
    let pending = order_service::checkout(&state, &partner).await?.data.unwrap();
    let item_id = pending.items[0].id;

    let serials = fulfillment_service::update_serials(
        &state,
        &store,
        item_id,
        UpdateSerialsRequest {
            serials: vec![serial("SN-PENDING")],
        },
    )
    .await;
    assert!(matches!(serials, Err(AppError::BadRequest(_))));
    let shipment =
        fulfillment_service::add_shipment(&state, &store, pending.order.id, shipment_request()).await;
    assert!(matches!(shipment, Err(AppError::BadRequest(_))));
    let completed = fulfillment_service::complete_order(&state, &store, pending.order.id).await;
    assert!(matches!(completed, Err(AppError::BadRequest(_))));

    let detail = fulfillment_service::get_store_order(&state, &store, pending.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order.status, "Pending");
    assert!(detail.items[0].serials.is_empty());
    assert!(detail.shipment.is_none());

    // Once paid the store may complete it, but only once
    let signature = state.gateway.sign(&pending.gateway_order_id, "pay_rules");
    payment_service::confirm_payment(
        &state,
        PaymentConfirmation {
            gateway_order_id: pending.gateway_order_id.clone(),
            payment_id: "pay_rules".into(),
            signature,
        },
    )
    .await?;
    let completed = fulfillment_service::complete_order(&state, &store, pending.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(completed.status, "Completed");
    let again = fulfillment_service::complete_order(&state, &store, pending.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    // Store cannot record delivery; the partner's receipt does
    add_to_cart(&state, &partner, cable.id, 1).await?;
    let paid = checkout_and_pay(&state, &partner).await?;
    fulfillment_service::add_shipment(&state, &store, paid.order.id, shipment_request()).await?;

    let edited = fulfillment_service::edit_shipment(
        &state,
        &store,
        paid.order.id,
        status_edit(ShipmentStatus::Delivered),
    )
    .await;
    assert!(matches!(edited, Err(AppError::BadRequest(_))));

    let received = order_service::mark_received(
        &state,
        &partner,
        paid.order.id,
        MarkReceivedRequest { signature: None },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(received.order_status, "Completed");
    assert_eq!(received.shipment.shipping_status, Some(ShipmentStatus::Delivered));

    let reopened = fulfillment_service::edit_shipment(
        &state,
        &store,
        paid.order.id,
        status_edit(ShipmentStatus::InTransit),
    )
    .await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));

    // Cancelled after dispatch: receipt is refused and no signature is written
    add_to_cart(&state, &partner, cable.id, 1).await?;
    let cancelled = checkout_and_pay(&state, &partner).await?;
    fulfillment_service::add_shipment(&state, &store, cancelled.order.id, shipment_request())
        .await?;
    admin_service::update_order_status(
        &state,
        &admin,
        cancelled.order.id,
        UpdateOrderStatusRequest {
            status: "Cancelled".into(),
        },
    )
    .await?;

    let refused = order_service::mark_received(
        &state,
        &partner,
        cancelled.order.id,
        MarkReceivedRequest {
            signature: Some("data:image/png;base64,aGVsbG8=".into()),
        },
    )
    .await;
    assert!(matches!(refused, Err(AppError::BadRequest(_))));

    let signature_file = state.config.media_root.join(format!(
        "signature/signature_{}.png",
        cancelled.order.order_number
    ));
    assert!(!signature_file.exists());

    let detail = order_service::get_order(&state, &partner, cancelled.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order.status, "Cancelled");
    assert_eq!(
        detail.shipment.and_then(|s| s.shipping_status),
        Some(ShipmentStatus::InTransit)
    );

    Ok(())
}
