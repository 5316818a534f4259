use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{PaymentConfirmation, PaymentResult},
    entity::{
        assets::Entity as Assets,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        partners::{Column as PartnerCol, Entity as Partners},
        wallet_transactions::ActiveModel as WalletTxActive,
    },
    error::{AppError, AppResult},
    models::{Order, OrderStatus, WalletTransactionType},
    response::{ApiResponse, Meta},
    state::AppState,
};

const FAILURE_REDIRECT: &str = "/cart?payment=failed";

/// Gateway callback after hosted checkout.
pub async fn confirm_payment(
    state: &AppState,
    payload: PaymentConfirmation,
) -> AppResult<ApiResponse<PaymentResult>> {
    let PaymentConfirmation {
        gateway_order_id,
        payment_id,
        signature,
    } = payload;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(OrderCol::GatewayOrderId.eq(gateway_order_id.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    match order.status.parse::<OrderStatus>() {
        Ok(OrderStatus::Pending) => {}
        Ok(OrderStatus::Paid) if order.gateway_payment_id.as_deref() == Some(payment_id.as_str()) => {
            txn.commit().await?;
            return Ok(ApiResponse::success(
                "Payment already confirmed",
                PaymentResult {
                    verified: true,
                    redirect_to: success_redirect(order.id),
                    order: Order::from(order),
                },
                Some(Meta::empty()),
            ));
        }
        _ => {
            return Err(AppError::BadRequest(format!(
                "Order is already {}",
                order.status
            )));
        }
    }

    let verified = state
        .gateway
        .verify_signature(&gateway_order_id, &payment_id, &signature);

    let user_id = order.user_id;
    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.gateway_payment_id = Set(Some(payment_id));
    active.gateway_signature = Set(Some(signature));
    active.updated_at = Set(now.into());
    if verified {
        active.status = Set(OrderStatus::Paid.as_str().to_string());
        active.paid_at = Set(Some(now.into()));
    } else {
        active.status = Set(OrderStatus::Failed.as_str().to_string());
    }
    let order = active.update(&txn).await?;

    let credited = if verified {
        credit_refundable_deposits(&txn, &order).await?
    } else {
        0
    };

    txn.commit().await?;

    if verified {
        tracing::info!(order_id = %order.id, credited, "payment confirmed");
    } else {
        tracing::warn!(
            order_id = %order.id,
            gateway_order_id = %gateway_order_id,
            "payment signature mismatch"
        );
    }
    audit::record(
        &state.pool,
        user_id,
        if verified { "payment_confirmed" } else { "payment_failed" },
        "orders",
        serde_json::json!({ "order_id": order.id, "credited": credited }),
    )
    .await;

    let (message, redirect_to) = if verified {
        ("Payment verified", success_redirect(order.id))
    } else {
        ("Payment verification failed", FAILURE_REDIRECT.to_string())
    };

    Ok(ApiResponse::success(
        message,
        PaymentResult {
            verified,
            order: Order::from(order),
            redirect_to,
        },
        Some(Meta::empty()),
    ))
}

/// Credit the partner wallet with the value of refundable deposit items.
async fn credit_refundable_deposits(
    txn: &DatabaseTransaction,
    order: &OrderModel,
) -> AppResult<i64> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .find_also_related(Assets)
        .all(txn)
        .await?;

    let amount: i64 = rows
        .iter()
        .filter(|(_, asset)| asset.as_ref().is_some_and(|a| a.is_refundable_wallet_deposit))
        .map(|(item, _)| item.price * i64::from(item.quantity))
        .sum();
    if amount == 0 {
        return Ok(0);
    }

    let Some(partner) = Partners::find()
        .filter(PartnerCol::UserId.eq(order.user_id))
        .one(txn)
        .await?
    else {
        tracing::warn!(order_id = %order.id, "refundable deposit without partner record");
        return Ok(0);
    };

    Partners::update_many()
        .col_expr(
            PartnerCol::RefundableWallet,
            Expr::col(PartnerCol::RefundableWallet).add(amount),
        )
        .filter(PartnerCol::Id.eq(partner.id))
        .exec(txn)
        .await?;

    WalletTxActive {
        id: Set(Uuid::new_v4()),
        partner_id: Set(partner.id),
        order_id: Set(Some(order.id)),
        transaction_type: Set(WalletTransactionType::Credit.as_str().to_string()),
        amount: Set(amount),
        description: Set(format!("Refundable deposit for order {}", order.order_number)),
        transaction_date: NotSet,
    }
    .insert(txn)
    .await?;

    Ok(amount)
}

fn success_redirect(order_id: Uuid) -> String {
    format!("/orders/{order_id}")
}
