//! OTP-gated order cancellation.
//!
//! Cancellation is offered only before the parcel leaves the warehouse
//! and is gated behind a one-time code emailed to the account address.
//! A verified cancellation of a captured prepaid order does not refund
//! directly; it creates a refund request awaiting the customer's method
//! selection.

use kanau::processor::Processor;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::orders::{GetOrderById, Order};
use crate::entities::otp_codes::OtpCode;
use crate::entities::refund_requests::RefundRequest;
use crate::entities::{NotificationKind, OrderStatus, OtpScope, PaymentStatus};
use crate::events::{MailEvent, MailEventSender, OtpPurpose};
use crate::framework::DatabaseProcessor;
use crate::otp::{self, CANCELLATION_POLICY, VerifyOutcome};
use crate::workflow::notify;

#[derive(Debug, Error)]
pub enum CancellationError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Also covers orders owned by someone else.
    #[error("order not found")]
    OrderNotFound,

    #[error("order can no longer be cancelled")]
    NotCancellable,

    /// The one-time code did not verify; the outcome says why.
    #[error("code verification failed")]
    Code(VerifyOutcome),
}

/// Issue a cancellation code for an order and email it to the owner.
///
/// Returns the validity window in seconds. Re-requesting replaces any
/// pending code.
pub async fn request_cancellation(
    pool: &PgPool,
    mail_tx: &MailEventSender,
    otp_secret: &[u8],
    order_id: Uuid,
    user_id: Uuid,
) -> Result<i64, CancellationError> {
    let order = fetch_owned_order(pool, order_id, user_id).await?;
    if !order.status.is_cancellable() {
        return Err(CancellationError::NotCancellable);
    }

    let subject = order_id.to_string();
    let code = otp::generate_code();
    let hash = otp::hash_code(otp_secret, OtpScope::OrderCancellation, &subject, &code);
    OtpCode::replace(
        pool,
        OtpScope::OrderCancellation,
        &subject,
        Some(user_id),
        &hash,
        CANCELLATION_POLICY.ttl,
    )
    .await?;

    let expires_minutes = CANCELLATION_POLICY.ttl.whole_minutes();
    notify::email_user(pool, mail_tx, user_id, move |to| MailEvent::OtpCode {
        to,
        code,
        purpose: OtpPurpose::OrderCancellation,
        expires_minutes,
    })
    .await?;

    Ok(CANCELLATION_POLICY.ttl.whole_seconds())
}

pub struct CancellationOutcome {
    pub order_id: Uuid,
    /// Present when the order was prepaid and captured: the customer
    /// still has to pick how the money comes back.
    pub refund_request: Option<RefundRequest>,
}

/// Verify the code and cancel the order.
pub async fn confirm_cancellation(
    pool: &PgPool,
    mail_tx: &MailEventSender,
    otp_secret: &[u8],
    order_id: Uuid,
    user_id: Uuid,
    code: &str,
) -> Result<CancellationOutcome, CancellationError> {
    let order = fetch_owned_order(pool, order_id, user_id).await?;
    if !order.status.is_cancellable() {
        return Err(CancellationError::NotCancellable);
    }

    let subject = order_id.to_string();
    let outcome = otp::verify_and_consume(
        pool,
        otp_secret,
        OtpScope::OrderCancellation,
        &subject,
        code,
        CANCELLATION_POLICY,
    )
    .await?;
    if outcome != VerifyOutcome::Verified {
        return Err(CancellationError::Code(outcome));
    }

    let mut tx = pool.begin().await?;
    let order = Order::lock_tx(&mut tx, order_id)
        .await?
        .ok_or(CancellationError::OrderNotFound)?;
    // Re-checked under the lock: a concurrent confirm or a shipment
    // update may have raced the verification.
    if !order.status.is_cancellable() {
        return Err(CancellationError::NotCancellable);
    }
    Order::update_status_tx(&mut tx, order_id, OrderStatus::Cancelled).await?;

    let refund_request = if order.payment_method.is_prepaid()
        && order.payment_status == PaymentStatus::Paid
    {
        Some(RefundRequest::insert_tx(&mut tx, order_id, user_id, order.total).await?)
    } else {
        None
    };
    tx.commit().await?;

    let refund_pending = refund_request.is_some();
    notify::notify(
        pool,
        user_id,
        "Order cancelled",
        &if refund_pending {
            format!(
                "Order {order_id} has been cancelled. Please choose how you'd like \
                 to receive your refund."
            )
        } else {
            format!("Order {order_id} has been cancelled.")
        },
        NotificationKind::Order,
        None,
    )
    .await?;
    notify::email_user(pool, mail_tx, user_id, move |to| MailEvent::OrderCancelled {
        to,
        order_id,
        refund_pending,
    })
    .await?;

    Ok(CancellationOutcome {
        order_id,
        refund_request,
    })
}

async fn fetch_owned_order(
    pool: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<Order, CancellationError> {
    let processor = DatabaseProcessor { pool: pool.clone() };
    processor
        .process(GetOrderById { order_id })
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or(CancellationError::OrderNotFound)
}
