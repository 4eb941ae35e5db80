//! RefundReconciler processor.
//!
//! A gateway refund whose response was ambiguous (or whose submission
//! crashed after the `processing` marker was committed) stays in
//! `processing` with no reference. The initial response is never trusted
//! as ground truth; this processor settles such refunds by polling the
//! gateway's `refund_status` command until it answers definitively or
//! the attempt cap is reached, at which point the refund is marked
//! `failed` for manual reconciliation.

use aftersale_sdk::gateway::RefundAck;
use kanau::processor::Processor;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::entities::complaints::{ListStuckGatewayRefunds, OrderComplaint, StuckGatewayRefund};
use crate::entities::orders::Order;
use crate::entities::refund_requests::{
    ListStuckRequestRefunds, RefundRequest, StuckRequestRefund,
};
use crate::entities::{NotificationKind, PaymentStatus, RefundMethod};
use crate::events::{MailEvent, MailEventSender};
use crate::framework::DatabaseProcessor;
use crate::gateway::GatewayClient;
use crate::workflow::notify;

/// Give up and mark the refund `failed` after this many indefinite polls.
pub const MAX_RECONCILE_ATTEMPTS: i32 = 12;

/// How often the reconciler wakes up to scan for stuck refunds.
const SCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// Rows fetched per scan, per table.
const SCAN_BATCH: i64 = 20;

/// Whether a stuck refund is due for another poll.
///
/// Early attempts retry quickly; later ones back off, since a refund
/// that has been indefinite for an hour will rarely settle in the next
/// minute.
pub fn due_for_poll(
    attempts: i32,
    last_polled: Option<time::OffsetDateTime>,
    now: time::OffsetDateTime,
) -> bool {
    let Some(last) = last_polled else {
        return true;
    };
    let wait = match attempts {
        a if a < 3 => time::Duration::minutes(1),
        a if a < 6 => time::Duration::minutes(5),
        _ => time::Duration::minutes(15),
    };
    now - last >= wait
}

/// RefundReconciler polls the gateway for refunds stuck in `processing`.
pub struct RefundReconciler {
    pool: PgPool,
    gateway: GatewayClient,
    mail_tx: MailEventSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl RefundReconciler {
    pub fn new(
        pool: PgPool,
        gateway: GatewayClient,
        mail_tx: MailEventSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pool,
            gateway,
            mail_tx,
            shutdown_rx,
        }
    }

    /// Run until shutdown.
    pub async fn run(mut self) {
        info!("RefundReconciler started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("RefundReconciler received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(SCAN_INTERVAL) => {
                    if let Err(e) = self.scan().await {
                        error!(error = %e, "Refund reconciliation scan failed");
                    }
                }
            }
        }

        info!("RefundReconciler shutdown complete");
    }

    async fn scan(&self) -> Result<(), sqlx::Error> {
        let processor = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        let now = time::OffsetDateTime::now_utc();

        let complaints = processor
            .process(ListStuckGatewayRefunds { limit: SCAN_BATCH })
            .await?;
        for stuck in complaints {
            if !due_for_poll(stuck.reconcile_attempts, stuck.reconcile_last_at, now) {
                continue;
            }
            if let Err(e) = self.settle_complaint(&stuck).await {
                error!(complaint_id = %stuck.complaint_id, error = %e, "Failed to settle complaint refund");
            }
        }

        let requests = processor
            .process(ListStuckRequestRefunds { limit: SCAN_BATCH })
            .await?;
        for stuck in requests {
            if !due_for_poll(stuck.reconcile_attempts, stuck.reconcile_last_at, now) {
                continue;
            }
            if let Err(e) = self.settle_request(&stuck).await {
                error!(refund_request_id = %stuck.refund_request_id, error = %e, "Failed to settle cancellation refund");
            }
        }

        Ok(())
    }

    async fn settle_complaint(&self, stuck: &StuckGatewayRefund) -> Result<(), sqlx::Error> {
        match self
            .gateway
            .refund_status(&stuck.gateway_transaction_id, stuck.amount)
            .await
        {
            Ok(RefundAck::Accepted { reference }) => {
                let mut tx = self.pool.begin().await?;
                OrderComplaint::mark_completed_tx(
                    &mut tx,
                    stuck.complaint_id,
                    None,
                    Some(&reference),
                )
                .await?;
                Order::update_payment_status_tx(&mut tx, stuck.order_id, PaymentStatus::Refunded)
                    .await?;
                tx.commit().await?;
                info!(complaint_id = %stuck.complaint_id, reference = %reference, "Reconciled gateway refund as completed");
                self.notify_completed(stuck.user_id, stuck.order_id, stuck.amount)
                    .await?;
            }
            Ok(RefundAck::Rejected { reason }) => {
                let mut tx = self.pool.begin().await?;
                OrderComplaint::mark_failed_tx(&mut tx, stuck.complaint_id).await?;
                tx.commit().await?;
                warn!(complaint_id = %stuck.complaint_id, reason = %reason, "Gateway rejected refund during reconciliation");
            }
            Ok(RefundAck::Ambiguous) | Err(_) => {
                let attempts =
                    OrderComplaint::bump_reconcile_attempts(&self.pool, stuck.complaint_id).await?;
                if attempts >= MAX_RECONCILE_ATTEMPTS {
                    let mut tx = self.pool.begin().await?;
                    OrderComplaint::mark_failed_tx(&mut tx, stuck.complaint_id).await?;
                    tx.commit().await?;
                    error!(
                        complaint_id = %stuck.complaint_id,
                        attempts,
                        "Gateway refund still indefinite after attempt cap, marked failed for manual reconciliation"
                    );
                }
            }
        }
        Ok(())
    }

    async fn settle_request(&self, stuck: &StuckRequestRefund) -> Result<(), sqlx::Error> {
        match self
            .gateway
            .refund_status(&stuck.gateway_transaction_id, stuck.amount)
            .await
        {
            Ok(RefundAck::Accepted { reference }) => {
                let mut tx = self.pool.begin().await?;
                RefundRequest::mark_completed_tx(
                    &mut tx,
                    stuck.refund_request_id,
                    None,
                    Some(&reference),
                )
                .await?;
                Order::update_payment_status_tx(&mut tx, stuck.order_id, PaymentStatus::Refunded)
                    .await?;
                tx.commit().await?;
                info!(refund_request_id = %stuck.refund_request_id, reference = %reference, "Reconciled cancellation refund as completed");
                self.notify_completed(stuck.user_id, stuck.order_id, stuck.amount)
                    .await?;
            }
            Ok(RefundAck::Rejected { reason }) => {
                let mut tx = self.pool.begin().await?;
                RefundRequest::mark_failed_tx(&mut tx, stuck.refund_request_id).await?;
                tx.commit().await?;
                warn!(refund_request_id = %stuck.refund_request_id, reason = %reason, "Gateway rejected cancellation refund during reconciliation");
            }
            Ok(RefundAck::Ambiguous) | Err(_) => {
                let attempts =
                    RefundRequest::bump_reconcile_attempts(&self.pool, stuck.refund_request_id)
                        .await?;
                if attempts >= MAX_RECONCILE_ATTEMPTS {
                    let mut tx = self.pool.begin().await?;
                    RefundRequest::mark_failed_tx(&mut tx, stuck.refund_request_id).await?;
                    tx.commit().await?;
                    error!(
                        refund_request_id = %stuck.refund_request_id,
                        attempts,
                        "Cancellation refund still indefinite after attempt cap, marked failed for manual reconciliation"
                    );
                }
            }
        }
        Ok(())
    }

    async fn notify_completed(
        &self,
        user_id: uuid::Uuid,
        order_id: uuid::Uuid,
        amount: rust_decimal::Decimal,
    ) -> Result<(), sqlx::Error> {
        notify::notify(
            &self.pool,
            user_id,
            "Refund completed",
            &format!("Your refund of {amount} for order {order_id} has been processed."),
            NotificationKind::Refund,
            None,
        )
        .await?;
        notify::email_user(&self.pool, &self.mail_tx, user_id, move |to| {
            MailEvent::RefundCompleted {
                to,
                order_id,
                amount,
                method: RefundMethod::OriginalPayment,
                store_credit_code: None,
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_rows_are_polled_immediately() {
        let now = time::OffsetDateTime::now_utc();
        assert!(due_for_poll(0, None, now));
    }

    #[test]
    fn poll_interval_escalates_with_attempts() {
        let now = time::OffsetDateTime::now_utc();
        let two_min_ago = now - time::Duration::minutes(2);
        assert!(due_for_poll(0, Some(two_min_ago), now));
        assert!(!due_for_poll(4, Some(two_min_ago), now));
        let ten_min_ago = now - time::Duration::minutes(10);
        assert!(due_for_poll(4, Some(ten_min_ago), now));
        assert!(!due_for_poll(9, Some(ten_min_ago), now));
        let hour_ago = now - time::Duration::hours(1);
        assert!(due_for_poll(9, Some(hour_ago), now));
    }
}
