//! Refund resolution saga.
//!
//! Every transition locks the complaint or refund-request row, re-reads
//! the persisted refund state, and routes through
//! [`route_refund`](super::route_refund). Gateway dispatch commits the
//! `processing` marker before the external call, so a crash between the
//! commit and the call leaves a row the reconciler can settle instead of
//! a double payment.

use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use aftersale_sdk::gateway::RefundAck;

use crate::courier::CourierClient;
use crate::credit;
use crate::entities::complaints::{FindOpenComplaintForOrder, GetComplaintById, OrderComplaint};
use crate::entities::gift_cards::{GiftCard, NewGiftCard};
use crate::entities::orders::Order;
use crate::entities::refund_requests::{GetRefundRequestById, RefundRequest};
use crate::entities::{
    ComplaintStatus, GiftCardSource, NotificationKind, PaymentStatus, RefundMethod, RefundState,
    ResolutionKind,
};
use crate::events::{MailEvent, MailEventSender};
use crate::framework::DatabaseProcessor;
use crate::gateway::GatewayClient;
use crate::workflow::{RefundRoute, RouteDecision, notify, route_refund};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Also covers complaints owned by someone else.
    #[error("complaint not found")]
    ComplaintNotFound,

    /// Also covers refund requests owned by someone else.
    #[error("refund request not found")]
    RefundRequestNotFound,

    /// A method was selected but no refund is awaiting one.
    #[error("no refund is awaiting a method selection")]
    SelectionNotPending,

    /// Original-payment refund requested, but the order never went
    /// through the gateway.
    #[error("no payment was captured for this order")]
    NothingCharged,

    /// Mark-refunded called on something other than a pending manual
    /// bank payout.
    #[error("refund is not awaiting a manual payout")]
    NotAwaitingManualPayout,
}

/// The saga executor: database plus the outbound integrations it drives.
#[derive(Clone)]
pub struct RefundWorkflow {
    pub pool: PgPool,
    pub gateway: GatewayClient,
    pub courier: CourierClient,
    pub mail_tx: MailEventSender,
}

impl RefundWorkflow {
    // -- customer selection -------------------------------------------------

    /// Apply the customer's refund-method choice to a complaint.
    pub async fn select_complaint_method(
        &self,
        complaint_id: Uuid,
        user_id: Uuid,
        method: RefundMethod,
    ) -> Result<OrderComplaint, ResolutionError> {
        let mut tx = self.pool.begin().await?;
        let complaint = OrderComplaint::lock_tx(&mut tx, complaint_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(ResolutionError::ComplaintNotFound)?;
        let order = Order::lock_tx(&mut tx, complaint.order_id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;

        if complaint.refund_state == RefundState::None {
            return Err(ResolutionError::SelectionNotPending);
        }

        match route_refund(order.payment_method, Some(method), complaint.refund_state) {
            RouteDecision::AlreadyFinal | RouteDecision::InFlight => {
                // Duplicate click; the first one won.
                drop(tx);
            }
            RouteDecision::AwaitSelection => return Err(ResolutionError::SelectionNotPending),
            RouteDecision::Dispatch(route) => {
                let amount = complaint.refund_amount.unwrap_or(order.total);
                self.dispatch_complaint(tx, &complaint, &order, route, amount)
                    .await?;
            }
        }
        self.reload_complaint(complaint_id).await
    }

    /// Apply the customer's refund-method choice to a cancellation
    /// refund request.
    pub async fn select_request_method(
        &self,
        refund_request_id: Uuid,
        user_id: Uuid,
        method: RefundMethod,
    ) -> Result<RefundRequest, ResolutionError> {
        let mut tx = self.pool.begin().await?;
        let request = RefundRequest::lock_tx(&mut tx, refund_request_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or(ResolutionError::RefundRequestNotFound)?;
        let order = Order::lock_tx(&mut tx, request.order_id)
            .await?
            .ok_or(ResolutionError::RefundRequestNotFound)?;

        match route_refund(order.payment_method, Some(method), request.state) {
            RouteDecision::AlreadyFinal | RouteDecision::InFlight => drop(tx),
            RouteDecision::AwaitSelection => return Err(ResolutionError::SelectionNotPending),
            RouteDecision::Dispatch(route) => {
                self.dispatch_request(tx, &request, &order, route).await?;
            }
        }
        self.reload_request(refund_request_id).await
    }

    // -- staff decisions ----------------------------------------------------

    /// Record the staff resolution for a complaint. Resolving an
    /// already-closed complaint is a no-op.
    pub async fn resolve_complaint(
        &self,
        complaint_id: Uuid,
        resolution: ResolutionKind,
        note: Option<&str>,
    ) -> Result<OrderComplaint, ResolutionError> {
        let mut tx = self.pool.begin().await?;
        let complaint = OrderComplaint::lock_tx(&mut tx, complaint_id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;

        if !complaint.status.is_open() {
            drop(tx);
            return self.reload_complaint(complaint_id).await;
        }

        let order = Order::lock_tx(&mut tx, complaint.order_id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;

        match resolution {
            ResolutionKind::Refund => {
                OrderComplaint::set_resolution_tx(&mut tx, complaint_id, ResolutionKind::Refund)
                    .await?;
                let amount = complaint.refund_amount.unwrap_or(order.total);
                match route_refund(
                    order.payment_method,
                    complaint.refund_method,
                    complaint.refund_state,
                ) {
                    RouteDecision::AlreadyFinal | RouteDecision::InFlight => {
                        tx.commit().await?;
                    }
                    RouteDecision::AwaitSelection => {
                        OrderComplaint::park_awaiting_selection_tx(&mut tx, complaint_id, amount)
                            .await?;
                        tx.commit().await?;
                        self.ask_for_selection(complaint.user_id, complaint_id, note)
                            .await?;
                    }
                    RouteDecision::Dispatch(route) => {
                        self.dispatch_complaint(tx, &complaint, &order, route, amount)
                            .await?;
                    }
                }
            }
            ResolutionKind::Replacement => {
                OrderComplaint::mark_resolved_tx(
                    &mut tx,
                    complaint_id,
                    ResolutionKind::Replacement,
                    ComplaintStatus::Resolved,
                )
                .await?;
                tx.commit().await?;
                self.schedule_replacement_pickup(&order).await;
                notify::notify(
                    &self.pool,
                    complaint.user_id,
                    "Replacement approved",
                    &with_note(
                        &format!(
                            "We're sending a replacement for order {}. A return pickup \
                             will be scheduled for the original item.",
                            complaint.order_id
                        ),
                        note,
                    ),
                    NotificationKind::Complaint,
                    None,
                )
                .await?;
            }
            ResolutionKind::None => {
                OrderComplaint::mark_resolved_tx(
                    &mut tx,
                    complaint_id,
                    ResolutionKind::None,
                    ComplaintStatus::Closed,
                )
                .await?;
                tx.commit().await?;
                notify::notify(
                    &self.pool,
                    complaint.user_id,
                    "Report closed",
                    &with_note(
                        &format!(
                            "Your report for order {} has been closed.",
                            complaint.order_id
                        ),
                        note,
                    ),
                    NotificationKind::Complaint,
                    None,
                )
                .await?;
            }
        }
        self.reload_complaint(complaint_id).await
    }

    /// Complete a manual bank-transfer payout on a complaint.
    pub async fn mark_complaint_refunded(
        &self,
        complaint_id: Uuid,
    ) -> Result<OrderComplaint, ResolutionError> {
        let mut tx = self.pool.begin().await?;
        let complaint = OrderComplaint::lock_tx(&mut tx, complaint_id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;
        if complaint.refund_state == RefundState::Completed {
            drop(tx);
            return self.reload_complaint(complaint_id).await;
        }
        if complaint.refund_state != RefundState::Processing
            || complaint.refund_method != Some(RefundMethod::BankTransfer)
        {
            return Err(ResolutionError::NotAwaitingManualPayout);
        }
        let order = Order::lock_tx(&mut tx, complaint.order_id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;

        OrderComplaint::mark_completed_tx(&mut tx, complaint_id, None, None).await?;
        if order.payment_status == PaymentStatus::Paid {
            Order::update_payment_status_tx(&mut tx, order.id, PaymentStatus::Refunded).await?;
        }
        tx.commit().await?;

        let amount = complaint.refund_amount.unwrap_or(order.total);
        self.announce_completed(
            complaint.user_id,
            complaint.order_id,
            amount,
            RefundMethod::BankTransfer,
            None,
        )
        .await?;
        self.reload_complaint(complaint_id).await
    }

    /// Complete a manual bank-transfer payout on a refund request.
    pub async fn mark_request_refunded(
        &self,
        refund_request_id: Uuid,
    ) -> Result<RefundRequest, ResolutionError> {
        let mut tx = self.pool.begin().await?;
        let request = RefundRequest::lock_tx(&mut tx, refund_request_id)
            .await?
            .ok_or(ResolutionError::RefundRequestNotFound)?;
        if request.state == RefundState::Completed {
            drop(tx);
            return self.reload_request(refund_request_id).await;
        }
        if request.state != RefundState::Processing
            || request.method != Some(RefundMethod::BankTransfer)
        {
            return Err(ResolutionError::NotAwaitingManualPayout);
        }
        let order = Order::lock_tx(&mut tx, request.order_id)
            .await?
            .ok_or(ResolutionError::RefundRequestNotFound)?;

        RefundRequest::mark_completed_tx(&mut tx, refund_request_id, None, None).await?;
        if order.payment_status == PaymentStatus::Paid {
            Order::update_payment_status_tx(&mut tx, order.id, PaymentStatus::Refunded).await?;
        }
        tx.commit().await?;

        self.announce_completed(
            request.user_id,
            request.order_id,
            request.amount,
            RefundMethod::BankTransfer,
            None,
        )
        .await?;
        self.reload_request(refund_request_id).await
    }

    // -- courier trigger ----------------------------------------------------

    /// React to the courier confirming a returned parcel reached the
    /// warehouse. Retries of the same webhook collapse into no-ops.
    pub async fn handle_return_received(&self, order: &Order) -> Result<(), ResolutionError> {
        let processor = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        let Some(open) = processor
            .process(FindOpenComplaintForOrder { order_id: order.id })
            .await?
        else {
            info!(order_id = %order.id, "Return received with no open complaint, ignoring");
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        let Some(complaint) = OrderComplaint::lock_tx(&mut tx, open.id).await? else {
            return Ok(());
        };
        let order = Order::lock_tx(&mut tx, order.id)
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)?;
        let amount = complaint.refund_amount.unwrap_or(order.total);

        match route_refund(
            order.payment_method,
            complaint.refund_method,
            complaint.refund_state,
        ) {
            RouteDecision::AlreadyFinal | RouteDecision::InFlight => drop(tx),
            RouteDecision::AwaitSelection => {
                OrderComplaint::park_awaiting_selection_tx(&mut tx, complaint.id, amount).await?;
                tx.commit().await?;
                self.ask_for_selection(complaint.user_id, complaint.id, None)
                    .await?;
            }
            RouteDecision::Dispatch(route) => {
                self.dispatch_complaint(tx, &complaint, &order, route, amount)
                    .await?;
            }
        }
        Ok(())
    }

    // -- dispatch -----------------------------------------------------------

    async fn dispatch_complaint(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        complaint: &OrderComplaint,
        order: &Order,
        route: RefundRoute,
        amount: Decimal,
    ) -> Result<(), ResolutionError> {
        match route {
            RefundRoute::StoreCredit => {
                OrderComplaint::mark_processing_tx(
                    &mut tx,
                    complaint.id,
                    RefundMethod::StoreCredit,
                    amount,
                )
                .await?;
                let code = credit::generate_code();
                GiftCard::insert_tx(
                    &mut tx,
                    NewGiftCard {
                        user_id: complaint.user_id,
                        code: code.clone(),
                        amount,
                        source: GiftCardSource::Refund,
                        complaint_id: Some(complaint.id),
                        refund_request_id: None,
                        expires_at: credit::expiry_from_now(),
                    },
                )
                .await?;
                OrderComplaint::mark_completed_tx(&mut tx, complaint.id, Some(&code), None)
                    .await?;
                if order.payment_status == PaymentStatus::Paid {
                    Order::update_payment_status_tx(&mut tx, order.id, PaymentStatus::Refunded)
                        .await?;
                }
                tx.commit().await?;
                self.announce_completed(
                    complaint.user_id,
                    complaint.order_id,
                    amount,
                    RefundMethod::StoreCredit,
                    Some(code),
                )
                .await?;
            }
            RefundRoute::Gateway => {
                let Some(transaction_id) = order.gateway_transaction_id.clone() else {
                    return Err(ResolutionError::NothingCharged);
                };
                OrderComplaint::mark_processing_tx(
                    &mut tx,
                    complaint.id,
                    RefundMethod::OriginalPayment,
                    amount,
                )
                .await?;
                // Durable step marker first; the external call may not
                // come back.
                tx.commit().await?;
                self.submit_gateway_refund(
                    GatewayTarget::Complaint(complaint.id),
                    complaint.user_id,
                    order.id,
                    &transaction_id,
                    amount,
                )
                .await?;
            }
            RefundRoute::ManualBank => {
                OrderComplaint::mark_processing_tx(
                    &mut tx,
                    complaint.id,
                    RefundMethod::BankTransfer,
                    amount,
                )
                .await?;
                tx.commit().await?;
                self.announce_bank_transfer(complaint.user_id, amount).await?;
            }
        }
        Ok(())
    }

    async fn dispatch_request(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        request: &RefundRequest,
        order: &Order,
        route: RefundRoute,
    ) -> Result<(), ResolutionError> {
        match route {
            RefundRoute::StoreCredit => {
                RefundRequest::mark_processing_tx(&mut tx, request.id, RefundMethod::StoreCredit)
                    .await?;
                let code = credit::generate_code();
                GiftCard::insert_tx(
                    &mut tx,
                    NewGiftCard {
                        user_id: request.user_id,
                        code: code.clone(),
                        amount: request.amount,
                        source: GiftCardSource::Refund,
                        complaint_id: None,
                        refund_request_id: Some(request.id),
                        expires_at: credit::expiry_from_now(),
                    },
                )
                .await?;
                RefundRequest::mark_completed_tx(&mut tx, request.id, Some(&code), None).await?;
                if order.payment_status == PaymentStatus::Paid {
                    Order::update_payment_status_tx(&mut tx, order.id, PaymentStatus::Refunded)
                        .await?;
                }
                tx.commit().await?;
                self.announce_completed(
                    request.user_id,
                    request.order_id,
                    request.amount,
                    RefundMethod::StoreCredit,
                    Some(code),
                )
                .await?;
            }
            RefundRoute::Gateway => {
                let Some(transaction_id) = order.gateway_transaction_id.clone() else {
                    return Err(ResolutionError::NothingCharged);
                };
                RefundRequest::mark_processing_tx(
                    &mut tx,
                    request.id,
                    RefundMethod::OriginalPayment,
                )
                .await?;
                tx.commit().await?;
                self.submit_gateway_refund(
                    GatewayTarget::Request(request.id),
                    request.user_id,
                    order.id,
                    &transaction_id,
                    request.amount,
                )
                .await?;
            }
            RefundRoute::ManualBank => {
                RefundRequest::mark_processing_tx(&mut tx, request.id, RefundMethod::BankTransfer)
                    .await?;
                tx.commit().await?;
                self.announce_bank_transfer(request.user_id, request.amount)
                    .await?;
            }
        }
        Ok(())
    }

    /// Submit the refund command and apply whatever the gateway admits
    /// to. An ambiguous answer or transport failure changes nothing; the
    /// row stays in `processing` for the reconciler.
    async fn submit_gateway_refund(
        &self,
        target: GatewayTarget,
        user_id: Uuid,
        order_id: Uuid,
        transaction_id: &str,
        amount: Decimal,
    ) -> Result<(), ResolutionError> {
        match self.gateway.refund(transaction_id, amount).await {
            Ok(RefundAck::Accepted { reference }) => {
                let mut tx = self.pool.begin().await?;
                match target {
                    GatewayTarget::Complaint(id) => {
                        OrderComplaint::mark_completed_tx(&mut tx, id, None, Some(&reference))
                            .await?;
                    }
                    GatewayTarget::Request(id) => {
                        RefundRequest::mark_completed_tx(&mut tx, id, None, Some(&reference))
                            .await?;
                    }
                }
                Order::update_payment_status_tx(&mut tx, order_id, PaymentStatus::Refunded)
                    .await?;
                tx.commit().await?;
                self.announce_completed(
                    user_id,
                    order_id,
                    amount,
                    RefundMethod::OriginalPayment,
                    None,
                )
                .await?;
            }
            Ok(RefundAck::Rejected { reason }) => {
                warn!(?target, reason = %reason, "Gateway rejected refund");
                let mut tx = self.pool.begin().await?;
                match target {
                    GatewayTarget::Complaint(id) => {
                        OrderComplaint::mark_failed_tx(&mut tx, id).await?;
                    }
                    GatewayTarget::Request(id) => {
                        RefundRequest::mark_failed_tx(&mut tx, id).await?;
                    }
                }
                tx.commit().await?;
                notify::notify(
                    &self.pool,
                    user_id,
                    "Refund needs attention",
                    "We couldn't process your refund automatically. Our team will \
                     reach out to sort it out.",
                    NotificationKind::Refund,
                    None,
                )
                .await?;
            }
            Ok(RefundAck::Ambiguous) => {
                warn!(?target, "Ambiguous gateway response, leaving refund for reconciliation");
            }
            Err(e) => {
                warn!(?target, error = %e, "Gateway refund call failed, leaving refund for reconciliation");
            }
        }
        Ok(())
    }

    // -- fan-out helpers ----------------------------------------------------

    async fn announce_completed(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount: Decimal,
        method: RefundMethod,
        store_credit_code: Option<String>,
    ) -> Result<(), sqlx::Error> {
        let message = match &store_credit_code {
            Some(code) => format!(
                "Your refund of {amount} for order {order_id} was issued as store \
                 credit (code {code})."
            ),
            None => format!("Your refund of {amount} for order {order_id} has been processed."),
        };
        notify::notify(
            &self.pool,
            user_id,
            "Refund completed",
            &message,
            NotificationKind::Refund,
            None,
        )
        .await?;
        notify::email_user(&self.pool, &self.mail_tx, user_id, move |to| {
            MailEvent::RefundCompleted {
                to,
                order_id,
                amount,
                method,
                store_credit_code,
            }
        })
        .await
    }

    async fn announce_bank_transfer(
        &self,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        notify::notify(
            &self.pool,
            user_id,
            "Bank transfer initiated",
            &format!(
                "Your refund of {amount} will be transferred to your bank account \
                 within a few business days."
            ),
            NotificationKind::Refund,
            None,
        )
        .await
    }

    async fn ask_for_selection(
        &self,
        user_id: Uuid,
        complaint_id: Uuid,
        note: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        notify::notify(
            &self.pool,
            user_id,
            "Choose your refund method",
            &with_note(
                "Your refund has been approved. Please choose how you'd like to \
                 receive it: store credit, original payment method, or bank transfer.",
                note,
            ),
            NotificationKind::Refund,
            Some(&format!("/complaints/{complaint_id}")),
        )
        .await
    }

    async fn schedule_replacement_pickup(&self, order: &Order) {
        let Some(shipment_id) = order.shipment_id.as_deref() else {
            warn!(order_id = %order.id, "Replacement approved but order has no shipment id");
            return;
        };
        // Recorded, not retried inline; staff can rebook a failed pickup.
        if let Err(e) = self.courier.schedule_return_pickup(shipment_id).await {
            warn!(order_id = %order.id, error = %e, "Failed to schedule return pickup");
        }
    }

    async fn reload_complaint(&self, complaint_id: Uuid) -> Result<OrderComplaint, ResolutionError> {
        let processor = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        processor
            .process(GetComplaintById { complaint_id })
            .await?
            .ok_or(ResolutionError::ComplaintNotFound)
    }

    async fn reload_request(
        &self,
        refund_request_id: Uuid,
    ) -> Result<RefundRequest, ResolutionError> {
        let processor = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        processor
            .process(GetRefundRequestById { refund_request_id })
            .await?
            .ok_or(ResolutionError::RefundRequestNotFound)
    }
}

/// Which row a gateway refund belongs to, for the post-call bookkeeping.
#[derive(Debug, Clone, Copy)]
enum GatewayTarget {
    Complaint(Uuid),
    Request(Uuid),
}

fn with_note(message: &str, note: Option<&str>) -> String {
    match note {
        Some(note) if !note.trim().is_empty() => format!("{message} Note from support: {note}"),
        _ => message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_note_is_appended_when_present() {
        assert_eq!(with_note("Closed.", None), "Closed.");
        assert_eq!(with_note("Closed.", Some("  ")), "Closed.");
        assert_eq!(
            with_note("Closed.", Some("duplicate of an earlier report")),
            "Closed. Note from support: duplicate of an earlier report"
        );
    }
}
