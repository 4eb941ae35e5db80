//! Event type definitions for the mail fan-out.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::RefundMethod;

/// What a one-time code is gating, for the email template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    OrderCancellation,
    PasswordReset,
}

/// A transactional email to be rendered and sent by the mailer.
///
/// Events carry the data to render, not pre-rendered bodies, so the
/// templates live in one place (the mailer).
#[derive(Debug, Clone)]
pub enum MailEvent {
    /// A one-time code. The only channel the plaintext code travels on.
    OtpCode {
        to: String,
        code: String,
        purpose: OtpPurpose,
        expires_minutes: i64,
    },
    /// Acknowledgement that a complaint was recorded.
    ComplaintReceived { to: String, order_id: Uuid },
    /// Apology store credit issued at intake for a not-received report.
    ApologyCredit {
        to: String,
        code: String,
        amount: Decimal,
    },
    /// The order was cancelled after OTP verification.
    OrderCancelled {
        to: String,
        order_id: Uuid,
        refund_pending: bool,
    },
    /// A refund finished paying out.
    RefundCompleted {
        to: String,
        order_id: Uuid,
        amount: Decimal,
        method: RefundMethod,
        /// Present for store-credit refunds.
        store_credit_code: Option<String>,
    },
    /// Staff broadcast, mirrored from the bulk in-app notification.
    Broadcast {
        to: String,
        subject: String,
        body: String,
    },
}
