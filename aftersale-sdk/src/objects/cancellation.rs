//! OTP-gated order cancellation types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// Body of `POST /orders/{order_id}/cancellation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCancellationCode {
    /// Free-form reason shown to staff, e.g. "Changed my mind".
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response to a code request. The code itself only travels by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationCodeIssued {
    pub order_id: Uuid,
    /// Seconds until the emailed code expires.
    pub expires_in_secs: i64,
}

/// Body of `POST /orders/{order_id}/cancellation/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmCancellationRequest {
    /// The 6-digit code from the email.
    pub code: String,
}

/// Successful cancellation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationConfirmed {
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// Present iff the order was prepaid: the refund request now awaiting
    /// the customer's method selection.
    pub refund_request_id: Option<Uuid>,
}
