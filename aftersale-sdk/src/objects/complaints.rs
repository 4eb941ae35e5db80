//! Complaint intake and refund-selection request/response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ComplaintKind, ComplaintStatus, RefundMethod, RefundState, ResolutionKind};

/// Body of `POST /orders/{order_id}/complaints`.
///
/// Photo/description completeness is a caller-side concern; the server
/// only records what it is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIssueRequest {
    pub kind: ComplaintKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /complaints/{id}/refund-method` and
/// `POST /refund-requests/{id}/refund-method`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRefundMethodRequest {
    pub method: RefundMethod,
}

/// Public view of a complaint, returned by intake and polling endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintResponse {
    pub complaint_id: Uuid,
    pub order_id: Uuid,
    pub kind: ComplaintKind,
    pub status: ComplaintStatus,
    pub resolution: ResolutionKind,
    pub refund_method: Option<RefundMethod>,
    pub refund_state: RefundState,
    pub refund_amount: Option<Decimal>,
    /// Store credit issued as the refund, if that method was chosen.
    pub store_credit_code: Option<String>,
    /// Apology credit issued at intake for not-received reports.
    pub apology_credit_code: Option<String>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

/// Public view of a cancellation-driven refund request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequestResponse {
    pub refund_request_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub method: Option<RefundMethod>,
    pub state: RefundState,
    pub store_credit_code: Option<String>,
    pub created_at: i64,
}
