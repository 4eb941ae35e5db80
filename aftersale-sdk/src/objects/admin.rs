//! Admin API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ComplaintKind, ComplaintStatus, PaymentMethod, RefundMethod, RefundState, ResolutionKind,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Query string of `GET /admin/complaints`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListComplaintsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<ComplaintStatus>,
    pub kind: Option<ComplaintKind>,
    pub order_id: Option<Uuid>,
}

/// Body of `POST /admin/complaints/{id}/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveComplaintRequest {
    pub resolution: ResolutionKind,
    #[serde(default)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full complaint detail for the admin console, including the fields the
/// customer-facing view omits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminComplaintResponse {
    pub complaint_id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub kind: ComplaintKind,
    pub status: ComplaintStatus,
    pub resolution: ResolutionKind,
    pub payment_method: PaymentMethod,
    pub refund_method: Option<RefundMethod>,
    pub refund_state: RefundState,
    pub refund_amount: Option<Decimal>,
    pub gateway_reference: Option<String>,
    pub reconcile_attempts: i32,
    pub store_credit_code: Option<String>,
    pub apology_credit_code: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Clamp user-supplied pagination to sane bounds.
pub fn clamp_pagination(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_to_bounds() {
        assert_eq!(clamp_pagination(None, None), (50, 0));
        assert_eq!(clamp_pagination(Some(0), Some(-3)), (1, 0));
        assert_eq!(clamp_pagination(Some(10_000), Some(20)), (200, 20));
    }
}
