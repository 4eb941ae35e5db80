//! Shared API objects for all Aftersale endpoints.
//!
//! Every loosely-typed string field of the workflow (payment method,
//! refund method, complaint lifecycle, …) is a closed enum here so that
//! both the server and integrators match exhaustively instead of
//! sniffing substrings.

pub mod admin;
pub mod auth;
pub mod cancellation;
pub mod complaints;
pub mod courier;
pub mod notifications;

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Staff,
    SuperAdmin,
}

/// How the order was paid at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery — nothing was charged electronically.
    Cod,
    Upi,
    Card,
    Netbanking,
}

impl PaymentMethod {
    /// Whether money actually moved through the payment gateway.
    pub fn is_prepaid(self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// What the customer reported about the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintKind {
    NotReceived,
    Damaged,
    ReturnRequest,
    Replacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Investigating,
    AwaitingRefundSelection,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    None,
    Refund,
    Replacement,
}

/// The customer's chosen channel for receiving money back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    StoreCredit,
    OriginalPayment,
    BankTransfer,
}

/// Lifecycle of a single refund, persisted as a step marker so that a
/// retried trigger can short-circuit instead of paying out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundState {
    None,
    PendingUserSelection,
    Processing,
    Completed,
    Failed,
}

impl RefundState {
    /// Terminal states: nothing may be dispatched again.
    pub fn is_final(self) -> bool {
        matches!(self, RefundState::Completed | RefundState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Complaint,
    Refund,
    Broadcast,
    Security,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_prepaid_split() {
        assert!(!PaymentMethod::Cod.is_prepaid());
        assert!(PaymentMethod::Upi.is_prepaid());
        assert!(PaymentMethod::Card.is_prepaid());
        assert!(PaymentMethod::Netbanking.is_prepaid());
    }

    #[test]
    fn refund_state_finality() {
        assert!(RefundState::Completed.is_final());
        assert!(RefundState::Failed.is_final());
        assert!(!RefundState::Processing.is_final());
        assert!(!RefundState::PendingUserSelection.is_final());
    }

    #[test]
    fn enums_use_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&RefundMethod::StoreCredit).unwrap(),
            "\"store_credit\""
        );
        assert_eq!(
            serde_json::to_string(&ComplaintKind::NotReceived).unwrap(),
            "\"not_received\""
        );
        let parsed: ComplaintStatus =
            serde_json::from_str("\"awaiting_refund_selection\"").unwrap();
        assert_eq!(parsed, ComplaintStatus::AwaitingRefundSelection);
    }
}
