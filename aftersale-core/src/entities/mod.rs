pub mod complaints;
pub mod gift_cards;
pub mod notifications;
pub mod orders;
pub mod otp_codes;
pub mod refund_requests;
pub mod users;

use aftersale_sdk::objects as sdk;

/// Payment method for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `aftersale_sdk::objects::PaymentMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "payment_method")]
pub enum PaymentMethod {
    Cod,
    Upi,
    Card,
    Netbanking,
}

impl PaymentMethod {
    /// Whether money moved through the payment gateway at checkout.
    pub fn is_prepaid(self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

impl From<PaymentMethod> for sdk::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cod => sdk::PaymentMethod::Cod,
            PaymentMethod::Upi => sdk::PaymentMethod::Upi,
            PaymentMethod::Card => sdk::PaymentMethod::Card,
            PaymentMethod::Netbanking => sdk::PaymentMethod::Netbanking,
        }
    }
}

impl From<sdk::PaymentMethod> for PaymentMethod {
    fn from(value: sdk::PaymentMethod) -> Self {
        match value {
            sdk::PaymentMethod::Cod => PaymentMethod::Cod,
            sdk::PaymentMethod::Upi => PaymentMethod::Upi,
            sdk::PaymentMethod::Card => PaymentMethod::Card,
            sdk::PaymentMethod::Netbanking => PaymentMethod::Netbanking,
        }
    }
}

/// Payment status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl From<PaymentStatus> for sdk::PaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => sdk::PaymentStatus::Pending,
            PaymentStatus::Paid => sdk::PaymentStatus::Paid,
            PaymentStatus::Refunded => sdk::PaymentStatus::Refunded,
            PaymentStatus::Failed => sdk::PaymentStatus::Failed,
        }
    }
}

/// Order status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "order_status")]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Cancellation is only offered before the parcel leaves the warehouse.
    pub fn is_cancellable(self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Processing)
    }
}

impl From<OrderStatus> for sdk::OrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Placed => sdk::OrderStatus::Placed,
            OrderStatus::Processing => sdk::OrderStatus::Processing,
            OrderStatus::Shipped => sdk::OrderStatus::Shipped,
            OrderStatus::Delivered => sdk::OrderStatus::Delivered,
            OrderStatus::Cancelled => sdk::OrderStatus::Cancelled,
        }
    }
}

/// Complaint kind for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "complaint_kind")]
pub enum ComplaintKind {
    NotReceived,
    Damaged,
    ReturnRequest,
    Replacement,
}

impl From<ComplaintKind> for sdk::ComplaintKind {
    fn from(value: ComplaintKind) -> Self {
        match value {
            ComplaintKind::NotReceived => sdk::ComplaintKind::NotReceived,
            ComplaintKind::Damaged => sdk::ComplaintKind::Damaged,
            ComplaintKind::ReturnRequest => sdk::ComplaintKind::ReturnRequest,
            ComplaintKind::Replacement => sdk::ComplaintKind::Replacement,
        }
    }
}

impl From<sdk::ComplaintKind> for ComplaintKind {
    fn from(value: sdk::ComplaintKind) -> Self {
        match value {
            sdk::ComplaintKind::NotReceived => ComplaintKind::NotReceived,
            sdk::ComplaintKind::Damaged => ComplaintKind::Damaged,
            sdk::ComplaintKind::ReturnRequest => ComplaintKind::ReturnRequest,
            sdk::ComplaintKind::Replacement => ComplaintKind::Replacement,
        }
    }
}

/// Complaint status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "complaint_status")]
pub enum ComplaintStatus {
    Investigating,
    AwaitingRefundSelection,
    Resolved,
    Closed,
}

impl ComplaintStatus {
    pub fn is_open(self) -> bool {
        matches!(
            self,
            ComplaintStatus::Investigating | ComplaintStatus::AwaitingRefundSelection
        )
    }
}

impl From<ComplaintStatus> for sdk::ComplaintStatus {
    fn from(value: ComplaintStatus) -> Self {
        match value {
            ComplaintStatus::Investigating => sdk::ComplaintStatus::Investigating,
            ComplaintStatus::AwaitingRefundSelection => sdk::ComplaintStatus::AwaitingRefundSelection,
            ComplaintStatus::Resolved => sdk::ComplaintStatus::Resolved,
            ComplaintStatus::Closed => sdk::ComplaintStatus::Closed,
        }
    }
}

impl From<sdk::ComplaintStatus> for ComplaintStatus {
    fn from(value: sdk::ComplaintStatus) -> Self {
        match value {
            sdk::ComplaintStatus::Investigating => ComplaintStatus::Investigating,
            sdk::ComplaintStatus::AwaitingRefundSelection => ComplaintStatus::AwaitingRefundSelection,
            sdk::ComplaintStatus::Resolved => ComplaintStatus::Resolved,
            sdk::ComplaintStatus::Closed => ComplaintStatus::Closed,
        }
    }
}

/// Resolution kind for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "resolution_kind")]
pub enum ResolutionKind {
    None,
    Refund,
    Replacement,
}

impl From<ResolutionKind> for sdk::ResolutionKind {
    fn from(value: ResolutionKind) -> Self {
        match value {
            ResolutionKind::None => sdk::ResolutionKind::None,
            ResolutionKind::Refund => sdk::ResolutionKind::Refund,
            ResolutionKind::Replacement => sdk::ResolutionKind::Replacement,
        }
    }
}

impl From<sdk::ResolutionKind> for ResolutionKind {
    fn from(value: sdk::ResolutionKind) -> Self {
        match value {
            sdk::ResolutionKind::None => ResolutionKind::None,
            sdk::ResolutionKind::Refund => ResolutionKind::Refund,
            sdk::ResolutionKind::Replacement => ResolutionKind::Replacement,
        }
    }
}

/// Refund method for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "refund_method")]
pub enum RefundMethod {
    StoreCredit,
    OriginalPayment,
    BankTransfer,
}

impl From<RefundMethod> for sdk::RefundMethod {
    fn from(value: RefundMethod) -> Self {
        match value {
            RefundMethod::StoreCredit => sdk::RefundMethod::StoreCredit,
            RefundMethod::OriginalPayment => sdk::RefundMethod::OriginalPayment,
            RefundMethod::BankTransfer => sdk::RefundMethod::BankTransfer,
        }
    }
}

impl From<sdk::RefundMethod> for RefundMethod {
    fn from(value: sdk::RefundMethod) -> Self {
        match value {
            sdk::RefundMethod::StoreCredit => RefundMethod::StoreCredit,
            sdk::RefundMethod::OriginalPayment => RefundMethod::OriginalPayment,
            sdk::RefundMethod::BankTransfer => RefundMethod::BankTransfer,
        }
    }
}

/// Refund state for database operations.
///
/// Persisted step marker of the refund saga; see
/// `aftersale_sdk::objects::RefundState` for the wire version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "refund_state")]
pub enum RefundState {
    None,
    PendingUserSelection,
    Processing,
    Completed,
    Failed,
}

impl RefundState {
    pub fn is_final(self) -> bool {
        matches!(self, RefundState::Completed | RefundState::Failed)
    }
}

impl From<RefundState> for sdk::RefundState {
    fn from(value: RefundState) -> Self {
        match value {
            RefundState::None => sdk::RefundState::None,
            RefundState::PendingUserSelection => sdk::RefundState::PendingUserSelection,
            RefundState::Processing => sdk::RefundState::Processing,
            RefundState::Completed => sdk::RefundState::Completed,
            RefundState::Failed => sdk::RefundState::Failed,
        }
    }
}

/// Notification kind for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "notification_kind")]
pub enum NotificationKind {
    Order,
    Complaint,
    Refund,
    Broadcast,
    Security,
}

impl From<NotificationKind> for sdk::NotificationKind {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Order => sdk::NotificationKind::Order,
            NotificationKind::Complaint => sdk::NotificationKind::Complaint,
            NotificationKind::Refund => sdk::NotificationKind::Refund,
            NotificationKind::Broadcast => sdk::NotificationKind::Broadcast,
            NotificationKind::Security => sdk::NotificationKind::Security,
        }
    }
}

impl From<sdk::NotificationKind> for NotificationKind {
    fn from(value: sdk::NotificationKind) -> Self {
        match value {
            sdk::NotificationKind::Order => NotificationKind::Order,
            sdk::NotificationKind::Complaint => NotificationKind::Complaint,
            sdk::NotificationKind::Refund => NotificationKind::Refund,
            sdk::NotificationKind::Broadcast => NotificationKind::Broadcast,
            sdk::NotificationKind::Security => NotificationKind::Security,
        }
    }
}

/// User role for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "user_role")]
pub enum UserRole {
    Customer,
    Staff,
    SuperAdmin,
}

impl UserRole {
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Staff | UserRole::SuperAdmin)
    }
}

impl From<UserRole> for sdk::UserRole {
    fn from(value: UserRole) -> Self {
        match value {
            UserRole::Customer => sdk::UserRole::Customer,
            UserRole::Staff => sdk::UserRole::Staff,
            UserRole::SuperAdmin => sdk::UserRole::SuperAdmin,
        }
    }
}

/// Why a gift card was minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "gift_card_source")]
pub enum GiftCardSource {
    Refund,
    Apology,
}

/// Scope of a one-time code: what sensitive transition it gates.
///
/// The scope is part of the keyed hash, so a cancellation code can never
/// be replayed against a password reset and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "otp_scope")]
pub enum OtpScope {
    OrderCancellation,
    PasswordReset,
}

impl OtpScope {
    /// Stable tag mixed into the keyed code hash.
    pub fn tag(self) -> &'static str {
        match self {
            OtpScope::OrderCancellation => "order_cancellation",
            OtpScope::PasswordReset => "password_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_window_closes_at_shipment() {
        assert!(OrderStatus::Placed.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn only_cod_is_not_prepaid() {
        assert!(!PaymentMethod::Cod.is_prepaid());
        for m in [
            PaymentMethod::Upi,
            PaymentMethod::Card,
            PaymentMethod::Netbanking,
        ] {
            assert!(m.is_prepaid());
        }
    }
}
