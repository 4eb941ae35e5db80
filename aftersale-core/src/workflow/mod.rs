//! After-sales workflows: complaint intake, OTP-gated cancellation, and
//! the refund resolution saga.
//!
//! The routing decision is pure and lives here; the submodules apply it
//! against the database and the outbound integrations.

pub mod cancellation;
pub mod intake;
pub mod notify;
pub mod resolution;

use crate::entities::{PaymentMethod, RefundMethod, RefundState};

/// Payout channel a dispatched refund goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundRoute {
    /// Mint a gift card for the refund amount.
    StoreCredit,
    /// Signed refund command against the payment gateway.
    Gateway,
    /// Manual bank payout, completed later by staff.
    ManualBank,
}

/// What the resolver should do with a refund trigger.
///
/// Triggers arrive more than once (webhook retries, duplicate clicks,
/// user selection racing a webhook); the persisted `RefundState` is the
/// step marker that collapses repeats into no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The refund already completed or failed; nothing to do.
    AlreadyFinal,
    /// A dispatch is in flight; the reconciler owns it now.
    InFlight,
    /// Prepaid order, no method chosen yet; park and ask the customer.
    AwaitSelection,
    Dispatch(RefundRoute),
}

/// Decide how to act on a refund trigger.
///
/// COD orders always route to store credit: nothing was charged, so
/// there is no payment to send money back to, whatever the customer
/// picked.
pub fn route_refund(
    payment_method: PaymentMethod,
    chosen: Option<RefundMethod>,
    state: RefundState,
) -> RouteDecision {
    if state.is_final() {
        return RouteDecision::AlreadyFinal;
    }
    if state == RefundState::Processing {
        return RouteDecision::InFlight;
    }
    if !payment_method.is_prepaid() {
        return RouteDecision::Dispatch(RefundRoute::StoreCredit);
    }
    match chosen {
        None => RouteDecision::AwaitSelection,
        Some(RefundMethod::StoreCredit) => RouteDecision::Dispatch(RefundRoute::StoreCredit),
        Some(RefundMethod::OriginalPayment) => RouteDecision::Dispatch(RefundRoute::Gateway),
        Some(RefundMethod::BankTransfer) => RouteDecision::Dispatch(RefundRoute::ManualBank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cod_always_routes_to_store_credit() {
        // Even an explicit original-payment selection cannot reach the
        // gateway when nothing was charged.
        for chosen in [
            None,
            Some(RefundMethod::StoreCredit),
            Some(RefundMethod::OriginalPayment),
            Some(RefundMethod::BankTransfer),
        ] {
            assert_eq!(
                route_refund(PaymentMethod::Cod, chosen, RefundState::PendingUserSelection),
                RouteDecision::Dispatch(RefundRoute::StoreCredit)
            );
        }
    }

    #[test]
    fn terminal_states_short_circuit() {
        for state in [RefundState::Completed, RefundState::Failed] {
            assert_eq!(
                route_refund(
                    PaymentMethod::Upi,
                    Some(RefundMethod::StoreCredit),
                    state
                ),
                RouteDecision::AlreadyFinal
            );
        }
    }

    #[test]
    fn in_flight_refunds_are_not_redispatched() {
        assert_eq!(
            route_refund(
                PaymentMethod::Card,
                Some(RefundMethod::OriginalPayment),
                RefundState::Processing
            ),
            RouteDecision::InFlight
        );
    }

    #[test]
    fn prepaid_without_selection_waits_for_the_customer() {
        assert_eq!(
            route_refund(PaymentMethod::Upi, None, RefundState::None),
            RouteDecision::AwaitSelection
        );
        assert_eq!(
            route_refund(
                PaymentMethod::Netbanking,
                None,
                RefundState::PendingUserSelection
            ),
            RouteDecision::AwaitSelection
        );
    }

    #[test]
    fn chosen_method_maps_to_its_route() {
        let state = RefundState::PendingUserSelection;
        assert_eq!(
            route_refund(PaymentMethod::Upi, Some(RefundMethod::StoreCredit), state),
            RouteDecision::Dispatch(RefundRoute::StoreCredit)
        );
        assert_eq!(
            route_refund(PaymentMethod::Card, Some(RefundMethod::OriginalPayment), state),
            RouteDecision::Dispatch(RefundRoute::Gateway)
        );
        assert_eq!(
            route_refund(PaymentMethod::Upi, Some(RefundMethod::BankTransfer), state),
            RouteDecision::Dispatch(RefundRoute::ManualBank)
        );
    }
}
