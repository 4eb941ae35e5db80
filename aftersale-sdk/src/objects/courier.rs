//! Inbound courier webhook payload.
//!
//! The courier aggregator posts status changes for shipments it carries.
//! Events are matched to orders by the `shipment_id` the aggregator
//! assigned when the shipment was booked; the order table carries that id
//! as an explicit column, so no free-text matching is involved.

use serde::{Deserialize, Serialize};

/// Shipment status values the workflow reacts to.
///
/// `#[serde(other)]` swallows event names this version does not know, so
/// new courier statuses degrade to a logged no-op instead of a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourierEventKind {
    InTransit,
    Delivered,
    ReturnPickedUp,
    ReturnReceived,
    #[serde(other)]
    Unknown,
}

/// Body of `POST /webhooks/courier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierWebhookPayload {
    /// Aggregator-assigned shipment id (matches `orders.shipment_id`).
    pub shipment_id: String,
    /// Airway bill / tracking number, informational only.
    #[serde(default)]
    pub awb: Option<String>,
    pub event: CourierEventKind,
    /// Unix timestamp of the status change at the courier.
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_event() {
        let payload: CourierWebhookPayload = serde_json::from_str(
            r#"{"shipment_id":"SHP-991","awb":"AWB123456","event":"return_received"}"#,
        )
        .unwrap();
        assert_eq!(payload.event, CourierEventKind::ReturnReceived);
        assert_eq!(payload.awb.as_deref(), Some("AWB123456"));
    }

    #[test]
    fn unknown_event_degrades_instead_of_failing() {
        let payload: CourierWebhookPayload = serde_json::from_str(
            r#"{"shipment_id":"SHP-1","event":"out_for_delivery_second_attempt"}"#,
        )
        .unwrap();
        assert_eq!(payload.event, CourierEventKind::Unknown);
    }
}
