//! Payment-gateway request signing and response interpretation.
//!
//! The gateway accepts form-encoded commands authenticated by a SHA-512
//! digest over pipe-joined fields:
//!
//! ```text
//! sign = sha512_hex("{merchant_id}|{command}|{transaction_id}|{amount}|{salt}")
//! ```
//!
//! The response shape is not documented by the provider. Interpretation
//! is deliberately conservative: only an explicit success marker with a
//! refund reference counts as accepted; everything else is either an
//! explicit rejection or [`RefundAck::Ambiguous`], which callers must
//! treat as "pending until reconciled", never as success.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Gateway command that refunds a captured transaction.
pub const REFUND_COMMAND: &str = "refund_transaction";

/// Gateway command that reports the state of a previously submitted refund.
pub const STATUS_COMMAND: &str = "refund_status";

/// Compute the request signature for a gateway command.
pub fn sign_command(
    merchant_id: &str,
    command: &str,
    transaction_id: &str,
    amount: Decimal,
    salt: &str,
) -> String {
    let data = format!("{merchant_id}|{command}|{transaction_id}|{amount}|{salt}");
    let digest = ring::digest::digest(&ring::digest::SHA512, data.as_bytes());
    hex_lower(digest.as_ref())
}

/// Build the form pairs for a `refund_transaction` command.
pub fn refund_form(
    merchant_id: &str,
    transaction_id: &str,
    amount: Decimal,
    salt: &str,
) -> Vec<(&'static str, String)> {
    let sign = sign_command(merchant_id, REFUND_COMMAND, transaction_id, amount, salt);
    vec![
        ("merchant_id", merchant_id.to_owned()),
        ("command", REFUND_COMMAND.to_owned()),
        ("transaction_id", transaction_id.to_owned()),
        ("amount", amount.to_string()),
        ("sign", sign),
    ]
}

/// Build the form pairs for a `refund_status` command.
pub fn status_form(
    merchant_id: &str,
    transaction_id: &str,
    amount: Decimal,
    salt: &str,
) -> Vec<(&'static str, String)> {
    let sign = sign_command(merchant_id, STATUS_COMMAND, transaction_id, amount, salt);
    vec![
        ("merchant_id", merchant_id.to_owned()),
        ("command", STATUS_COMMAND.to_owned()),
        ("transaction_id", transaction_id.to_owned()),
        ("amount", amount.to_string()),
        ("sign", sign),
    ]
}

/// Serialize form pairs into an `application/x-www-form-urlencoded` body.
///
/// For integrators that talk to the gateway without an HTTP client that
/// does form encoding for them.
pub fn encode_form(pairs: &[(&'static str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        },
    )
}

// ---------------------------------------------------------------------------
// Response interpretation
// ---------------------------------------------------------------------------

/// The fields the gateway has been observed to return. All optional —
/// there is no documented contract.
#[derive(Debug, Clone, Default, Deserialize)]
struct GatewayEnvelope {
    status: Option<String>,
    refund_reference: Option<String>,
    message: Option<String>,
}

/// Conservative reading of a gateway refund/status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundAck {
    /// Explicit success with a reference to track.
    Accepted { reference: String },
    /// Explicit rejection.
    Rejected { reason: String },
    /// Anything else. Must be treated as pending, never as success.
    Ambiguous,
}

/// Interpret a raw gateway response body.
///
/// Non-JSON bodies, missing status fields, and success markers without a
/// refund reference all come back as [`RefundAck::Ambiguous`].
pub fn interpret_response(body: &str) -> RefundAck {
    let Ok(envelope) = serde_json::from_str::<GatewayEnvelope>(body) else {
        return RefundAck::Ambiguous;
    };

    let status = envelope
        .status
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match status.as_str() {
        "success" | "refunded" | "completed" => match envelope.refund_reference {
            Some(reference) if !reference.is_empty() => RefundAck::Accepted { reference },
            // Success without a reference cannot be reconciled later.
            _ => RefundAck::Ambiguous,
        },
        "failure" | "failed" | "rejected" | "declined" => RefundAck::Rejected {
            reason: envelope
                .message
                .unwrap_or_else(|| "gateway rejected the refund".to_owned()),
        },
        _ => RefundAck::Ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encoding_matches_known_sha512() {
        // SHA-512("abc"), FIPS 180-2 test vector.
        let digest = ring::digest::digest(&ring::digest::SHA512, b"abc");
        assert_eq!(
            hex_lower(digest.as_ref()),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn signature_is_deterministic_and_salted() {
        let amount = Decimal::new(200_000, 2); // 2000.00
        let a = sign_command("M1", REFUND_COMMAND, "TXN-1", amount, "salt");
        let b = sign_command("M1", REFUND_COMMAND, "TXN-1", amount, "salt");
        let c = sign_command("M1", REFUND_COMMAND, "TXN-1", amount, "other-salt");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn refund_form_carries_command_and_sign() {
        let form = refund_form("M1", "TXN-1", Decimal::new(100, 0), "s");
        assert!(form.iter().any(|(k, v)| *k == "command" && v == REFUND_COMMAND));
        assert!(form.iter().any(|(k, v)| *k == "sign" && v.len() == 128));
    }

    #[test]
    fn form_encoding_escapes_reserved_characters() {
        let body = encode_form(&[("merchant_id", "M&Co 1".to_owned())]);
        assert_eq!(body, "merchant_id=M%26Co%201");
    }

    #[test]
    fn explicit_success_with_reference_is_accepted() {
        let ack = interpret_response(r#"{"status":"SUCCESS","refund_reference":"RF-42"}"#);
        assert_eq!(
            ack,
            RefundAck::Accepted {
                reference: "RF-42".to_owned()
            }
        );
    }

    #[test]
    fn success_without_reference_stays_ambiguous() {
        let ack = interpret_response(r#"{"status":"success"}"#);
        assert_eq!(ack, RefundAck::Ambiguous);
    }

    #[test]
    fn explicit_failure_is_rejected() {
        let ack = interpret_response(r#"{"status":"failed","message":"already refunded"}"#);
        assert_eq!(
            ack,
            RefundAck::Rejected {
                reason: "already refunded".to_owned()
            }
        );
    }

    #[test]
    fn garbage_and_unknown_statuses_stay_ambiguous() {
        assert_eq!(interpret_response("<html>502</html>"), RefundAck::Ambiguous);
        assert_eq!(
            interpret_response(r#"{"status":"queued","refund_reference":"RF-1"}"#),
            RefundAck::Ambiguous
        );
        assert_eq!(interpret_response("{}"), RefundAck::Ambiguous);
    }
}
