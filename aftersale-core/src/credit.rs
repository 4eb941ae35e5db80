//! Store-credit code generation and value policy.

use rand::Rng;
use rust_decimal::Decimal;

/// Code alphabet without lookalike characters (no 0/O, 1/I/L).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

const CODE_BODY_LENGTH: usize = 12;

/// Gift cards expire one year after issuance.
pub const VALIDITY_DAYS: i64 = 365;

/// Draw a fresh gift-card code, e.g. `GC-K7PQ2WXA9MRD`.
///
/// 31^12 possible bodies; the unique column constraint catches the
/// astronomically unlikely collision.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let body: String = (0..CODE_BODY_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    format!("GC-{body}")
}

/// Expiry timestamp for a card issued now.
pub fn expiry_from_now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc() + time::Duration::days(VALIDITY_DAYS)
}

/// Value of the apology credit issued for a not-received report: 20% of
/// the order total, independent of any later refund.
pub fn apology_credit(order_total: Decimal) -> Decimal {
    (order_total * Decimal::new(20, 2)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_have_fixed_shape() {
        let code = generate_code();
        assert_eq!(code.len(), 3 + CODE_BODY_LENGTH);
        assert!(code.starts_with("GC-"));
        assert!(
            code[3..]
                .bytes()
                .all(|b| CODE_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn codes_are_unique_per_issuance() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn apology_credit_is_twenty_percent_rounded() {
        assert_eq!(apology_credit(Decimal::new(2000, 0)), Decimal::new(400_00, 2));
        assert_eq!(apology_credit(Decimal::new(999, 0)), Decimal::new(199_80, 2));
        // 33.33 * 0.20 = 6.666 → 6.67
        assert_eq!(apology_credit(Decimal::new(33_33, 2)), Decimal::new(6_67, 2));
    }

    #[test]
    fn expiry_is_about_a_year_out() {
        let expiry = expiry_from_now();
        let days = (expiry - time::OffsetDateTime::now_utc()).whole_days();
        assert!((364..=365).contains(&days));
    }
}
