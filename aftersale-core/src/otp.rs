//! One-time-code generation, hashing, and verification.
//!
//! Codes are 6 uniform random digits. Only a keyed hash is stored:
//! `HMAC-SHA256("{scope}:{subject}:{code}", otp_secret)`, base64-encoded,
//! which binds each code to the subject it was issued for. A code is
//! single-use, expires after a fixed window, and locks out after a
//! bounded number of wrong guesses.

use rand::Rng;

use crate::entities::OtpScope;
use crate::entities::otp_codes::OtpCode;

/// Codes are always exactly this many digits.
pub const OTP_LENGTH: usize = 6;

/// Expiry window and guess limit for one OTP scope.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    pub ttl: time::Duration,
    pub max_attempts: i32,
}

/// Order cancellation: short window, a few extra guesses for typos.
pub const CANCELLATION_POLICY: OtpPolicy = OtpPolicy {
    ttl: time::Duration::minutes(5),
    max_attempts: 5,
};

/// Password reset: longer window, stricter guess limit.
pub const PASSWORD_RESET_POLICY: OtpPolicy = OtpPolicy {
    ttl: time::Duration::minutes(10),
    max_attempts: 3,
};

/// Draw a fresh 6-digit code.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Keyed hash of a code, bound to its scope and subject.
pub fn hash_code(secret: &[u8], scope: OtpScope, subject: &str, code: &str) -> String {
    let data = format!("{}:{}:{}", scope.tag(), subject, code);
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        data.as_bytes(),
    );
    fast32::base64::RFC4648_NOPAD.encode(tag.as_ref())
}

/// Constant-time check of a candidate code against a stored hash.
pub fn code_matches(
    secret: &[u8],
    scope: OtpScope,
    subject: &str,
    candidate: &str,
    stored_hash: &str,
) -> bool {
    let Ok(stored) = fast32::base64::RFC4648_NOPAD.decode_str(stored_hash) else {
        return false;
    };
    let data = format!("{}:{}:{}", scope.tag(), subject, candidate);
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        data.as_bytes(),
        &stored,
    )
    .is_ok()
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The code matched and was consumed.
    Verified,
    /// Never requested, already consumed, or replaced.
    NoCodeOnFile,
    /// The window elapsed; the record was removed.
    Expired,
    /// Wrong code; this many guesses remain before lockout.
    Mismatch { remaining: i32 },
    /// Too many wrong guesses; the record was invalidated and a new code
    /// must be requested.
    LockedOut,
}

/// The stateless fields of a code record that decide a verification.
#[derive(Debug, Clone, Copy)]
pub struct OtpCheck {
    pub expires_at: time::OffsetDateTime,
    pub attempts: i32,
}

/// Decide a verification attempt. Pure: the caller applies the implied
/// row mutation (delete on Verified/Expired/LockedOut, increment on
/// Mismatch).
pub fn evaluate(
    record: Option<OtpCheck>,
    hash_matches: bool,
    now: time::OffsetDateTime,
    policy: OtpPolicy,
) -> VerifyOutcome {
    let Some(record) = record else {
        return VerifyOutcome::NoCodeOnFile;
    };
    if now >= record.expires_at {
        return VerifyOutcome::Expired;
    }
    if record.attempts >= policy.max_attempts {
        // Lockout holds even for a correct code.
        return VerifyOutcome::LockedOut;
    }
    if hash_matches {
        return VerifyOutcome::Verified;
    }
    let remaining = policy.max_attempts - record.attempts - 1;
    if remaining <= 0 {
        VerifyOutcome::LockedOut
    } else {
        VerifyOutcome::Mismatch { remaining }
    }
}

/// Verify a candidate against the stored record and apply the outcome:
/// the row is deleted on success, expiry, and lockout, and the attempt
/// counter incremented on a plain mismatch.
pub async fn verify_and_consume(
    pool: &sqlx::PgPool,
    secret: &[u8],
    scope: OtpScope,
    subject: &str,
    candidate: &str,
    policy: OtpPolicy,
) -> Result<VerifyOutcome, sqlx::Error> {
    let record = OtpCode::get(pool, scope, subject).await?;
    let check = record.as_ref().map(|r| OtpCheck {
        expires_at: r.expires_at,
        attempts: r.attempts,
    });
    let matches = record
        .as_ref()
        .map(|r| code_matches(secret, scope, subject, candidate, &r.code_hash))
        .unwrap_or(false);

    let outcome = evaluate(check, matches, time::OffsetDateTime::now_utc(), policy);

    if let Some(record) = record {
        match outcome {
            VerifyOutcome::Verified | VerifyOutcome::Expired | VerifyOutcome::LockedOut => {
                OtpCode::delete(pool, record.id).await?;
            }
            VerifyOutcome::Mismatch { .. } => {
                OtpCode::increment_attempts(pool, record.id).await?;
            }
            VerifyOutcome::NoCodeOnFile => {}
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-otp-secret";

    fn check(expires_in: time::Duration, attempts: i32) -> OtpCheck {
        OtpCheck {
            expires_at: time::OffsetDateTime::now_utc() + expires_in,
            attempts,
        }
    }

    #[test]
    fn codes_are_exactly_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), OTP_LENGTH);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn hash_binds_scope_and_subject() {
        let h = hash_code(SECRET, OtpScope::OrderCancellation, "order-1", "123456");
        assert!(code_matches(
            SECRET,
            OtpScope::OrderCancellation,
            "order-1",
            "123456",
            &h
        ));
        // Same code, different subject or scope: no match.
        assert!(!code_matches(
            SECRET,
            OtpScope::OrderCancellation,
            "order-2",
            "123456",
            &h
        ));
        assert!(!code_matches(
            SECRET,
            OtpScope::PasswordReset,
            "order-1",
            "123456",
            &h
        ));
    }

    #[test]
    fn verification_requires_a_live_record() {
        let now = time::OffsetDateTime::now_utc();
        assert_eq!(
            evaluate(None, true, now, CANCELLATION_POLICY),
            VerifyOutcome::NoCodeOnFile
        );
    }

    #[test]
    fn expired_codes_are_rejected_even_when_correct() {
        let now = time::OffsetDateTime::now_utc();
        let record = check(time::Duration::minutes(-1), 0);
        assert_eq!(
            evaluate(Some(record), true, now, CANCELLATION_POLICY),
            VerifyOutcome::Expired
        );
    }

    #[test]
    fn mismatch_reports_remaining_attempts() {
        let now = time::OffsetDateTime::now_utc();
        let record = check(time::Duration::minutes(4), 0);
        assert_eq!(
            evaluate(Some(record), false, now, CANCELLATION_POLICY),
            VerifyOutcome::Mismatch { remaining: 4 }
        );
    }

    #[test]
    fn final_mismatch_locks_out() {
        let now = time::OffsetDateTime::now_utc();
        let record = check(time::Duration::minutes(4), 4);
        assert_eq!(
            evaluate(Some(record), false, now, CANCELLATION_POLICY),
            VerifyOutcome::LockedOut
        );
    }

    #[test]
    fn lockout_holds_for_correct_code_until_new_request() {
        let now = time::OffsetDateTime::now_utc();
        // Attempt counter already at the threshold.
        let record = check(time::Duration::minutes(4), 5);
        assert_eq!(
            evaluate(Some(record), true, now, CANCELLATION_POLICY),
            VerifyOutcome::LockedOut
        );
    }

    #[test]
    fn correct_code_under_limit_verifies() {
        let now = time::OffsetDateTime::now_utc();
        let record = check(time::Duration::minutes(4), 2);
        assert_eq!(
            evaluate(Some(record), true, now, CANCELLATION_POLICY),
            VerifyOutcome::Verified
        );
    }

    #[test]
    fn password_reset_policy_is_stricter() {
        let now = time::OffsetDateTime::now_utc();
        let record = check(time::Duration::minutes(4), 2);
        assert_eq!(
            evaluate(Some(record), false, now, PASSWORD_RESET_POLICY),
            VerifyOutcome::LockedOut
        );
    }
}
