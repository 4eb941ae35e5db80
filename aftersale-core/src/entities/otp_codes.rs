use uuid::Uuid;

use crate::entities::OtpScope;

/// A live one-time-code record.
///
/// At most one row exists per (scope, subject); requesting a new code
/// replaces the old row. The plaintext code is never stored, only its
/// keyed hash.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OtpCode {
    pub id: Uuid,
    pub scope: OtpScope,
    /// Email address (password reset) or order UUID (cancellation).
    pub subject: String,
    pub user_id: Option<Uuid>,
    pub code_hash: String,
    pub expires_at: time::OffsetDateTime,
    pub attempts: i32,
    pub created_at: time::OffsetDateTime,
}

const OTP_COLUMNS: &str =
    "id, scope, subject, user_id, code_hash, expires_at, attempts, created_at";

impl OtpCode {
    /// Store a fresh code hash, invalidating any pending code for the
    /// same subject.
    pub async fn replace(
        pool: &sqlx::PgPool,
        scope: OtpScope,
        subject: &str,
        user_id: Option<Uuid>,
        code_hash: &str,
        ttl: time::Duration,
    ) -> Result<(), sqlx::Error> {
        let expires_at = time::OffsetDateTime::now_utc() + ttl;
        sqlx::query(
            "INSERT INTO otp_codes (id, scope, subject, user_id, code_hash, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (scope, subject) DO UPDATE \
             SET id = EXCLUDED.id, user_id = EXCLUDED.user_id, \
                 code_hash = EXCLUDED.code_hash, expires_at = EXCLUDED.expires_at, \
                 attempts = 0, created_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(scope)
        .bind(subject)
        .bind(user_id)
        .bind(code_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch the pending code for a subject, if one exists.
    pub async fn get(
        pool: &sqlx::PgPool,
        scope: OtpScope,
        subject: &str,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        sqlx::query_as::<_, OtpCode>(&format!(
            "SELECT {OTP_COLUMNS} FROM otp_codes WHERE scope = $1 AND subject = $2"
        ))
        .bind(scope)
        .bind(subject)
        .fetch_optional(pool)
        .await
    }

    /// Consume (delete) a code record: success, expiry, or lockout.
    pub async fn delete(pool: &sqlx::PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM otp_codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Count a failed guess, returning the new attempt count.
    pub async fn increment_attempts(pool: &sqlx::PgPool, id: Uuid) -> Result<i32, sqlx::Error> {
        let (attempts,): (i32,) = sqlx::query_as(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(attempts)
    }
}
