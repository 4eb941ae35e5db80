use kanau::processor::Processor;
use uuid::Uuid;

use crate::entities::UserRole;
use crate::framework::DatabaseProcessor;

/// A registered user. Password hashes are argon2 PHC strings.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: time::OffsetDateTime,
}

/// The user behind a live session token, resolved during authentication.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub expires_at: time::OffsetDateTime,
}

/// Resolve a bearer token digest to its session user.
///
/// The token itself never touches the database; callers hash it first.
#[derive(Debug, Clone)]
pub struct GetSessionUser {
    pub token_digest: String,
}

impl Processor<GetSessionUser> for DatabaseProcessor {
    type Output = Option<SessionUser>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSessionUser")]
    async fn process(&self, query: GetSessionUser) -> Result<Option<SessionUser>, sqlx::Error> {
        sqlx::query_as::<_, SessionUser>(
            "SELECT u.id AS user_id, u.email, u.role, s.expires_at \
             FROM sessions s \
             JOIN users u ON s.user_id = u.id \
             WHERE s.token_digest = $1",
        )
        .bind(query.token_digest)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Look up a user by email (password reset entry point).
#[derive(Debug, Clone)]
pub struct FindUserByEmail {
    pub email: String,
}

impl Processor<FindUserByEmail> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindUserByEmail")]
    async fn process(&self, query: FindUserByEmail) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, password_hash, role, created_at \
             FROM users WHERE email = $1",
        )
        .bind(query.email)
        .fetch_optional(&self.pool)
        .await
    }
}

impl User {
    /// Fetch the email address for a user id (mail fan-out).
    pub async fn email_of(pool: &sqlx::PgPool, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(email,)| email))
    }

    /// Every registered address, for broadcast email fan-out.
    pub async fn all_emails(pool: &sqlx::PgPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT email FROM users")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    /// Replace a user's password hash and revoke every live session.
    pub async fn reset_password(
        pool: &sqlx::PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }
}
