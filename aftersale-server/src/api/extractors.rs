//! Custom Axum extractors for request authentication.
//!
//! All endpoints except the password reset and the courier webhook carry
//! a bearer session token. The token itself never touches the database:
//! its SHA-256 digest is looked up in the `sessions` table, so a leaked
//! database dump cannot be replayed as live tokens.
//!
//! - `CustomerAuth` — any live session.
//! - `StaffAuth` — `staff` or `super_admin` role.
//! - `SuperAdminAuth` — `super_admin` role only.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use kanau::processor::Processor;

use aftersale_core::entities::UserRole;
use aftersale_core::entities::users::{GetSessionUser, SessionUser};
use aftersale_core::framework::DatabaseProcessor;

use crate::state::AppState;

/// Digest a bearer token the way the `sessions` table stores it.
pub fn token_digest(token: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, token.as_bytes());
    fast32::base64::RFC4648_NOPAD.encode(digest.as_ref())
}

/// Errors returned by the auth extractors.
#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidToken,
    SessionExpired,
    Forbidden,
    Database(sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingHeader => (StatusCode::UNAUTHORIZED, "missing Authorization header"),
            AuthError::InvalidHeader => {
                (StatusCode::UNAUTHORIZED, "invalid Authorization header")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid session token"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "session expired"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "insufficient privileges"),
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        (status, message).into_response()
    }
}

async fn resolve_session(parts: &Parts, state: &AppState) -> Result<SessionUser, AuthError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidHeader)?;

    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let session = processor
        .process(GetSessionUser {
            token_digest: token_digest(token),
        })
        .await
        .map_err(AuthError::Database)?
        .ok_or(AuthError::InvalidToken)?;

    if session.expires_at <= time::OffsetDateTime::now_utc() {
        return Err(AuthError::SessionExpired);
    }
    Ok(session)
}

/// Any authenticated user.
pub struct CustomerAuth(pub SessionUser);

impl FromRequestParts<AppState> for CustomerAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CustomerAuth(resolve_session(parts, state).await?))
    }
}

/// A staff or super-admin session.
pub struct StaffAuth(pub SessionUser);

impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve_session(parts, state).await?;
        if !session.role.is_staff() {
            return Err(AuthError::Forbidden);
        }
        Ok(StaffAuth(session))
    }
}

/// A super-admin session.
pub struct SuperAdminAuth(pub SessionUser);

impl FromRequestParts<AppState> for SuperAdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve_session(parts, state).await?;
        if session.role != UserRole::SuperAdmin {
            return Err(AuthError::Forbidden);
        }
        Ok(SuperAdminAuth(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_digest_is_deterministic_and_distinct() {
        let a = token_digest("session-token-a");
        let b = token_digest("session-token-b");
        assert_eq!(a, token_digest("session-token-a"));
        assert_ne!(a, b);
        // Raw token never appears in the digest.
        assert!(!a.contains("session"));
    }
}
