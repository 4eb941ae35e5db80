//! OTP-gated password reset types.
//!
//! Both endpoints are unauthenticated. The request endpoint answers the
//! same way whether or not the email exists.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/password-reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /auth/password-reset/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfirm {
    pub email: String,
    /// The 6-digit code from the email.
    pub code: String,
    pub new_password: String,
}
