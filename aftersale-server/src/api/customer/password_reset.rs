use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;
use serde_json::json;

use aftersale_core::entities::OtpScope;
use aftersale_core::entities::otp_codes::OtpCode;
use aftersale_core::entities::users::{FindUserByEmail, User};
use aftersale_core::events::{MailEvent, OtpPurpose};
use aftersale_core::framework::DatabaseProcessor;
use aftersale_core::otp::{self, PASSWORD_RESET_POLICY, VerifyOutcome};
use aftersale_core::workflow::notify;
use aftersale_sdk::objects::auth::{PasswordResetConfirm, PasswordResetRequest};

use super::CustomerApiError;
use crate::state::AppState;

/// `POST /auth/password-reset` — email a reset code.
///
/// Unauthenticated. Always answers `{"ok": true}` so the endpoint cannot
/// be used to probe which addresses have accounts.
pub(super) async fn request_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let email = body.email.trim().to_ascii_lowercase();
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let user = processor
        .process(FindUserByEmail {
            email: email.clone(),
        })
        .await
        .map_err(CustomerApiError::Database)?;

    if let Some(user) = user {
        let secret = state.otp_secret().await;
        let code = otp::generate_code();
        let hash = otp::hash_code(&secret, OtpScope::PasswordReset, &email, &code);
        OtpCode::replace(
            &state.db,
            OtpScope::PasswordReset,
            &email,
            Some(user.id),
            &hash,
            PASSWORD_RESET_POLICY.ttl,
        )
        .await
        .map_err(CustomerApiError::Database)?;

        let expires_minutes = PASSWORD_RESET_POLICY.ttl.whole_minutes();
        notify::email_user(&state.db, &state.event_senders.mail, user.id, move |to| {
            MailEvent::OtpCode {
                to,
                code,
                purpose: OtpPurpose::PasswordReset,
                expires_minutes,
            }
        })
        .await
        .map_err(CustomerApiError::Database)?;
    } else {
        tracing::info!("Password reset requested for an unknown address");
    }

    Ok(Json(json!({"ok": true})))
}

/// `POST /auth/password-reset/confirm` — verify the code and set the new
/// password. All live sessions for the account are revoked.
pub(super) async fn confirm_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetConfirm>,
) -> Result<impl IntoResponse, CustomerApiError> {
    if body.new_password.len() < 8 {
        return Err(CustomerApiError::Validation(
            "password must be at least 8 characters",
        ));
    }

    let email = body.email.trim().to_ascii_lowercase();
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let user = processor
        .process(FindUserByEmail {
            email: email.clone(),
        })
        .await
        .map_err(CustomerApiError::Database)?
        // Indistinguishable from a wrong code for an existing account.
        .ok_or(CustomerApiError::Code(VerifyOutcome::NoCodeOnFile))?;

    let secret = state.otp_secret().await;
    let outcome = otp::verify_and_consume(
        &state.db,
        &secret,
        OtpScope::PasswordReset,
        &email,
        body.code.trim(),
        PASSWORD_RESET_POLICY,
    )
    .await
    .map_err(CustomerApiError::Database)?;
    if outcome != VerifyOutcome::Verified {
        return Err(CustomerApiError::Code(outcome));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2::Argon2::default()
        .hash_password(body.new_password.as_bytes(), &salt)
        .map_err(|_| CustomerApiError::Hashing)?
        .to_string();
    User::reset_password(&state.db, user.id, &hash)
        .await
        .map_err(CustomerApiError::Database)?;

    notify::notify(
        &state.db,
        user.id,
        "Password changed",
        "Your password was just changed and all other sessions were signed out. \
         If this wasn't you, contact support immediately.",
        aftersale_core::entities::NotificationKind::Security,
        None,
    )
    .await
    .map_err(CustomerApiError::Database)?;

    Ok(Json(json!({"ok": true})))
}
