//! Customer API handlers.
//!
//! These endpoints serve the account frontend and require a bearer
//! session, except the password reset pair which is unauthenticated.
//! Ownership failures return 404, never 403, so the API does not confirm
//! that somebody else's order exists.
//!
//! # Endpoints
//!
//! - `POST /orders/{order_id}/cancellation`         – request a cancellation code
//! - `POST /orders/{order_id}/cancellation/confirm` – verify code, cancel
//! - `POST /orders/{order_id}/complaints`           – report an issue
//! - `GET  /complaints/{complaint_id}`              – poll complaint state
//! - `POST /complaints/{complaint_id}/refund-method`       – choose refund method
//! - `POST /refund-requests/{request_id}/refund-method`    – choose for a cancellation refund
//! - `POST /auth/password-reset`                    – request a reset code
//! - `POST /auth/password-reset/confirm`            – verify code, set password

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use aftersale_core::entities::complaints::OrderComplaint;
use aftersale_core::entities::refund_requests::RefundRequest;
use aftersale_core::otp::VerifyOutcome;
use aftersale_core::workflow::cancellation::CancellationError;
use aftersale_core::workflow::intake::IntakeError;
use aftersale_core::workflow::resolution::ResolutionError;
use aftersale_sdk::objects::complaints::{ComplaintResponse, RefundRequestResponse};

use crate::state::AppState;

mod confirm_cancellation;
mod get_complaint;
mod password_reset;
mod report_issue;
mod request_cancellation;
mod select_refund_method;
mod select_request_method;

/// Build the Customer API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orders/{order_id}/cancellation",
            post(request_cancellation::request_cancellation),
        )
        .route(
            "/orders/{order_id}/cancellation/confirm",
            post(confirm_cancellation::confirm_cancellation),
        )
        .route(
            "/orders/{order_id}/complaints",
            post(report_issue::report_issue),
        )
        .route(
            "/complaints/{complaint_id}",
            get(get_complaint::get_complaint),
        )
        .route(
            "/complaints/{complaint_id}/refund-method",
            post(select_refund_method::select_refund_method),
        )
        .route(
            "/refund-requests/{request_id}/refund-method",
            post(select_request_method::select_request_method),
        )
        .route("/auth/password-reset", post(password_reset::request_reset))
        .route(
            "/auth/password-reset/confirm",
            post(password_reset::confirm_reset),
        )
}

/// Convert an `OrderComplaint` (DB model) into a `ComplaintResponse` (API model).
pub(crate) fn to_complaint_response(c: &OrderComplaint) -> ComplaintResponse {
    ComplaintResponse {
        complaint_id: c.id,
        order_id: c.order_id,
        kind: c.kind.into(),
        status: c.status.into(),
        resolution: c.resolution.into(),
        refund_method: c.refund_method.map(Into::into),
        refund_state: c.refund_state.into(),
        refund_amount: c.refund_amount,
        store_credit_code: c.store_credit_code.clone(),
        apology_credit_code: c.apology_credit_code.clone(),
        created_at: c.created_at.unix_timestamp(),
        resolved_at: c.resolved_at.map(|t| t.unix_timestamp()),
    }
}

/// Convert a `RefundRequest` into its API view.
pub(crate) fn to_refund_request_response(r: &RefundRequest) -> RefundRequestResponse {
    RefundRequestResponse {
        refund_request_id: r.id,
        order_id: r.order_id,
        amount: r.amount,
        method: r.method.map(Into::into),
        state: r.state.into(),
        store_credit_code: r.store_credit_code.clone(),
        created_at: r.created_at.unix_timestamp(),
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Customer API handlers.
#[derive(Debug)]
pub(crate) enum CustomerApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// Unknown resource, or a resource owned by someone else.
    NotFound,
    /// The order has already shipped, been delivered, or been cancelled.
    NotCancellable,
    /// An open complaint already exists for the order.
    DuplicateComplaint,
    /// A method was selected but no refund is awaiting one.
    SelectionNotPending,
    /// Original-payment refund on an order that never hit the gateway.
    NothingCharged,
    /// The one-time code did not verify.
    Code(VerifyOutcome),
    /// A request field failed validation.
    Validation(&'static str),
    /// Password hashing failed.
    Hashing,
}

impl From<IntakeError> for CustomerApiError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::Db(e) => Self::Database(e),
            IntakeError::OrderNotFound => Self::NotFound,
            IntakeError::DuplicateComplaint => Self::DuplicateComplaint,
        }
    }
}

impl From<CancellationError> for CustomerApiError {
    fn from(e: CancellationError) -> Self {
        match e {
            CancellationError::Db(e) => Self::Database(e),
            CancellationError::OrderNotFound => Self::NotFound,
            CancellationError::NotCancellable => Self::NotCancellable,
            CancellationError::Code(outcome) => Self::Code(outcome),
        }
    }
}

impl From<ResolutionError> for CustomerApiError {
    fn from(e: ResolutionError) -> Self {
        match e {
            ResolutionError::Db(e) => Self::Database(e),
            ResolutionError::ComplaintNotFound | ResolutionError::RefundRequestNotFound => {
                Self::NotFound
            }
            ResolutionError::SelectionNotPending
            | ResolutionError::NotAwaitingManualPayout => Self::SelectionNotPending,
            ResolutionError::NothingCharged => Self::NothingCharged,
        }
    }
}

fn json_error(status: StatusCode, code: &str, message: &str) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({ "error": code, "message": message })),
    )
        .into_response()
}

impl IntoResponse for CustomerApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CustomerApiError::Database(e) => {
                tracing::error!(error = %e, "Customer API database error");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error",
                )
            }
            CustomerApiError::NotFound => {
                json_error(StatusCode::NOT_FOUND, "not_found", "resource not found")
            }
            CustomerApiError::NotCancellable => json_error(
                StatusCode::CONFLICT,
                "not_cancellable",
                "order can no longer be cancelled",
            ),
            CustomerApiError::DuplicateComplaint => json_error(
                StatusCode::CONFLICT,
                "duplicate_complaint",
                "an open report already exists for this order",
            ),
            CustomerApiError::SelectionNotPending => json_error(
                StatusCode::CONFLICT,
                "selection_not_pending",
                "no refund is awaiting a method selection",
            ),
            CustomerApiError::NothingCharged => json_error(
                StatusCode::CONFLICT,
                "nothing_charged",
                "no payment was captured for this order",
            ),
            CustomerApiError::Code(outcome) => match outcome {
                VerifyOutcome::NoCodeOnFile => json_error(
                    StatusCode::BAD_REQUEST,
                    "code_not_found",
                    "no active code; request a new one",
                ),
                VerifyOutcome::Expired => json_error(
                    StatusCode::BAD_REQUEST,
                    "code_expired",
                    "the code has expired; request a new one",
                ),
                VerifyOutcome::Mismatch { remaining } => (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "code_mismatch",
                        "message": "incorrect code",
                        "remaining_attempts": remaining,
                    })),
                )
                    .into_response(),
                VerifyOutcome::LockedOut => json_error(
                    StatusCode::BAD_REQUEST,
                    "code_locked_out",
                    "too many incorrect attempts; request a new code",
                ),
                VerifyOutcome::Verified => {
                    tracing::error!("Verified outcome surfaced as an error");
                    json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "internal server error",
                    )
                }
            },
            CustomerApiError::Validation(message) => {
                json_error(StatusCode::BAD_REQUEST, "validation", message)
            }
            CustomerApiError::Hashing => {
                tracing::error!("Password hashing failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error",
                )
            }
        }
    }
}
