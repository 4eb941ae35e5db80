//! Admin API handlers.
//!
//! Every endpoint requires a staff session; the bulk notification
//! endpoint additionally requires the super-admin role.
//!
//! # Endpoints
//!
//! - `GET  /complaints`                          – list, paginated and filterable
//! - `POST /complaints/{id}/resolve`             – record the resolution decision
//! - `POST /complaints/{id}/mark-refunded`       – close out a manual bank payout
//! - `POST /refund-requests/{id}/mark-refunded`  – same, for a cancellation refund
//! - `POST /notifications/bulk`                  – broadcast to every user

use std::collections::HashMap;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use aftersale_core::entities::PaymentMethod;
use aftersale_core::entities::complaints::OrderComplaint;
use aftersale_core::workflow::resolution::ResolutionError;
use aftersale_sdk::objects::admin::AdminComplaintResponse;

use crate::state::AppState;

mod bulk_notify;
mod list_complaints;
mod mark_refunded;
mod resolve_complaint;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/complaints", get(list_complaints::list_complaints))
        .route(
            "/complaints/{complaint_id}/resolve",
            post(resolve_complaint::resolve_complaint),
        )
        .route(
            "/complaints/{complaint_id}/mark-refunded",
            post(mark_refunded::mark_complaint_refunded),
        )
        .route(
            "/refund-requests/{request_id}/mark-refunded",
            post(mark_refunded::mark_request_refunded),
        )
        .route("/notifications/bulk", post(bulk_notify::bulk_notify))
}

/// Build the admin view of a complaint. The payment method comes from
/// the order row, fetched separately by the caller.
pub(crate) fn to_admin_response(
    c: &OrderComplaint,
    payment_methods: &HashMap<Uuid, PaymentMethod>,
) -> AdminComplaintResponse {
    AdminComplaintResponse {
        complaint_id: c.id,
        order_id: c.order_id,
        user_id: c.user_id,
        kind: c.kind.into(),
        status: c.status.into(),
        resolution: c.resolution.into(),
        // The order FK guarantees a row; Cod only covers a torn read.
        payment_method: payment_methods
            .get(&c.order_id)
            .copied()
            .unwrap_or(PaymentMethod::Cod)
            .into(),
        refund_method: c.refund_method.map(Into::into),
        refund_state: c.refund_state.into(),
        refund_amount: c.refund_amount,
        gateway_reference: c.gateway_reference.clone(),
        reconcile_attempts: c.reconcile_attempts,
        store_credit_code: c.store_credit_code.clone(),
        apology_credit_code: c.apology_credit_code.clone(),
        description: c.description.clone(),
        created_at: c.created_at.unix_timestamp(),
        resolved_at: c.resolved_at.map(|t| t.unix_timestamp()),
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// Unknown complaint or refund request.
    NotFound,
    /// Mark-refunded on a refund that is not a pending bank transfer.
    NotAwaitingManualPayout,
    /// Original-payment refund on an order that never hit the gateway.
    NothingCharged,
    /// A method was selected but no refund is awaiting one.
    SelectionNotPending,
}

impl From<ResolutionError> for AdminApiError {
    fn from(e: ResolutionError) -> Self {
        match e {
            ResolutionError::Db(e) => Self::Database(e),
            ResolutionError::ComplaintNotFound | ResolutionError::RefundRequestNotFound => {
                Self::NotFound
            }
            ResolutionError::NotAwaitingManualPayout => Self::NotAwaitingManualPayout,
            ResolutionError::NothingCharged => Self::NothingCharged,
            ResolutionError::SelectionNotPending => Self::SelectionNotPending,
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

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error",
                )
            }
            AdminApiError::NotFound => {
                json_error(StatusCode::NOT_FOUND, "not_found", "resource not found")
            }
            AdminApiError::NotAwaitingManualPayout => json_error(
                StatusCode::CONFLICT,
                "not_awaiting_manual_payout",
                "the refund is not a pending bank transfer",
            ),
            AdminApiError::NothingCharged => json_error(
                StatusCode::CONFLICT,
                "nothing_charged",
                "no payment was captured for this order",
            ),
            AdminApiError::SelectionNotPending => json_error(
                StatusCode::CONFLICT,
                "selection_not_pending",
                "no refund is awaiting a method selection",
            ),
        }
    }
}
