use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_core::entities::orders::Order;

use super::{AdminApiError, to_admin_response};
use crate::api::customer::to_refund_request_response;
use crate::api::extractors::StaffAuth;
use crate::state::AppState;

/// `POST /complaints/{complaint_id}/mark-refunded` — confirm a manual
/// bank transfer was sent.
///
/// Only valid while the refund is a bank transfer in `processing`.
/// Marking an already-completed refund again is a no-op.
pub(super) async fn mark_complaint_refunded(
    State(state): State<AppState>,
    StaffAuth(session): StaffAuth,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    tracing::info!(%complaint_id, staff = %session.email, "Marking complaint refund paid");
    let complaint = state.refunds.mark_complaint_refunded(complaint_id).await?;

    let payment_methods: HashMap<_, _> =
        Order::payment_methods_for(&state.db, &[complaint.order_id])
            .await
            .map_err(AdminApiError::Database)?
            .into_iter()
            .collect();
    Ok(Json(to_admin_response(&complaint, &payment_methods)))
}

/// `POST /refund-requests/{request_id}/mark-refunded` — same, for a
/// cancellation refund paid out by bank transfer.
pub(super) async fn mark_request_refunded(
    State(state): State<AppState>,
    StaffAuth(session): StaffAuth,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    tracing::info!(%request_id, staff = %session.email, "Marking cancellation refund paid");
    let request = state.refunds.mark_request_refunded(request_id).await?;
    Ok(Json(to_refund_request_response(&request)))
}
