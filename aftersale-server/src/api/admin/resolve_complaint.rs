use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_core::entities::orders::Order;
use aftersale_sdk::objects::admin::ResolveComplaintRequest;

use super::{AdminApiError, to_admin_response};
use crate::api::extractors::StaffAuth;
use crate::state::AppState;

/// `POST /complaints/{complaint_id}/resolve` — record the staff decision.
///
/// A refund decision on a prepaid order parks the complaint awaiting the
/// customer's method selection; for cash on delivery it dispatches store
/// credit immediately. Resolving an already-closed complaint is a no-op
/// returning the current state.
pub(super) async fn resolve_complaint(
    State(state): State<AppState>,
    StaffAuth(session): StaffAuth,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<ResolveComplaintRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    tracing::info!(
        %complaint_id,
        staff = %session.email,
        resolution = ?body.resolution,
        "Resolving complaint"
    );
    let complaint = state
        .refunds
        .resolve_complaint(complaint_id, body.resolution.into(), body.note.as_deref())
        .await?;

    let payment_methods: HashMap<_, _> =
        Order::payment_methods_for(&state.db, &[complaint.order_id])
            .await
            .map_err(AdminApiError::Database)?
            .into_iter()
            .collect();
    Ok(Json(to_admin_response(&complaint, &payment_methods)))
}
