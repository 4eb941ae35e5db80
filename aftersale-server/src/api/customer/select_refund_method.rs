use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_sdk::objects::complaints::SelectRefundMethodRequest;

use super::{CustomerApiError, to_complaint_response};
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `POST /complaints/{complaint_id}/refund-method` — choose how an
/// approved complaint refund pays out.
///
/// Selecting again after a dispatch is a no-op returning the current
/// state; the first selection wins.
pub(super) async fn select_refund_method(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(complaint_id): Path<Uuid>,
    Json(body): Json<SelectRefundMethodRequest>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let complaint = state
        .refunds
        .select_complaint_method(complaint_id, session.user_id, body.method.into())
        .await?;

    Ok(Json(to_complaint_response(&complaint)))
}
