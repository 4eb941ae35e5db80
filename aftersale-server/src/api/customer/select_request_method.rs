use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_sdk::objects::complaints::SelectRefundMethodRequest;

use super::{CustomerApiError, to_refund_request_response};
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `POST /refund-requests/{request_id}/refund-method` — choose how a
/// cancellation refund pays out.
pub(super) async fn select_request_method(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(request_id): Path<Uuid>,
    Json(body): Json<SelectRefundMethodRequest>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let request = state
        .refunds
        .select_request_method(request_id, session.user_id, body.method.into())
        .await?;

    Ok(Json(to_refund_request_response(&request)))
}
