use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_core::workflow::cancellation;
use aftersale_sdk::objects::OrderStatus;
use aftersale_sdk::objects::cancellation::{CancellationConfirmed, ConfirmCancellationRequest};

use super::CustomerApiError;
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `POST /orders/{order_id}/cancellation/confirm` — verify the emailed
/// code and cancel the order.
///
/// For a captured prepaid order the response carries the refund request
/// now awaiting the customer's method selection.
pub(super) async fn confirm_cancellation(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ConfirmCancellationRequest>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let secret = state.otp_secret().await;
    let outcome = cancellation::confirm_cancellation(
        &state.db,
        &state.event_senders.mail,
        &secret,
        order_id,
        session.user_id,
        body.code.trim(),
    )
    .await?;

    Ok(Json(CancellationConfirmed {
        order_id: outcome.order_id,
        status: OrderStatus::Cancelled,
        refund_request_id: outcome.refund_request.map(|r| r.id),
    }))
}
