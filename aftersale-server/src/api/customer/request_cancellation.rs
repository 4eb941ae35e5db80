use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_core::workflow::cancellation;
use aftersale_sdk::objects::cancellation::{CancellationCodeIssued, RequestCancellationCode};

use super::CustomerApiError;
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `POST /orders/{order_id}/cancellation` — request a cancellation code.
///
/// Emails a 6-digit code to the account address. The code never appears
/// in the response. Re-requesting replaces any pending code.
pub(super) async fn request_cancellation(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(order_id): Path<Uuid>,
    body: Option<Json<RequestCancellationCode>>,
) -> Result<impl IntoResponse, CustomerApiError> {
    if let Some(Json(body)) = body
        && let Some(reason) = body.reason
    {
        tracing::info!(%order_id, reason = %reason, "Cancellation requested with reason");
    }

    let secret = state.otp_secret().await;
    let expires_in_secs = cancellation::request_cancellation(
        &state.db,
        &state.event_senders.mail,
        &secret,
        order_id,
        session.user_id,
    )
    .await?;

    Ok(Json(CancellationCodeIssued {
        order_id,
        expires_in_secs,
    }))
}
