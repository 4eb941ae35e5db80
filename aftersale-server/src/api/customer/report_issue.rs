use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use aftersale_core::workflow::intake;
use aftersale_sdk::objects::complaints::ReportIssueRequest;

use super::{CustomerApiError, to_complaint_response};
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `POST /orders/{order_id}/complaints` — report an order issue.
///
/// A not-received report also mints the apology store credit; its code
/// comes back on the complaint.
pub(super) async fn report_issue(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ReportIssueRequest>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let outcome = intake::report_issue(
        &state.db,
        &state.event_senders.mail,
        order_id,
        session.user_id,
        body.kind.into(),
        body.description,
    )
    .await?;

    Ok(Json(to_complaint_response(&outcome.complaint)))
}
