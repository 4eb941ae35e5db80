use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use uuid::Uuid;

use aftersale_core::entities::complaints::GetComplaintById;
use aftersale_core::framework::DatabaseProcessor;

use super::{CustomerApiError, to_complaint_response};
use crate::api::extractors::CustomerAuth;
use crate::state::AppState;

/// `GET /complaints/{complaint_id}` — poll the state of a complaint.
pub(super) async fn get_complaint(
    State(state): State<AppState>,
    CustomerAuth(session): CustomerAuth,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, CustomerApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let complaint = processor
        .process(GetComplaintById { complaint_id })
        .await
        .map_err(CustomerApiError::Database)?
        .filter(|c| c.user_id == session.user_id)
        .ok_or(CustomerApiError::NotFound)?;

    Ok(Json(to_complaint_response(&complaint)))
}
