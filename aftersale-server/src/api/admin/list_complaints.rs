use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use kanau::processor::Processor;

use aftersale_core::entities::complaints::ListComplaints;
use aftersale_core::entities::orders::Order;
use aftersale_core::framework::DatabaseProcessor;
use aftersale_sdk::objects::admin::{ListComplaintsQuery, clamp_pagination};

use super::{AdminApiError, to_admin_response};
use crate::api::extractors::StaffAuth;
use crate::state::AppState;

/// `GET /complaints` — list complaints, newest first.
pub(super) async fn list_complaints(
    State(state): State<AppState>,
    StaffAuth(_session): StaffAuth,
    Query(query): Query<ListComplaintsQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let complaints = processor
        .process(ListComplaints {
            limit,
            offset,
            status: query.status.map(Into::into),
            kind: query.kind.map(Into::into),
            order_id: query.order_id,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let order_ids: Vec<_> = complaints.iter().map(|c| c.order_id).collect();
    let payment_methods: HashMap<_, _> = Order::payment_methods_for(&state.db, &order_ids)
        .await
        .map_err(AdminApiError::Database)?
        .into_iter()
        .collect();

    let out: Vec<_> = complaints
        .iter()
        .map(|c| to_admin_response(c, &payment_methods))
        .collect();
    Ok(Json(out))
}
