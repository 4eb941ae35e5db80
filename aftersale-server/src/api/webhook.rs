//! Inbound courier webhook.
//!
//! The aggregator posts shipment status changes here. Events are matched
//! to orders solely by `orders.shipment_id`; an event for a shipment we
//! did not book is acknowledged with 200 and logged, since the
//! aggregator retries anything else and the event will never match.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;

use aftersale_core::entities::orders::{GetOrderByShipmentId, Order};
use aftersale_core::framework::DatabaseProcessor;
use aftersale_core::workflow::resolution::ResolutionError;
use aftersale_sdk::objects::courier::{CourierEventKind, CourierWebhookPayload};

use crate::state::AppState;

/// Errors a webhook delivery can hit. Everything here maps to 5xx so
/// the aggregator retries the delivery.
#[derive(Debug)]
pub enum WebhookError {
    Database(sqlx::Error),
    Workflow(ResolutionError),
}

impl From<ResolutionError> for WebhookError {
    fn from(e: ResolutionError) -> Self {
        match e {
            ResolutionError::Db(e) => Self::Database(e),
            other => Self::Workflow(other),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebhookError::Database(e) => {
                tracing::error!(error = %e, "Courier webhook database error");
            }
            WebhookError::Workflow(e) => {
                tracing::error!(error = %e, "Courier webhook workflow error");
            }
        }
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// `POST /webhooks/courier` — apply a shipment status change.
pub async fn courier_webhook(
    State(state): State<AppState>,
    Json(payload): Json<CourierWebhookPayload>,
) -> Result<impl IntoResponse, WebhookError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let order = processor
        .process(GetOrderByShipmentId {
            shipment_id: payload.shipment_id.clone(),
        })
        .await
        .map_err(WebhookError::Database)?;

    let Some(order) = order else {
        tracing::info!(
            shipment_id = %payload.shipment_id,
            event = ?payload.event,
            "Courier event for unknown shipment, ignoring"
        );
        return Ok(StatusCode::OK);
    };

    match payload.event {
        CourierEventKind::Delivered => {
            Order::mark_delivered(&state.db, order.id)
                .await
                .map_err(WebhookError::Database)?;
            tracing::info!(order_id = %order.id, "Order delivered");
        }
        CourierEventKind::ReturnReceived => {
            state.refunds.handle_return_received(&order).await?;
        }
        CourierEventKind::InTransit | CourierEventKind::ReturnPickedUp => {
            tracing::debug!(
                order_id = %order.id,
                event = ?payload.event,
                "Courier status noted"
            );
        }
        CourierEventKind::Unknown => {
            tracing::info!(
                order_id = %order.id,
                shipment_id = %payload.shipment_id,
                "Unrecognized courier event, ignoring"
            );
        }
    }

    Ok(StatusCode::OK)
}
