use axum::{Json, extract::State, response::IntoResponse};

use aftersale_core::entities::notifications::Notification;
use aftersale_core::entities::users::User;
use aftersale_core::events::MailEvent;
use aftersale_sdk::objects::notifications::{BulkNotificationRequest, BulkNotificationResult};

use super::AdminApiError;
use crate::api::extractors::SuperAdminAuth;
use crate::state::AppState;

/// `POST /notifications/bulk` — broadcast to every user (super_admin only).
///
/// Inserts one in-app row per user in a single statement; with
/// `send_email` set, the message is also fanned out over transactional
/// email. Email enqueueing uses the blocking send so a large user base
/// applies backpressure instead of dropping mail.
pub(super) async fn bulk_notify(
    State(state): State<AppState>,
    SuperAdminAuth(session): SuperAdminAuth,
    Json(body): Json<BulkNotificationRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    tracing::info!(
        staff = %session.email,
        title = %body.title,
        send_email = body.send_email,
        "Broadcasting notification"
    );

    let recipients = Notification::insert_for_all_users(
        &state.db,
        &body.title,
        &body.message,
        body.kind.into(),
        body.link.as_deref(),
    )
    .await
    .map_err(AdminApiError::Database)?;

    if body.send_email {
        let emails = User::all_emails(&state.db)
            .await
            .map_err(AdminApiError::Database)?;
        for to in emails {
            let event = MailEvent::Broadcast {
                to,
                subject: body.title.clone(),
                body: body.message.clone(),
            };
            if state.event_senders.mail.send(event).await.is_err() {
                tracing::warn!("Mailer channel closed mid-broadcast");
                break;
            }
        }
    }

    Ok(Json(BulkNotificationResult { recipients }))
}
