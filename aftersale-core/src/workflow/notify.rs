//! Notification fan-out helpers.
//!
//! The in-app row is written synchronously; email goes over the event
//! channel to the mailer and never blocks or fails the caller.

use tracing::warn;
use uuid::Uuid;

use crate::entities::NotificationKind;
use crate::entities::notifications::Notification;
use crate::entities::users::User;
use crate::events::{MailEvent, MailEventSender};

/// Insert an in-app notification row for one user.
pub async fn notify(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    title: &str,
    message: &str,
    kind: NotificationKind,
    link: Option<&str>,
) -> Result<(), sqlx::Error> {
    Notification::insert(pool, user_id, title, message, kind, link).await?;
    Ok(())
}

/// Queue an email, dropping it if the channel is full or closed.
pub fn send_mail(mail_tx: &MailEventSender, event: MailEvent) {
    if let Err(e) = mail_tx.try_send(event) {
        warn!(error = %e, "Mail channel unavailable, dropping email");
    }
}

/// Queue an email for a user id, resolving their address first.
pub async fn email_user(
    pool: &sqlx::PgPool,
    mail_tx: &MailEventSender,
    user_id: Uuid,
    build: impl FnOnce(String) -> MailEvent,
) -> Result<(), sqlx::Error> {
    if let Some(email) = User::email_of(pool, user_id).await? {
        send_mail(mail_tx, build(email));
    }
    Ok(())
}
