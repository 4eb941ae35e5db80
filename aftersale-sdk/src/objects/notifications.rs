//! In-app notification types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NotificationKind;

/// A single in-app notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: i64,
}

/// Body of `POST /admin/notifications/bulk` (super_admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkNotificationRequest {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(default)]
    pub link: Option<String>,
    /// Also fan the message out over transactional email.
    #[serde(default)]
    pub send_email: bool,
}

/// Outcome of a bulk send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkNotificationResult {
    pub recipients: u64,
}
