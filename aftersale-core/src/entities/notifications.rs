use uuid::Uuid;

use crate::entities::NotificationKind;

/// An in-app notification row. Read/dismissed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: time::OffsetDateTime,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, link, read, created_at";

impl Notification {
    /// Insert a notification for one user.
    pub async fn insert(
        pool: &sqlx::PgPool,
        user_id: Uuid,
        title: &str,
        message: &str,
        kind: NotificationKind,
        link: Option<&str>,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (id, user_id, title, message, kind, link) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(link)
        .fetch_one(pool)
        .await
    }

    /// Insert one notification per registered user in a single statement.
    /// Returns the number of recipients.
    pub async fn insert_for_all_users(
        pool: &sqlx::PgPool,
        title: &str,
        message: &str,
        kind: NotificationKind,
        link: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, kind, link) \
             SELECT gen_random_uuid(), id, $1, $2, $3, $4 FROM users",
        )
        .bind(title)
        .bind(message)
        .bind(kind)
        .bind(link)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
