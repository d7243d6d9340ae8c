//! Notification repository for database operations.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::notification::NewNotification;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Repository for notification database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert one notification.
    pub async fn create(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_notification");

        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, link, metadata, lead_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, notification_type, title, message, link, metadata, lead_id,
                is_read, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.notification_type.to_string())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(Json(&notification.metadata))
        .bind(notification.lead_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Insert several notifications in one transaction.
    pub async fn create_many(&self, notifications: &[NewNotification]) -> Result<u64, sqlx::Error> {
        if notifications.is_empty() {
            return Ok(0);
        }

        let timer = QueryTimer::new("create_notifications_batch");
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for notification in notifications {
            let result = sqlx::query(
                r#"
                INSERT INTO notifications (user_id, notification_type, title, message, link, metadata, lead_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(notification.user_id)
            .bind(notification.notification_type.to_string())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(&notification.link)
            .bind(Json(&notification.metadata))
            .bind(notification.lead_id)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        timer.record();
        Ok(inserted)
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications_for_user");

        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, user_id, notification_type, title, message, link, metadata, lead_id,
                is_read, created_at
            FROM notifications
            WHERE user_id = $1
              AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn count_unread(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_unread_notifications");

        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Mark one of the user's notifications read. Returns false when it does
    /// not exist or belongs to someone else.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_read");

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_all_notifications_read");

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND NOT is_read
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected())
    }
}
