//! Follow-up reminder repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::notification::NewNotification;

use crate::entities::FollowupReminderEntity;
use crate::metrics::QueryTimer;

/// Repository for follow-up reminder database operations.
#[derive(Clone)]
pub struct FollowupReminderRepository {
    pool: PgPool,
}

impl FollowupReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a reminder and its in-app notification, unless the lead already
    /// has an outstanding reminder.
    ///
    /// The partial unique index on outstanding reminders makes this safe
    /// against overlapping runs. Returns `None` when nothing was created.
    pub async fn create_with_notification(
        &self,
        lead_id: Uuid,
        user_id: Uuid,
        reminder_date: DateTime<Utc>,
        notification: &NewNotification,
    ) -> Result<Option<FollowupReminderEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_followup_reminder");

        let mut tx = self.pool.begin().await?;

        let reminder = sqlx::query_as::<_, FollowupReminderEntity>(
            r#"
            INSERT INTO followup_reminders (lead_id, user_id, reminder_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (lead_id) WHERE NOT is_sent AND NOT is_dismissed DO NOTHING
            RETURNING id, lead_id, user_id, reminder_date, is_sent, is_dismissed, created_at
            "#,
        )
        .bind(lead_id)
        .bind(user_id)
        .bind(reminder_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reminder) = reminder else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        sqlx::query(
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

        tx.commit().await?;

        timer.record();
        Ok(Some(reminder))
    }

    pub async fn mark_sent(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_reminder_sent");

        let result = sqlx::query(
            r#"
            UPDATE followup_reminders SET is_sent = TRUE WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
