//! Follow-up reminder entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct FollowupReminderEntity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub reminder_date: DateTime<Utc>,
    pub is_sent: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<FollowupReminderEntity> for domain::models::FollowupReminder {
    fn from(entity: FollowupReminderEntity) -> Self {
        domain::models::FollowupReminder {
            id: entity.id,
            lead_id: entity.lead_id,
            user_id: entity.user_id,
            reminder_date: entity.reminder_date,
            is_sent: entity.is_sent,
            is_dismissed: entity.is_dismissed,
            created_at: entity.created_at,
        }
    }
}
