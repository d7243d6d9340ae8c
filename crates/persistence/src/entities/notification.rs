//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub metadata: Json<serde_json::Value>,
    pub lead_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::Notification {
        use domain::models::notification::NotificationType;

        let notification_type = self
            .notification_type
            .parse::<NotificationType>()
            .unwrap_or(NotificationType::StatusChanged);

        domain::models::Notification {
            id: self.id,
            user_id: self.user_id,
            notification_type,
            title: self.title,
            message: self.message,
            link: self.link,
            metadata: self.metadata.0,
            lead_id: self.lead_id,
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

impl From<NotificationEntity> for domain::models::Notification {
    fn from(entity: NotificationEntity) -> Self {
        entity.into_domain()
    }
}
