//! Calendar event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CalendarEventEntity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub title: String,
    pub event_type: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CalendarEventEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::CalendarEvent {
        use domain::models::calendar_event::CalendarEventType;

        let event_type = self
            .event_type
            .parse::<CalendarEventType>()
            .unwrap_or(CalendarEventType::Viewing);

        domain::models::CalendarEvent {
            id: self.id,
            lead_id: self.lead_id,
            title: self.title,
            event_type,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            created_at: self.created_at,
        }
    }
}

impl From<CalendarEventEntity> for domain::models::CalendarEvent {
    fn from(entity: CalendarEventEntity) -> Self {
        entity.into_domain()
    }
}
