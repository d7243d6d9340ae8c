//! Calendar event repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::calendar_event::NewCalendarEvent;

use crate::entities::CalendarEventEntity;
use crate::metrics::QueryTimer;

/// Repository for calendar event database operations.
#[derive(Clone)]
pub struct CalendarEventRepository {
    pool: PgPool,
}

impl CalendarEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, event: &NewCalendarEvent) -> Result<CalendarEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_calendar_event");

        let result = sqlx::query_as::<_, CalendarEventEntity>(
            r#"
            INSERT INTO calendar_events (lead_id, title, event_type, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, lead_id, title, event_type, starts_at, ends_at, created_at
            "#,
        )
        .bind(event.lead_id)
        .bind(&event.title)
        .bind(event.event_type.to_string())
        .bind(event.starts_at)
        .bind(event.ends_at)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<CalendarEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_calendar_events");

        let result = sqlx::query_as::<_, CalendarEventEntity>(
            r#"
            SELECT id, lead_id, title, event_type, starts_at, ends_at, created_at
            FROM calendar_events
            WHERE lead_id = $1
            ORDER BY starts_at ASC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }
}
