//! Lead note repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::lead_note::NewLeadNote;

use crate::entities::LeadNoteEntity;
use crate::metrics::QueryTimer;

/// Repository for lead note database operations.
#[derive(Clone)]
pub struct LeadNoteRepository {
    pool: PgPool,
}

impl LeadNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, note: &NewLeadNote) -> Result<LeadNoteEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_lead_note");

        let result = sqlx::query_as::<_, LeadNoteEntity>(
            r#"
            INSERT INTO lead_notes (lead_id, author, body)
            VALUES ($1, $2, $3)
            RETURNING id, lead_id, author, body, created_at
            "#,
        )
        .bind(note.lead_id)
        .bind(note.author)
        .bind(&note.body)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        result
    }

    pub async fn list_for_lead(&self, lead_id: Uuid) -> Result<Vec<LeadNoteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_lead_notes");

        let result = sqlx::query_as::<_, LeadNoteEntity>(
            r#"
            SELECT id, lead_id, author, body, created_at
            FROM lead_notes
            WHERE lead_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }
}
