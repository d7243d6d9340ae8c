//! Lead note entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct LeadNoteEntity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub author: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<LeadNoteEntity> for domain::models::LeadNote {
    fn from(entity: LeadNoteEntity) -> Self {
        domain::models::LeadNote {
            id: entity.id,
            lead_id: entity.lead_id,
            author: entity.author,
            body: entity.body,
            created_at: entity.created_at,
        }
    }
}
