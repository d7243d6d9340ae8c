//! Lead entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the leads table.
#[derive(Debug, Clone, FromRow)]
pub struct LeadEntity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub room_choice: String,
    pub stay_duration: String,
    pub lead_status: String,
    pub potential_revenue: f64,
    pub followup_count: i32,
    pub last_followup_date: Option<DateTime<Utc>>,
    pub next_followup_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub academic_year: String,
    pub is_hot: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::Lead {
        use domain::models::lead::{LeadStatus, RoomChoice, StayDuration};

        let room_choice = self
            .room_choice
            .parse::<RoomChoice>()
            .unwrap_or(RoomChoice::Standard);

        let stay_duration = self
            .stay_duration
            .parse::<StayDuration>()
            .unwrap_or(StayDuration::ShortStay);

        let lead_status = self
            .lead_status
            .parse::<LeadStatus>()
            .unwrap_or(LeadStatus::New);

        domain::models::Lead {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            source: self.source,
            room_choice,
            stay_duration,
            lead_status,
            potential_revenue: self.potential_revenue,
            followup_count: self.followup_count,
            last_followup_date: self.last_followup_date,
            next_followup_date: self.next_followup_date,
            assigned_to: self.assigned_to,
            academic_year: self.academic_year,
            is_hot: self.is_hot,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<LeadEntity> for domain::models::Lead {
    fn from(entity: LeadEntity) -> Self {
        entity.into_domain()
    }
}
