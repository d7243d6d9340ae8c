//! Follow-up entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the followups table.
#[derive(Debug, Clone, FromRow)]
pub struct FollowUpEntity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub followup_number: i32,
    pub followup_type: String,
    pub outcome: String,
    pub followup_date: DateTime<Utc>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FollowUpEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::FollowUp {
        use domain::models::followup::{FollowUpOutcome, FollowUpType};

        let followup_type = self
            .followup_type
            .parse::<FollowUpType>()
            .unwrap_or(FollowUpType::Other);

        let outcome = self
            .outcome
            .parse::<FollowUpOutcome>()
            .unwrap_or(FollowUpOutcome::NoAnswer);

        domain::models::FollowUp {
            id: self.id,
            lead_id: self.lead_id,
            followup_number: self.followup_number,
            followup_type,
            outcome,
            followup_date: self.followup_date,
            next_action_date: self.next_action_date,
            notes: self.notes,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

impl From<FollowUpEntity> for domain::models::FollowUp {
    fn from(entity: FollowUpEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::followup::{FollowUpOutcome, FollowUpType};

    #[test]
    fn test_entity_to_domain() {
        let entity = FollowUpEntity {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            followup_number: 4,
            followup_type: "in_person".to_string(),
            outcome: "callback_requested".to_string(),
            followup_date: Utc::now(),
            next_action_date: None,
            notes: Some("Came to reception".to_string()),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let followup: domain::models::FollowUp = entity.clone().into();
        assert_eq!(followup.followup_number, 4);
        assert_eq!(followup.followup_type, FollowUpType::InPerson);
        assert_eq!(followup.outcome, FollowUpOutcome::CallbackRequested);
        assert_eq!(followup.lead_id, entity.lead_id);
    }
}
