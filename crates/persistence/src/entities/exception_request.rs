//! Exception request entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the exception_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct ExceptionRequestEntity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub status: String,
    pub reason: String,
    pub justification: Option<String>,
    pub requested_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExceptionRequestEntity {
    /// Convert to domain model.
    ///
    /// An unreadable status maps to `pending` so it never grants a close.
    pub fn into_domain(self) -> domain::models::ExceptionRequest {
        use domain::models::exception_request::{ExceptionReason, ExceptionStatus};

        let status = self
            .status
            .parse::<ExceptionStatus>()
            .unwrap_or(ExceptionStatus::Pending);

        let reason = self
            .reason
            .parse::<ExceptionReason>()
            .unwrap_or(ExceptionReason::Other);

        domain::models::ExceptionRequest {
            id: self.id,
            lead_id: self.lead_id,
            status,
            reason,
            justification: self.justification,
            requested_by: self.requested_by,
            reviewed_by: self.reviewed_by,
            review_note: self.review_note,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ExceptionRequestEntity> for domain::models::ExceptionRequest {
    fn from(entity: ExceptionRequestEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::exception_request::{ExceptionReason, ExceptionStatus};

    #[test]
    fn test_unknown_status_is_pending() {
        let entity = ExceptionRequestEntity {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            status: "escalated".to_string(),
            reason: "booked_elsewhere".to_string(),
            justification: None,
            requested_by: Uuid::new_v4(),
            reviewed_by: None,
            review_note: None,
            reviewed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let request = entity.into_domain();
        assert_eq!(request.status, ExceptionStatus::Pending);
        assert_eq!(request.reason, ExceptionReason::BookedElsewhere);
    }
}
