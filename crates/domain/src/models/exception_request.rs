//! Exception requests: approval to close a lead before the follow-up minimum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;

/// Follow-ups required before a lead may be closed without an exception.
pub const COMPLIANCE_TARGET: i32 = 3;

/// Review state of an exception request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for ExceptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ExceptionStatus::Pending),
            "approved" => Ok(ExceptionStatus::Approved),
            "rejected" => Ok(ExceptionStatus::Rejected),
            _ => Err(format!("Unknown exception status: {}", s)),
        }
    }
}

impl std::fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceptionStatus::Pending => write!(f, "pending"),
            ExceptionStatus::Approved => write!(f, "approved"),
            ExceptionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Reason code given when requesting an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionReason {
    DuplicateLead,
    InvalidContactDetails,
    BookedElsewhere,
    NotEligible,
    Other,
}

impl FromStr for ExceptionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duplicate_lead" => Ok(ExceptionReason::DuplicateLead),
            "invalid_contact_details" => Ok(ExceptionReason::InvalidContactDetails),
            "booked_elsewhere" => Ok(ExceptionReason::BookedElsewhere),
            "not_eligible" => Ok(ExceptionReason::NotEligible),
            "other" => Ok(ExceptionReason::Other),
            _ => Err(format!("Unknown exception reason: {}", s)),
        }
    }
}

impl std::fmt::Display for ExceptionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExceptionReason::DuplicateLead => "duplicate_lead",
            ExceptionReason::InvalidContactDetails => "invalid_contact_details",
            ExceptionReason::BookedElsewhere => "booked_elsewhere",
            ExceptionReason::NotEligible => "not_eligible",
            ExceptionReason::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Represents an exception request on a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExceptionRequest {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub status: ExceptionStatus,
    pub reason: ExceptionReason,
    pub justification: Option<String>,
    pub requested_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a lead may move to `closed`.
///
/// True once the lead has reached the follow-up minimum, or when an
/// approved exception exists for it.
pub fn can_close(followup_count: i32, exception: Option<&ExceptionRequest>) -> bool {
    followup_count >= COMPLIANCE_TARGET
        || exception.is_some_and(|e| e.status == ExceptionStatus::Approved)
}

/// Errors raised by the exception workflow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExceptionRequestError {
    #[error("A justification is required when the reason is 'other'")]
    JustificationRequired,

    #[error("Only admins and managers can review exception requests")]
    NotPermitted,

    #[error("Exception request has already been {0}")]
    AlreadyReviewed(ExceptionStatus),
}

/// Request payload for filing an exception.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateExceptionRequest {
    pub reason: ExceptionReason,

    #[validate(length(max = 2000, message = "Justification must be at most 2000 characters"))]
    pub justification: Option<String>,
}

impl CreateExceptionRequest {
    /// Enforces the justification rule for `other`.
    pub fn check(&self) -> Result<(), ExceptionRequestError> {
        if self.reason == ExceptionReason::Other {
            let has_text = self
                .justification
                .as_deref()
                .is_some_and(|j| !j.trim().is_empty());
            if !has_text {
                return Err(ExceptionRequestError::JustificationRequired);
            }
        }
        Ok(())
    }
}

/// Decision taken by a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn resulting_status(&self) -> ExceptionStatus {
        match self {
            ReviewDecision::Approve => ExceptionStatus::Approved,
            ReviewDecision::Reject => ExceptionStatus::Rejected,
        }
    }
}

/// Request payload for reviewing an exception.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ReviewExceptionRequest {
    pub decision: ReviewDecision,

    #[validate(length(max = 2000, message = "Review note must be at most 2000 characters"))]
    pub review_note: Option<String>,
}

/// Checks the caller may review `request` and returns the new status.
pub fn check_review(
    ctx: &RequestContext,
    request: &ExceptionRequest,
    decision: ReviewDecision,
) -> Result<ExceptionStatus, ExceptionRequestError> {
    if !ctx.is_elevated() {
        return Err(ExceptionRequestError::NotPermitted);
    }
    if request.status != ExceptionStatus::Pending {
        return Err(ExceptionRequestError::AlreadyReviewed(request.status));
    }
    Ok(decision.resulting_status())
}

/// Query parameters for listing exception requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListExceptionRequestsQuery {
    pub status: Option<ExceptionStatus>,
}

/// Response payload for an exception request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExceptionRequestResponse {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub status: ExceptionStatus,
    pub reason: ExceptionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    pub requested_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ExceptionRequest> for ExceptionRequestResponse {
    fn from(e: ExceptionRequest) -> Self {
        Self {
            id: e.id,
            lead_id: e.lead_id,
            status: e.status,
            reason: e.reason,
            justification: e.justification,
            requested_by: e.requested_by,
            reviewed_by: e.reviewed_by,
            review_note: e.review_note,
            reviewed_at: e.reviewed_at,
            created_at: e.created_at,
        }
    }
}

/// Response for listing exception requests.
#[derive(Debug, Clone, Serialize)]
pub struct ListExceptionRequestsResponse {
    pub exception_requests: Vec<ExceptionRequestResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::UserRole;

    fn request_with(status: ExceptionStatus) -> ExceptionRequest {
        let now = Utc::now();
        ExceptionRequest {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            status,
            reason: ExceptionReason::DuplicateLead,
            justification: None,
            requested_by: Uuid::new_v4(),
            reviewed_by: None,
            review_note: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ctx(role: UserRole) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), role, "2025/2026", "GBP")
    }

    #[test]
    fn test_approved_exception_allows_close() {
        let approved = request_with(ExceptionStatus::Approved);
        assert!(can_close(1, Some(&approved)));
    }

    #[test]
    fn test_pending_or_absent_exception_blocks_close() {
        let pending = request_with(ExceptionStatus::Pending);
        let rejected = request_with(ExceptionStatus::Rejected);
        assert!(!can_close(1, Some(&pending)));
        assert!(!can_close(1, Some(&rejected)));
        assert!(!can_close(1, None));
    }

    #[test]
    fn test_compliance_target_allows_close() {
        assert!(can_close(3, None));
        assert!(can_close(7, None));
        assert!(!can_close(2, None));
    }

    #[test]
    fn test_other_requires_justification() {
        let missing = CreateExceptionRequest {
            reason: ExceptionReason::Other,
            justification: None,
        };
        assert_eq!(
            missing.check(),
            Err(ExceptionRequestError::JustificationRequired)
        );

        let blank = CreateExceptionRequest {
            reason: ExceptionReason::Other,
            justification: Some("   ".into()),
        };
        assert!(blank.check().is_err());

        let given = CreateExceptionRequest {
            reason: ExceptionReason::Other,
            justification: Some("Student withdrew from university".into()),
        };
        assert!(given.check().is_ok());
    }

    #[test]
    fn test_coded_reasons_need_no_justification() {
        let request = CreateExceptionRequest {
            reason: ExceptionReason::BookedElsewhere,
            justification: None,
        };
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_review_requires_elevated_role() {
        let pending = request_with(ExceptionStatus::Pending);
        assert_eq!(
            check_review(&ctx(UserRole::Staff), &pending, ReviewDecision::Approve),
            Err(ExceptionRequestError::NotPermitted)
        );
        assert_eq!(
            check_review(&ctx(UserRole::Manager), &pending, ReviewDecision::Approve),
            Ok(ExceptionStatus::Approved)
        );
        assert_eq!(
            check_review(&ctx(UserRole::Admin), &pending, ReviewDecision::Reject),
            Ok(ExceptionStatus::Rejected)
        );
    }

    #[test]
    fn test_only_pending_can_be_reviewed() {
        let approved = request_with(ExceptionStatus::Approved);
        assert_eq!(
            check_review(&ctx(UserRole::Admin), &approved, ReviewDecision::Reject),
            Err(ExceptionRequestError::AlreadyReviewed(
                ExceptionStatus::Approved
            ))
        );
    }

    #[test]
    fn test_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&ExceptionReason::InvalidContactDetails).unwrap(),
            "\"invalid_contact_details\""
        );
        assert_eq!(
            "not_eligible".parse::<ExceptionReason>().unwrap(),
            ExceptionReason::NotEligible
        );
    }
}
