//! Follow-up domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::lead::Lead;

/// Number of days after `followup_date` during which a follow-up may be deleted.
pub const DELETION_WINDOW_DAYS: i64 = 7;

/// Channel used for a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpType {
    Call,
    Email,
    Whatsapp,
    InPerson,
    Other,
}

impl FollowUpType {
    pub fn all() -> [FollowUpType; 5] {
        [
            FollowUpType::Call,
            FollowUpType::Email,
            FollowUpType::Whatsapp,
            FollowUpType::InPerson,
            FollowUpType::Other,
        ]
    }
}

impl FromStr for FollowUpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" => Ok(FollowUpType::Call),
            "email" => Ok(FollowUpType::Email),
            "whatsapp" => Ok(FollowUpType::Whatsapp),
            "in_person" => Ok(FollowUpType::InPerson),
            "other" => Ok(FollowUpType::Other),
            _ => Err(format!("Unknown follow-up type: {}", s)),
        }
    }
}

impl std::fmt::Display for FollowUpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUpType::Call => write!(f, "call"),
            FollowUpType::Email => write!(f, "email"),
            FollowUpType::Whatsapp => write!(f, "whatsapp"),
            FollowUpType::InPerson => write!(f, "in_person"),
            FollowUpType::Other => write!(f, "other"),
        }
    }
}

/// Result of a follow-up attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpOutcome {
    Contacted,
    NoAnswer,
    Voicemail,
    NotInterested,
    Interested,
    CallbackRequested,
    WrongContactInfo,
}

impl FollowUpOutcome {
    /// Outcomes counted as a response from the lead.
    pub fn is_response(&self) -> bool {
        matches!(self, FollowUpOutcome::Contacted | FollowUpOutcome::Interested)
    }
}

impl FromStr for FollowUpOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contacted" => Ok(FollowUpOutcome::Contacted),
            "no_answer" => Ok(FollowUpOutcome::NoAnswer),
            "voicemail" => Ok(FollowUpOutcome::Voicemail),
            "not_interested" => Ok(FollowUpOutcome::NotInterested),
            "interested" => Ok(FollowUpOutcome::Interested),
            "callback_requested" => Ok(FollowUpOutcome::CallbackRequested),
            "wrong_contact_info" => Ok(FollowUpOutcome::WrongContactInfo),
            _ => Err(format!("Unknown follow-up outcome: {}", s)),
        }
    }
}

impl std::fmt::Display for FollowUpOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FollowUpOutcome::Contacted => "contacted",
            FollowUpOutcome::NoAnswer => "no_answer",
            FollowUpOutcome::Voicemail => "voicemail",
            FollowUpOutcome::NotInterested => "not_interested",
            FollowUpOutcome::Interested => "interested",
            FollowUpOutcome::CallbackRequested => "callback_requested",
            FollowUpOutcome::WrongContactInfo => "wrong_contact_info",
        };
        write!(f, "{}", s)
    }
}

/// A logged contact attempt against a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FollowUp {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub followup_number: i32,
    pub followup_type: FollowUpType,
    pub outcome: FollowUpOutcome,
    pub followup_date: DateTime<Utc>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Number the next follow-up on a lead receives.
///
/// Numbers come from the lead's counter, which deletions never decrement,
/// so a sequence can contain gaps.
pub fn next_followup_number(current_count: i32) -> i32 {
    current_count.max(0) + 1
}

/// Fields needed to insert a follow-up.
#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub lead_id: Uuid,
    pub followup_type: FollowUpType,
    pub outcome: FollowUpOutcome,
    pub followup_date: DateTime<Utc>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Request payload for logging a follow-up.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateFollowUpRequest {
    pub followup_type: FollowUpType,
    pub outcome: FollowUpOutcome,

    /// Defaults to now.
    pub followup_date: Option<DateTime<Utc>>,

    pub next_action_date: Option<DateTime<Utc>>,

    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

impl CreateFollowUpRequest {
    pub fn into_new_followup(self, lead_id: Uuid, created_by: Uuid, now: DateTime<Utc>) -> NewFollowUp {
        NewFollowUp {
            lead_id,
            followup_type: self.followup_type,
            outcome: self.outcome,
            followup_date: self.followup_date.unwrap_or(now),
            next_action_date: self.next_action_date,
            notes: self.notes,
            created_by,
        }
    }
}

/// Reasons a follow-up deletion is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FollowUpDeletionError {
    #[error("Only admins and managers can delete follow-ups")]
    NotPermitted,

    #[error("Follow-ups can only be deleted within {DELETION_WINDOW_DAYS} days")]
    WindowElapsed,
}

/// Checks whether the caller may delete `followup` at `now`.
pub fn check_deletion(
    ctx: &RequestContext,
    followup: &FollowUp,
    now: DateTime<Utc>,
) -> Result<(), FollowUpDeletionError> {
    if !ctx.is_elevated() {
        return Err(FollowUpDeletionError::NotPermitted);
    }
    if now - followup.followup_date > Duration::days(DELETION_WINDOW_DAYS) {
        return Err(FollowUpDeletionError::WindowElapsed);
    }
    Ok(())
}

/// Response payload for a follow-up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FollowUpResponse {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub followup_number: i32,
    pub followup_type: FollowUpType,
    pub outcome: FollowUpOutcome,
    pub followup_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FollowUp> for FollowUpResponse {
    fn from(f: FollowUp) -> Self {
        Self {
            id: f.id,
            lead_id: f.lead_id,
            followup_number: f.followup_number,
            followup_type: f.followup_type,
            outcome: f.outcome,
            followup_date: f.followup_date,
            next_action_date: f.next_action_date,
            notes: f.notes,
            created_by: f.created_by,
            created_at: f.created_at,
        }
    }
}

/// Response for listing a lead's follow-ups.
#[derive(Debug, Clone, Serialize)]
pub struct ListFollowUpsResponse {
    pub followups: Vec<FollowUpResponse>,
}

/// A lead together with its follow-ups, the input shape for analytics.
#[derive(Debug, Clone)]
pub struct LeadWithFollowUps {
    pub lead: Lead,
    pub followups: Vec<FollowUp>,
}

impl LeadWithFollowUps {
    pub fn new(lead: Lead, followups: Vec<FollowUp>) -> Self {
        Self { lead, followups }
    }

    /// Follow-up dates in ascending order.
    pub fn sorted_followup_dates(&self) -> Vec<DateTime<Utc>> {
        let mut dates: Vec<_> = self.followups.iter().map(|f| f.followup_date).collect();
        dates.sort();
        dates
    }
}
