//! Lead domain model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::exception_request::ExceptionRequestResponse;
use super::followup::FollowUpResponse;

/// Funnel position of a lead.
///
/// `new → awaiting_outreach → low_engagement | high_interest → converted | closed`.
/// `converted` and `closed` are terminal and reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    AwaitingOutreach,
    LowEngagement,
    HighInterest,
    Converted,
    Closed,
}

impl LeadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Converted | LeadStatus::Closed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Re-applying the current status is accepted as a no-op.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;

        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }

        match (self, next) {
            (_, Converted) | (_, Closed) => true,
            (New, AwaitingOutreach) => true,
            (New | AwaitingOutreach, LowEngagement | HighInterest) => true,
            (LowEngagement, HighInterest) | (HighInterest, LowEngagement) => true,
            _ => false,
        }
    }

    /// Validates a transition, returning a descriptive error when refused.
    pub fn transition(&self, next: LeadStatus) -> Result<LeadStatus, LeadStatusError> {
        if self.is_terminal() && *self != next {
            return Err(LeadStatusError::Terminal(*self));
        }
        if !self.can_transition_to(next) {
            return Err(LeadStatusError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        Ok(next)
    }

    pub fn all() -> [LeadStatus; 6] {
        [
            LeadStatus::New,
            LeadStatus::AwaitingOutreach,
            LeadStatus::LowEngagement,
            LeadStatus::HighInterest,
            LeadStatus::Converted,
            LeadStatus::Closed,
        ]
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "awaiting_outreach" => Ok(LeadStatus::AwaitingOutreach),
            "low_engagement" => Ok(LeadStatus::LowEngagement),
            "high_interest" => Ok(LeadStatus::HighInterest),
            "converted" => Ok(LeadStatus::Converted),
            "closed" => Ok(LeadStatus::Closed),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::AwaitingOutreach => write!(f, "awaiting_outreach"),
            LeadStatus::LowEngagement => write!(f, "low_engagement"),
            LeadStatus::HighInterest => write!(f, "high_interest"),
            LeadStatus::Converted => write!(f, "converted"),
            LeadStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Errors raised by the lead status state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeadStatusError {
    #[error("Lead is {0} and can no longer change status")]
    Terminal(LeadStatus),

    #[error("Cannot move lead from {from} to {to}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("Lead has {followup_count} of 3 required follow-ups and no approved exception")]
    CloseNotAllowed { followup_count: i32 },
}

/// Room tier chosen on the enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomChoice {
    Platinum,
    Gold,
    Silver,
    Standard,
}

impl RoomChoice {
    /// Weekly rent for the tier.
    pub fn weekly_rate(&self) -> f64 {
        match self {
            RoomChoice::Platinum => 329.0,
            RoomChoice::Gold => 299.0,
            RoomChoice::Silver => 279.0,
            RoomChoice::Standard => 249.0,
        }
    }

    /// Maps free text such as "Gold Suite" onto a tier; unknown text is `standard`.
    pub fn from_free_text(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("platinum") {
            RoomChoice::Platinum
        } else if lower.contains("gold") {
            RoomChoice::Gold
        } else if lower.contains("silver") {
            RoomChoice::Silver
        } else {
            RoomChoice::Standard
        }
    }
}

impl FromStr for RoomChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "platinum" => Ok(RoomChoice::Platinum),
            "gold" => Ok(RoomChoice::Gold),
            "silver" => Ok(RoomChoice::Silver),
            "standard" => Ok(RoomChoice::Standard),
            _ => Err(format!("Unknown room choice: {}", s)),
        }
    }
}

impl std::fmt::Display for RoomChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomChoice::Platinum => write!(f, "platinum"),
            RoomChoice::Gold => write!(f, "gold"),
            RoomChoice::Silver => write!(f, "silver"),
            RoomChoice::Standard => write!(f, "standard"),
        }
    }
}

/// Tenancy length requested on the enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayDuration {
    #[serde(rename = "51_weeks")]
    FiftyOneWeeks,
    #[serde(rename = "45_weeks")]
    FortyFiveWeeks,
    #[serde(rename = "short_stay")]
    ShortStay,
}

impl StayDuration {
    pub fn weeks(&self) -> u32 {
        match self {
            StayDuration::FiftyOneWeeks => 51,
            StayDuration::FortyFiveWeeks => 45,
            StayDuration::ShortStay => 12,
        }
    }

    /// Maps free text such as "45 weeks" onto a duration; anything else is a short stay.
    pub fn from_free_text(raw: &str) -> Self {
        if raw.contains("51") {
            StayDuration::FiftyOneWeeks
        } else if raw.contains("45") {
            StayDuration::FortyFiveWeeks
        } else {
            StayDuration::ShortStay
        }
    }
}

impl FromStr for StayDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "51_weeks" => Ok(StayDuration::FiftyOneWeeks),
            "45_weeks" => Ok(StayDuration::FortyFiveWeeks),
            "short_stay" => Ok(StayDuration::ShortStay),
            _ => Err(format!("Unknown stay duration: {}", s)),
        }
    }
}

impl std::fmt::Display for StayDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StayDuration::FiftyOneWeeks => write!(f, "51_weeks"),
            StayDuration::FortyFiveWeeks => write!(f, "45_weeks"),
            StayDuration::ShortStay => write!(f, "short_stay"),
        }
    }
}

/// Contract value of a room tier over a stay duration.
pub fn contract_value(room: RoomChoice, stay: StayDuration) -> f64 {
    room.weekly_rate() * stay.weeks() as f64
}

/// Revenue a lead carries once it sits in `status`.
///
/// Only converted leads carry revenue; every other status zeroes it.
pub fn revenue_for_status(status: LeadStatus, room: RoomChoice, stay: StayDuration) -> f64 {
    if status == LeadStatus::Converted {
        contract_value(room, stay)
    } else {
        0.0
    }
}

/// Represents a lead in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Lead {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub room_choice: RoomChoice,
    pub stay_duration: StayDuration,
    pub lead_status: LeadStatus,
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

/// Fields needed to insert a lead.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub room_choice: RoomChoice,
    pub stay_duration: StayDuration,
    pub lead_status: LeadStatus,
    pub potential_revenue: f64,
    pub assigned_to: Option<Uuid>,
    pub academic_year: String,
    pub is_hot: bool,
    pub notes: Option<String>,
}

/// Request payload for creating a lead by hand.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Source must be 1-64 characters"))]
    pub source: String,

    #[serde(default = "default_room_choice")]
    pub room_choice: RoomChoice,

    #[serde(default = "default_stay_duration")]
    pub stay_duration: StayDuration,

    pub assigned_to: Option<Uuid>,

    /// Defaults to the caller's academic year.
    #[validate(custom(function = "shared::validation::validate_academic_year"))]
    pub academic_year: Option<String>,

    #[serde(default)]
    pub is_hot: bool,

    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

fn default_room_choice() -> RoomChoice {
    RoomChoice::Standard
}

fn default_stay_duration() -> StayDuration {
    StayDuration::ShortStay
}

impl CreateLeadRequest {
    /// Builds the insert shape, placing the lead in `new`.
    pub fn into_new_lead(self, default_academic_year: &str) -> NewLead {
        NewLead {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            source: self.source,
            room_choice: self.room_choice,
            stay_duration: self.stay_duration,
            lead_status: LeadStatus::New,
            potential_revenue: 0.0,
            assigned_to: self.assigned_to,
            academic_year: self
                .academic_year
                .unwrap_or_else(|| default_academic_year.to_string()),
            is_hot: self.is_hot,
            notes: self.notes,
        }
    }
}

/// Request payload for moving a lead to another status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateLeadStatusRequest {
    pub status: LeadStatus,
}

/// Request payload for (re)assigning a lead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssignLeadRequest {
    pub assigned_to: Option<Uuid>,
}

/// Request payload for toggling the hot flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetHotRequest {
    pub is_hot: bool,
}

/// Query parameters for listing leads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListLeadsQuery {
    pub academic_year: Option<String>,
    pub status: Option<LeadStatus>,
    pub assigned_to: Option<Uuid>,
    pub is_hot: Option<bool>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// Response payload for a lead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LeadResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub room_choice: RoomChoice,
    pub stay_duration: StayDuration,
    pub lead_status: LeadStatus,
    pub potential_revenue: f64,
    pub followup_count: i32,
    pub last_followup_date: Option<DateTime<Utc>>,
    pub next_followup_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub academic_year: String,
    pub is_hot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadResponse {
    fn from(l: Lead) -> Self {
        Self {
            id: l.id,
            full_name: l.full_name,
            email: l.email,
            phone: l.phone,
            source: l.source,
            room_choice: l.room_choice,
            stay_duration: l.stay_duration,
            lead_status: l.lead_status,
            potential_revenue: l.potential_revenue,
            followup_count: l.followup_count,
            last_followup_date: l.last_followup_date,
            next_followup_date: l.next_followup_date,
            assigned_to: l.assigned_to,
            academic_year: l.academic_year,
            is_hot: l.is_hot,
            notes: l.notes,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Response for listing leads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListLeadsResponse {
    pub leads: Vec<LeadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// A lead with its follow-up history and exception request, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LeadDetailResponse {
    #[serde(flatten)]
    pub lead: LeadResponse,
    pub followups: Vec<FollowUpResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_request: Option<ExceptionRequestResponse>,
    pub can_close: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        use LeadStatus::*;
        assert!(New.can_transition_to(AwaitingOutreach));
        assert!(AwaitingOutreach.can_transition_to(LowEngagement));
        assert!(AwaitingOutreach.can_transition_to(HighInterest));
        assert!(HighInterest.can_transition_to(Converted));
        assert!(LowEngagement.can_transition_to(Closed));
    }

    #[test]
    fn test_terminal_reachable_from_any_open_state() {
        for status in LeadStatus::all() {
            if status.is_terminal() {
                continue;
            }
            assert!(status.can_transition_to(LeadStatus::Converted));
            assert!(status.can_transition_to(LeadStatus::Closed));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [LeadStatus::Converted, LeadStatus::Closed] {
            for to in LeadStatus::all() {
                if to == from {
                    continue;
                }
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
                assert_eq!(from.transition(to), Err(LeadStatusError::Terminal(from)));
            }
        }
    }

    #[test]
    fn test_backwards_moves_rejected() {
        use LeadStatus::*;
        assert!(!AwaitingOutreach.can_transition_to(New));
        assert!(!HighInterest.can_transition_to(AwaitingOutreach));
        assert_eq!(
            LowEngagement.transition(New),
            Err(LeadStatusError::InvalidTransition {
                from: LowEngagement,
                to: New
            })
        );
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in LeadStatus::all() {
            assert_eq!(status.transition(status), Ok(status));
        }
    }

    #[test]
    fn test_engagement_states_interchange() {
        assert!(LeadStatus::LowEngagement.can_transition_to(LeadStatus::HighInterest));
        assert!(LeadStatus::HighInterest.can_transition_to(LeadStatus::LowEngagement));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LeadStatus::AwaitingOutreach).unwrap(),
            "\"awaiting_outreach\""
        );
        let parsed: LeadStatus = serde_json::from_str("\"high_interest\"").unwrap();
        assert_eq!(parsed, LeadStatus::HighInterest);
    }

    #[test]
    fn test_status_from_str_roundtrips_display() {
        for status in LeadStatus::all() {
            assert_eq!(status.to_string().parse::<LeadStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_room_choice_from_free_text() {
        assert_eq!(RoomChoice::from_free_text("Gold Suite"), RoomChoice::Gold);
        assert_eq!(RoomChoice::from_free_text("PLATINUM studio"), RoomChoice::Platinum);
        assert_eq!(RoomChoice::from_free_text("silver"), RoomChoice::Silver);
        assert_eq!(RoomChoice::from_free_text("Ensuite"), RoomChoice::Standard);
        assert_eq!(RoomChoice::from_free_text(""), RoomChoice::Standard);
    }

    #[test]
    fn test_stay_duration_from_free_text() {
        assert_eq!(
            StayDuration::from_free_text("51 weeks"),
            StayDuration::FiftyOneWeeks
        );
        assert_eq!(
            StayDuration::from_free_text("45 Week tenancy"),
            StayDuration::FortyFiveWeeks
        );
        assert_eq!(
            StayDuration::from_free_text("summer only"),
            StayDuration::ShortStay
        );
    }

    #[test]
    fn test_stay_duration_serialization() {
        assert_eq!(
            serde_json::to_string(&StayDuration::FortyFiveWeeks).unwrap(),
            "\"45_weeks\""
        );
        let parsed: StayDuration = serde_json::from_str("\"short_stay\"").unwrap();
        assert_eq!(parsed, StayDuration::ShortStay);
    }

    #[test]
    fn test_revenue_only_for_converted() {
        for status in LeadStatus::all() {
            let revenue =
                revenue_for_status(status, RoomChoice::Gold, StayDuration::FortyFiveWeeks);
            if status == LeadStatus::Converted {
                assert_eq!(revenue, 299.0 * 45.0);
            } else {
                assert_eq!(revenue, 0.0);
            }
        }
    }

    #[test]
    fn test_contract_value() {
        assert_eq!(
            contract_value(RoomChoice::Platinum, StayDuration::FiftyOneWeeks),
            329.0 * 51.0
        );
        assert_eq!(
            contract_value(RoomChoice::Standard, StayDuration::ShortStay),
            249.0 * 12.0
        );
    }

    #[test]
    fn test_create_lead_request_defaults() {
        let json = r#"{
            "full_name": "  Ada Lovelace ",
            "email": "Ada@Example.com",
            "source": "walk_in"
        }"#;
        let request: CreateLeadRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());

        let lead = request.into_new_lead("2025/2026");
        assert_eq!(lead.full_name, "Ada Lovelace");
        assert_eq!(lead.email, "ada@example.com");
        assert_eq!(lead.room_choice, RoomChoice::Standard);
        assert_eq!(lead.stay_duration, StayDuration::ShortStay);
        assert_eq!(lead.lead_status, LeadStatus::New);
        assert_eq!(lead.academic_year, "2025/2026");
        assert_eq!(lead.potential_revenue, 0.0);
    }

    #[test]
    fn test_create_lead_request_validation() {
        let json = r#"{
            "full_name": "",
            "email": "nope",
            "phone": "12",
            "source": "walk_in",
            "academic_year": "2025-2026"
        }"#;
        let request: CreateLeadRequest = serde_json::from_str(json).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("academic_year"));
    }
}
