//! Follow-up analytics and overdue classification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::followup::FollowUpType;
use super::lead::{Lead, LeadStatus};

// ============================================================================
// Follow-up metrics
// ============================================================================

/// Query parameters for follow-up analytics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowUpAnalyticsQuery {
    /// Defaults to the caller's academic year.
    pub academic_year: Option<String>,
}

/// Aggregate follow-up metrics over a snapshot of leads.
///
/// Percentages are in the 0-100 range and durations are in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpMetrics {
    pub total_leads: usize,
    pub compliance_rate: f64,
    pub average_followups_to_conversion: f64,
    pub average_time_to_first_followup: f64,
    pub average_followup_interval: f64,
    pub followup_response_rate: f64,
    pub followup_type_effectiveness: Vec<TypeEffectiveness>,
    pub overdue_followups: usize,
    pub upcoming_followups: usize,
}

/// Usage and conversion for one follow-up channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeEffectiveness {
    #[serde(rename = "type")]
    pub followup_type: FollowUpType,
    pub count: usize,
    pub conversion_rate: f64,
}

// ============================================================================
// Overdue / upcoming classification
// ============================================================================

/// Query parameters for the overdue and upcoming lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowUpQueueQuery {
    pub academic_year: Option<String>,
    pub assigned_to: Option<Uuid>,
}

/// A lead whose follow-up is past due.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OverdueLead {
    pub lead_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub lead_status: LeadStatus,
    pub assigned_to: Option<Uuid>,
    pub followup_count: i32,
    pub next_followup_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub days_overdue: i64,
    pub is_urgent: bool,
}

impl OverdueLead {
    pub fn new(lead: &Lead, days_overdue: i64, is_urgent: bool) -> Self {
        Self {
            lead_id: lead.id,
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            lead_status: lead.lead_status,
            assigned_to: lead.assigned_to,
            followup_count: lead.followup_count,
            next_followup_date: lead.next_followup_date,
            created_at: lead.created_at,
            days_overdue,
            is_urgent,
        }
    }
}

/// A lead whose next follow-up falls within the coming week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UpcomingLead {
    pub lead_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub lead_status: LeadStatus,
    pub assigned_to: Option<Uuid>,
    pub next_followup_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueLeadsResponse {
    pub leads: Vec<OverdueLead>,
    pub urgent_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingLeadsResponse {
    pub leads: Vec<UpcomingLead>,
}
