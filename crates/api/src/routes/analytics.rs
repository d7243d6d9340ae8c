//! Follow-up analytics endpoint handlers.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use persistence::repositories::{FollowUpRepository, LeadRepository};
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use domain::models::analytics::{FollowUpAnalyticsQuery, FollowUpMetrics};
use domain::models::{FollowUp, Lead, LeadWithFollowUps};
use domain::services::compute_followup_metrics;

/// Pairs each lead with its follow-ups. Follow-ups of unknown leads are dropped.
pub fn group_snapshot(leads: Vec<Lead>, followups: Vec<FollowUp>) -> Vec<LeadWithFollowUps> {
    let mut by_lead: HashMap<Uuid, Vec<FollowUp>> = HashMap::new();
    for followup in followups {
        by_lead.entry(followup.lead_id).or_default().push(followup);
    }

    leads
        .into_iter()
        .map(|lead| {
            let followups = by_lead.remove(&lead.id).unwrap_or_default();
            LeadWithFollowUps::new(lead, followups)
        })
        .collect()
}

/// Follow-up metrics for one academic year.
///
/// GET /api/v1/analytics/followups?academic_year=
pub async fn followup_analytics(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FollowUpAnalyticsQuery>,
) -> Result<Json<FollowUpMetrics>, ApiError> {
    let academic_year = query
        .academic_year
        .unwrap_or_else(|| ctx.academic_year.clone());

    let lead_repo = LeadRepository::new(state.pool.clone());
    let followup_repo = FollowUpRepository::new(state.pool.clone());
    let (leads, followups) = tokio::try_join!(
        lead_repo.list_for_year(&academic_year),
        followup_repo.list_for_year(&academic_year),
    )?;

    let snapshot = group_snapshot(
        leads.into_iter().map(Lead::from).collect(),
        followups.into_iter().map(FollowUp::from).collect(),
    );
    debug!(
        academic_year = %academic_year,
        leads = snapshot.len(),
        "Computing follow-up metrics"
    );

    Ok(Json(compute_followup_metrics(&snapshot, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use domain::models::followup::{FollowUpOutcome, FollowUpType};
    use domain::models::lead::{LeadStatus, RoomChoice, StayDuration};

    fn lead(created_at: DateTime<Utc>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            source: "web_contact".to_string(),
            room_choice: RoomChoice::Standard,
            stay_duration: StayDuration::ShortStay,
            lead_status: LeadStatus::New,
            potential_revenue: 0.0,
            followup_count: 0,
            last_followup_date: None,
            next_followup_date: None,
            assigned_to: None,
            academic_year: "2025/2026".to_string(),
            is_hot: false,
            notes: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn followup(lead_id: Uuid, number: i32, at: DateTime<Utc>) -> FollowUp {
        FollowUp {
            id: Uuid::new_v4(),
            lead_id,
            followup_number: number,
            followup_type: FollowUpType::Call,
            outcome: FollowUpOutcome::Contacted,
            followup_date: at,
            next_action_date: None,
            notes: None,
            created_by: Uuid::nil(),
            created_at: at,
        }
    }

    #[test]
    fn test_group_snapshot_pairs_by_lead() {
        let now = Utc::now();
        let a = lead(now - Duration::days(3));
        let b = lead(now - Duration::days(2));
        let followups = vec![
            followup(a.id, 1, now - Duration::days(2)),
            followup(b.id, 1, now - Duration::days(1)),
            followup(a.id, 2, now - Duration::days(1)),
            followup(Uuid::new_v4(), 1, now),
        ];

        let snapshot = group_snapshot(vec![a.clone(), b.clone()], followups);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].lead.id, a.id);
        assert_eq!(snapshot[0].followups.len(), 2);
        assert_eq!(snapshot[1].lead.id, b.id);
        assert_eq!(snapshot[1].followups.len(), 1);
    }

    #[test]
    fn test_group_snapshot_lead_without_followups() {
        let snapshot = group_snapshot(vec![lead(Utc::now())], Vec::new());
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].followups.is_empty());
    }
}
