//! Overdue and upcoming follow-up classification.

use chrono::{DateTime, Duration, Utc};

use crate::models::analytics::{OverdueLead, UpcomingLead};
use crate::models::lead::Lead;

/// Hours after creation at which a lead without a scheduled follow-up is due.
pub const IMPLICIT_DUE_HOURS: i64 = 24;

/// Days overdue at which a lead is flagged urgent.
pub const URGENT_THRESHOLD_DAYS: i64 = 3;

/// Look-ahead window for upcoming follow-ups.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

/// Where a lead sits in the follow-up queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpClassification {
    Overdue { days_overdue: i64 },
    Upcoming,
    OnTrack,
}

pub fn is_urgent(days_overdue: i64) -> bool {
    days_overdue >= URGENT_THRESHOLD_DAYS
}

fn whole_days(delta: Duration) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY).max(0)
}

/// Days a lead is overdue at `now`, clamped at zero.
pub fn days_overdue(lead: &Lead, now: DateTime<Utc>) -> i64 {
    match lead.next_followup_date {
        Some(next) => whole_days(now - next),
        None => {
            let since_creation = now - lead.created_at;
            if since_creation > Duration::hours(IMPLICIT_DUE_HOURS) {
                whole_days(since_creation)
            } else {
                0
            }
        }
    }
}

/// Classifies one lead. Terminal leads are always on track.
///
/// A lead that was never contacted and is older than a day counts as
/// overdue even when its scheduled date yields zero days.
pub fn classify(lead: &Lead, now: DateTime<Utc>) -> FollowUpClassification {
    if lead.lead_status.is_terminal() {
        return FollowUpClassification::OnTrack;
    }

    let days = days_overdue(lead, now);
    let never_contacted = lead.followup_count == 0
        && now - lead.created_at > Duration::hours(IMPLICIT_DUE_HOURS);
    if days > 0 || never_contacted {
        return FollowUpClassification::Overdue { days_overdue: days };
    }

    match lead.next_followup_date {
        Some(next) if next > now && next <= now + Duration::days(UPCOMING_WINDOW_DAYS) => {
            FollowUpClassification::Upcoming
        }
        _ => FollowUpClassification::OnTrack,
    }
}

/// Overdue leads, most overdue first. Ties keep input order.
pub fn detect_overdue<'a, I>(leads: I, now: DateTime<Utc>) -> Vec<OverdueLead>
where
    I: IntoIterator<Item = &'a Lead>,
{
    let mut overdue: Vec<OverdueLead> = leads
        .into_iter()
        .filter_map(|lead| match classify(lead, now) {
            FollowUpClassification::Overdue { days_overdue } => {
                Some(OverdueLead::new(lead, days_overdue, is_urgent(days_overdue)))
            }
            _ => None,
        })
        .collect();

    overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    overdue
}

/// Leads whose next follow-up falls in the coming week, soonest first.
pub fn detect_upcoming<'a, I>(leads: I, now: DateTime<Utc>) -> Vec<UpcomingLead>
where
    I: IntoIterator<Item = &'a Lead>,
{
    let mut upcoming: Vec<UpcomingLead> = leads
        .into_iter()
        .filter(|lead| classify(lead, now) == FollowUpClassification::Upcoming)
        .filter_map(|lead| {
            lead.next_followup_date.map(|next| UpcomingLead {
                lead_id: lead.id,
                full_name: lead.full_name.clone(),
                email: lead.email.clone(),
                lead_status: lead.lead_status,
                assigned_to: lead.assigned_to,
                next_followup_date: next,
            })
        })
        .collect();

    upcoming.sort_by_key(|u| u.next_followup_date);
    upcoming
}
