//! Follow-up analytics engine.
//!
//! A pure computation over a snapshot of leads and their follow-ups. The
//! same snapshot and `now` always yield the same [`FollowUpMetrics`].

use chrono::{DateTime, Duration, Utc};

use crate::models::analytics::{FollowUpMetrics, TypeEffectiveness};
use crate::models::exception_request::COMPLIANCE_TARGET;
use crate::models::followup::{FollowUpType, LeadWithFollowUps};
use crate::models::lead::LeadStatus;
use crate::services::overdue::UPCOMING_WINDOW_DAYS;

fn hours(delta: Duration) -> f64 {
    delta.num_seconds() as f64 / 3600.0
}

fn mean(total: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        total / n as f64
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Computes follow-up metrics for `snapshot` as of `now`.
pub fn compute_followup_metrics(snapshot: &[LeadWithFollowUps], now: DateTime<Utc>) -> FollowUpMetrics {
    FollowUpMetrics {
        total_leads: snapshot.len(),
        compliance_rate: compliance_rate(snapshot),
        average_followups_to_conversion: average_followups_to_conversion(snapshot),
        average_time_to_first_followup: average_time_to_first_followup(snapshot),
        average_followup_interval: average_followup_interval(snapshot),
        followup_response_rate: followup_response_rate(snapshot),
        followup_type_effectiveness: type_effectiveness(snapshot),
        overdue_followups: count_scheduled(snapshot, |next| next < now),
        upcoming_followups: count_scheduled(snapshot, |next| {
            next > now && next <= now + Duration::days(UPCOMING_WINDOW_DAYS)
        }),
    }
}

/// Share of closed leads that reached the follow-up minimum.
pub fn compliance_rate(snapshot: &[LeadWithFollowUps]) -> f64 {
    let closed: Vec<_> = snapshot
        .iter()
        .filter(|l| l.lead.lead_status == LeadStatus::Closed)
        .collect();
    let compliant = closed
        .iter()
        .filter(|l| l.lead.followup_count >= COMPLIANCE_TARGET)
        .count();
    percentage(compliant, closed.len())
}

fn average_followups_to_conversion(snapshot: &[LeadWithFollowUps]) -> f64 {
    let counts: Vec<i32> = snapshot
        .iter()
        .filter(|l| l.lead.lead_status == LeadStatus::Converted && l.lead.followup_count > 0)
        .map(|l| l.lead.followup_count)
        .collect();
    mean(counts.iter().map(|&c| c as f64).sum(), counts.len())
}

/// Hours from lead creation to its earliest follow-up, averaged per lead.
///
/// Follow-ups back-dated before the lead's creation count as zero hours.
fn average_time_to_first_followup(snapshot: &[LeadWithFollowUps]) -> f64 {
    let deltas: Vec<f64> = snapshot
        .iter()
        .filter_map(|l| {
            l.followups
                .iter()
                .map(|f| f.followup_date)
                .min()
                .map(|first| hours(first - l.lead.created_at).max(0.0))
        })
        .collect();
    mean(deltas.iter().sum(), deltas.len())
}

/// Mean gap between consecutive follow-ups, pooled across all leads.
fn average_followup_interval(snapshot: &[LeadWithFollowUps]) -> f64 {
    let gaps: Vec<f64> = snapshot
        .iter()
        .filter(|l| l.followups.len() >= 2)
        .flat_map(|l| {
            let dates = l.sorted_followup_dates();
            dates
                .windows(2)
                .map(|pair| hours(pair[1] - pair[0]))
                .collect::<Vec<_>>()
        })
        .collect();
    mean(gaps.iter().sum(), gaps.len())
}

fn followup_response_rate(snapshot: &[LeadWithFollowUps]) -> f64 {
    let (responses, total) = snapshot
        .iter()
        .flat_map(|l| l.followups.iter())
        .fold((0usize, 0usize), |(r, t), f| {
            (r + usize::from(f.outcome.is_response()), t + 1)
        });
    percentage(responses, total)
}

/// Per-channel usage and conversion.
///
/// A converted lead contributes one conversion per follow-up of the channel
/// it holds, so `conversion_rate` is relative to follow-up records rather
/// than distinct leads.
fn type_effectiveness(snapshot: &[LeadWithFollowUps]) -> Vec<TypeEffectiveness> {
    FollowUpType::all()
        .into_iter()
        .filter_map(|followup_type| {
            let (count, converted) = snapshot
                .iter()
                .flat_map(|l| {
                    let is_converted = l.lead.lead_status == LeadStatus::Converted;
                    l.followups
                        .iter()
                        .filter(move |f| f.followup_type == followup_type)
                        .map(move |_| is_converted)
                })
                .fold((0usize, 0usize), |(n, c), is_converted| {
                    (n + 1, c + usize::from(is_converted))
                });

            (count > 0).then(|| TypeEffectiveness {
                followup_type,
                count,
                conversion_rate: percentage(converted, count),
            })
        })
        .collect()
}

/// Non-terminal leads whose scheduled follow-up date satisfies `pred`.
///
/// Only the scheduled date counts here. Leads without one never appear in
/// either total, unlike the overdue queue which also flags untouched leads.
fn count_scheduled<F>(snapshot: &[LeadWithFollowUps], pred: F) -> usize
where
    F: Fn(DateTime<Utc>) -> bool,
{
    snapshot
        .iter()
        .filter(|l| !l.lead.lead_status.is_terminal())
        .filter(|l| l.lead.next_followup_date.is_some_and(&pred))
        .count()
}
