//! Background job that reminds owners about overdue leads.
//!
//! At most one outstanding reminder exists per lead, so overlapping or
//! repeated runs never duplicate a reminder. Logging a follow-up dismisses it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use domain::models::analytics::OverdueLead;
use domain::models::notification::{NewNotification, NotificationType};
use domain::models::{Lead, StaffUser};
use domain::services::detect_overdue;
use domain::services::notification::{
    FollowupReminderAlert, NotificationResult, NotificationService,
};
use persistence::repositories::{FollowupReminderRepository, LeadRepository, UserRepository};

use super::scheduler::{Job, JobError, JobFrequency};
use crate::middleware::metrics::record_reminders_created;

/// Creates follow-up reminders for overdue leads of the current academic year.
pub struct FollowupReminderJob {
    pool: PgPool,
    notifier: Arc<dyn NotificationService>,
    academic_year: String,
    interval_minutes: u64,
}

/// Counts from one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRunSummary {
    pub overdue: usize,
    pub created: u64,
    pub emailed: u64,
    pub failed: u64,
}

impl FollowupReminderJob {
    pub fn new(
        pool: PgPool,
        notifier: Arc<dyn NotificationService>,
        academic_year: impl Into<String>,
        interval_minutes: u64,
    ) -> Self {
        Self {
            pool,
            notifier,
            academic_year: academic_year.into(),
            interval_minutes,
        }
    }

    /// One pass over the open leads as of `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReminderRunSummary, JobError> {
        let leads: Vec<Lead> = LeadRepository::new(self.pool.clone())
            .list_open(&self.academic_year, None)
            .await?
            .into_iter()
            .map(Lead::from)
            .collect();

        let overdue = detect_overdue(&leads, now);
        Ok(self.remind(overdue, now).await)
    }

    /// Writes reminders for `overdue` leads that have an owner.
    ///
    /// A failure on one lead is logged and counted; the rest still get theirs.
    pub async fn remind(&self, overdue: Vec<OverdueLead>, now: DateTime<Utc>) -> ReminderRunSummary {
        let mut summary = ReminderRunSummary {
            overdue: overdue.len(),
            ..Default::default()
        };

        let reminders = FollowupReminderRepository::new(self.pool.clone());
        for (owner, lead) in owned(overdue) {
            let notification = reminder_notification(owner, &lead);
            let reminder = match reminders
                .create_with_notification(lead.lead_id, owner, now, &notification)
                .await
            {
                Ok(Some(reminder)) => reminder,
                Ok(None) => {
                    debug!(lead_id = %lead.lead_id, "Reminder already outstanding");
                    continue;
                }
                Err(e) => {
                    warn!(lead_id = %lead.lead_id, error = %e, "Failed to create reminder");
                    summary.failed += 1;
                    continue;
                }
            };
            summary.created += 1;

            let alert = FollowupReminderAlert {
                reminder_id: reminder.id,
                lead_id: lead.lead_id,
                lead_name: lead.full_name.clone(),
                days_overdue: lead.days_overdue,
                is_urgent: lead.is_urgent,
            };
            if self.email_owner(owner, &alert).await == NotificationResult::Sent {
                match reminders.mark_sent(reminder.id).await {
                    Ok(_) => summary.emailed += 1,
                    Err(e) => warn!(reminder_id = %reminder.id, error = %e, "Failed to mark reminder sent"),
                }
            }
        }

        record_reminders_created(summary.created);
        summary
    }

    async fn email_owner(&self, owner: Uuid, alert: &FollowupReminderAlert) -> NotificationResult {
        let recipient = match UserRepository::new(self.pool.clone()).find_by_id(owner).await {
            Ok(Some(user)) => StaffUser::from(user),
            Ok(None) => return NotificationResult::NoRecipient,
            Err(e) => {
                warn!(user_id = %owner, error = %e, "Failed to load reminder recipient");
                return NotificationResult::Failed(e.to_string());
            }
        };
        if !recipient.is_active {
            return NotificationResult::NoRecipient;
        }

        let result = self
            .notifier
            .send_followup_reminder(&recipient.email, alert)
            .await;
        if let NotificationResult::Failed(reason) = &result {
            warn!(
                reminder_id = %alert.reminder_id,
                user_id = %owner,
                error = %reason,
                "Reminder email failed, reminder left unsent"
            );
        }
        result
    }
}

/// Overdue leads that have an owner, paired with that owner.
pub fn owned(overdue: Vec<OverdueLead>) -> Vec<(Uuid, OverdueLead)> {
    overdue
        .into_iter()
        .filter_map(|lead| lead.assigned_to.map(|owner| (owner, lead)))
        .collect()
}

/// In-app notification written alongside a new reminder.
pub fn reminder_notification(owner: Uuid, lead: &OverdueLead) -> NewNotification {
    let message = match lead.days_overdue {
        0 => format!("{} has not been contacted yet", lead.full_name),
        1 => format!("The follow-up for {} is 1 day overdue", lead.full_name),
        n => format!("The follow-up for {} is {} days overdue", lead.full_name, n),
    };
    let title = if lead.is_urgent {
        "Urgent: follow-up overdue"
    } else {
        "Follow-up overdue"
    };

    NewNotification::for_lead(
        owner,
        NotificationType::FollowupReminder,
        lead.lead_id,
        title,
        message,
    )
    .with_metadata(serde_json::json!({
        "days_overdue": lead.days_overdue,
        "is_urgent": lead.is_urgent,
        "followup_count": lead.followup_count,
    }))
}

#[async_trait::async_trait]
impl Job for FollowupReminderJob {
    fn name(&self) -> &'static str {
        "followup_reminders"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), JobError> {
        let summary = self.run(Utc::now()).await?;
        info!(
            academic_year = %self.academic_year,
            overdue = summary.overdue,
            created = summary.created,
            emailed = summary.emailed,
            failed = summary.failed,
            "Follow-up reminders processed"
        );
        Ok(())
    }
}
