//! Outbound alert delivery.
//!
//! In-app notifications are rows in the notification store; this trait covers
//! the side channel (email) that new-lead alerts and follow-up reminders use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::form_submission::FormType;

/// Alert sent to staff when a website form creates a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeadAlert {
    pub lead_id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub form_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_at: Option<DateTime<Utc>>,
}

impl NewLeadAlert {
    pub fn new(
        lead_id: Uuid,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        form_type: FormType,
    ) -> Self {
        Self {
            lead_id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            form_type: form_type.to_string(),
            message: None,
            preferred_at: None,
        }
    }
}

/// Reminder sent to the owner of an overdue lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupReminderAlert {
    pub reminder_id: Uuid,
    pub lead_id: Uuid,
    pub lead_name: String,
    pub days_overdue: i64,
    pub is_urgent: bool,
}

/// Result of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Alert was delivered.
    Sent,
    /// No recipient address is known.
    NoRecipient,
    /// Delivery failed. Callers log and continue.
    Failed(String),
    /// Delivery is disabled.
    Skipped,
}

impl NotificationResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationResult::Sent)
    }
}

/// Delivers alerts over the side channel.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Alert `recipient` about a new website lead.
    async fn send_new_lead_alert(&self, recipient: &str, alert: &NewLeadAlert) -> NotificationResult;

    /// Remind `recipient` about an overdue follow-up.
    async fn send_followup_reminder(
        &self,
        recipient: &str,
        alert: &FollowupReminderAlert,
    ) -> NotificationResult;
}

/// Mock notification service for development and testing.
///
/// Logs alerts but doesn't deliver them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn send_new_lead_alert(&self, recipient: &str, alert: &NewLeadAlert) -> NotificationResult {
        if recipient.is_empty() {
            return NotificationResult::NoRecipient;
        }
        if self.simulate_failure {
            tracing::warn!(
                recipient = %recipient,
                lead_id = %alert.lead_id,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %recipient,
            lead_id = %alert.lead_id,
            form_type = %alert.form_type,
            "Mock: Would send new lead alert"
        );
        NotificationResult::Sent
    }

    async fn send_followup_reminder(
        &self,
        recipient: &str,
        alert: &FollowupReminderAlert,
    ) -> NotificationResult {
        if recipient.is_empty() {
            return NotificationResult::NoRecipient;
        }
        if self.simulate_failure {
            tracing::warn!(
                recipient = %recipient,
                reminder_id = %alert.reminder_id,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %recipient,
            lead_id = %alert.lead_id,
            days_overdue = alert.days_overdue,
            "Mock: Would send follow-up reminder"
        );
        NotificationResult::Sent
    }
}
