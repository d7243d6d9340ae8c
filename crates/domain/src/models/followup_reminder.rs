//! Follow-up reminders produced by the reminder job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reminder for the owner of an overdue lead.
///
/// At most one reminder per lead may be both unsent and not dismissed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FollowupReminder {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub reminder_date: DateTime<Utc>,
    pub is_sent: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl FollowupReminder {
    /// Whether the reminder still blocks a new one for the same lead.
    pub fn is_outstanding(&self) -> bool {
        !self.is_sent && !self.is_dismissed
    }
}
