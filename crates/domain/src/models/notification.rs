//! In-app notification domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    FollowupReminder,
    LeadAssigned,
    StatusChanged,
    ExceptionRequested,
    ExceptionReviewed,
    NewLead,
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "followup_reminder" => Ok(NotificationType::FollowupReminder),
            "lead_assigned" => Ok(NotificationType::LeadAssigned),
            "status_changed" => Ok(NotificationType::StatusChanged),
            "exception_requested" => Ok(NotificationType::ExceptionRequested),
            "exception_reviewed" => Ok(NotificationType::ExceptionReviewed),
            "new_lead" => Ok(NotificationType::NewLead),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::FollowupReminder => "followup_reminder",
            NotificationType::LeadAssigned => "lead_assigned",
            NotificationType::StatusChanged => "status_changed",
            NotificationType::ExceptionRequested => "exception_requested",
            NotificationType::ExceptionReviewed => "exception_reviewed",
            NotificationType::NewLead => "new_lead",
        };
        write!(f, "{}", s)
    }
}

/// A notification owned by its recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub metadata: serde_json::Value,
    pub lead_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub metadata: serde_json::Value,
    pub lead_id: Option<Uuid>,
}

impl NewNotification {
    pub fn for_lead(
        user_id: Uuid,
        notification_type: NotificationType,
        lead_id: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            link: Some(lead_link(lead_id)),
            metadata: serde_json::json!({}),
            lead_id: Some(lead_id),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Deep link to a lead in the web client.
pub fn lead_link(lead_id: Uuid) -> String {
    format!("/leads/{}", lead_id)
}

/// Query parameters for listing notifications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// Response payload for a notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub metadata: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            link: n.link,
            metadata: n.metadata,
            lead_id: n.lead_id,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Response for listing notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

/// Response for marking notifications read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_roundtrip() {
        for t in [
            NotificationType::FollowupReminder,
            NotificationType::LeadAssigned,
            NotificationType::StatusChanged,
            NotificationType::ExceptionRequested,
            NotificationType::ExceptionReviewed,
            NotificationType::NewLead,
        ] {
            assert_eq!(t.to_string().parse::<NotificationType>().unwrap(), t);
        }
    }

    #[test]
    fn test_for_lead_sets_link() {
        let user = Uuid::new_v4();
        let lead = Uuid::new_v4();
        let n = NewNotification::for_lead(
            user,
            NotificationType::LeadAssigned,
            lead,
            "Lead assigned",
            "A lead was assigned to you",
        )
        .with_metadata(serde_json::json!({"by": "manager"}));

        assert_eq!(n.link.as_deref(), Some(format!("/leads/{}", lead).as_str()));
        assert_eq!(n.lead_id, Some(lead));
        assert_eq!(n.metadata["by"], "manager");
    }
}
