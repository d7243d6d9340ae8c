//! Domain services for the Leads CRM.
//!
//! Services contain business logic that operates on domain models.

pub mod analytics;
pub mod lead_ingestion;
pub mod notification;
pub mod overdue;

pub use analytics::compute_followup_metrics;
pub use lead_ingestion::{normalize_submission, IngestionError};
pub use notification::{
    FollowupReminderAlert, MockNotificationService, NewLeadAlert, NotificationResult,
    NotificationService,
};
pub use overdue::{classify, detect_overdue, detect_upcoming, is_urgent, FollowUpClassification};
