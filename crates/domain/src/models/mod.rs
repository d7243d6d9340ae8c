//! Domain models for the Leads CRM.

pub mod analytics;
pub mod calendar_event;
pub mod context;
pub mod exception_request;
pub mod followup;
pub mod followup_reminder;
pub mod form_submission;
pub mod lead;
pub mod lead_note;
pub mod notification;
pub mod user;

pub use calendar_event::CalendarEvent;
pub use context::{RequestContext, UserRole};
pub use exception_request::ExceptionRequest;
pub use followup::{FollowUp, LeadWithFollowUps};
pub use followup_reminder::FollowupReminder;
pub use lead::Lead;
pub use lead_note::LeadNote;
pub use notification::Notification;
pub use user::StaffUser;
