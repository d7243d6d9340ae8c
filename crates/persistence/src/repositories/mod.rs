//! Repository implementations for database operations.

pub mod calendar_event;
pub mod exception_request;
pub mod followup;
pub mod followup_reminder;
pub mod lead;
pub mod lead_note;
pub mod notification;
pub mod user;

pub use calendar_event::CalendarEventRepository;
pub use exception_request::{ExceptionRequestInput, ExceptionRequestRepository};
pub use followup::FollowUpRepository;
pub use followup_reminder::FollowupReminderRepository;
pub use lead::{LeadQuery, LeadRepository};
pub use lead_note::LeadNoteRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;
