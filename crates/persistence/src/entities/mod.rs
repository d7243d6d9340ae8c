//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod calendar_event;
pub mod exception_request;
pub mod followup;
pub mod followup_reminder;
pub mod lead;
pub mod lead_note;
pub mod notification;
pub mod user;

pub use calendar_event::CalendarEventEntity;
pub use exception_request::ExceptionRequestEntity;
pub use followup::FollowUpEntity;
pub use followup_reminder::FollowupReminderEntity;
pub use lead::LeadEntity;
pub use lead_note::LeadNoteEntity;
pub use notification::NotificationEntity;
pub use user::StaffUserEntity;
