//! Background job scheduler and job implementations.

mod followup_reminders;
mod pool_metrics;
mod scheduler;

pub use followup_reminders::{FollowupReminderJob, ReminderRunSummary};
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobError, JobFrequency, JobScheduler};
