//! Application services that combine repositories with external integrations.

pub mod email;
pub mod lead_ingestion;
pub mod staff_alerts;

pub use email::EmailService;
pub use lead_ingestion::LeadIngestionService;
