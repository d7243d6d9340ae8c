//! HTTP route handlers.

pub mod analytics;
pub mod exception_requests;
pub mod followups;
pub mod form_webhook;
pub mod health;
pub mod leads;
pub mod notifications;
