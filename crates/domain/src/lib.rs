//! Domain layer for the Leads CRM backend.
//!
//! This crate contains:
//! - Domain models (Lead, FollowUp, ExceptionRequest, Notification)
//! - The lead status state machine and close-eligibility rule
//! - Pure business services: follow-up analytics, overdue detection,
//!   and webhook form normalization

pub mod models;
pub mod services;
