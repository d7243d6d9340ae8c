//! Shared utilities and common types for the Leads CRM backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Webhook secret and signature checks
//! - JWT verification for tokens issued by the hosted auth provider
//! - Cursor pagination
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
