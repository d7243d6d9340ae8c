//! Per-request caller context.
//!
//! Role, academic year and currency travel explicitly with each call instead
//! of living in process-wide state, so services stay pure and testable.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// CRM role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    /// Admins and managers may review exceptions and delete recent follow-ups.
    pub fn is_elevated(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "staff" => Ok(UserRole::Staff),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Staff => write!(f, "staff"),
        }
    }
}

/// Caller identity plus the settings that scope every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: UserRole,
    /// Reporting partition, e.g. `2025/2026`.
    pub academic_year: String,
    /// ISO 4217 code used when presenting revenue.
    pub currency: String,
}

impl RequestContext {
    pub fn new(
        user_id: Uuid,
        role: UserRole,
        academic_year: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            role,
            academic_year: academic_year.into(),
            currency: currency.into(),
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Returns a copy scoped to another academic year.
    pub fn with_academic_year(&self, academic_year: impl Into<String>) -> Self {
        Self {
            academic_year: academic_year.into(),
            ..self.clone()
        }
    }
}
