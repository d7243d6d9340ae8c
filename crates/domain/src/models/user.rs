//! Staff directory entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::UserRole;

/// A CRM user who can own leads and receive notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StaffUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
}
