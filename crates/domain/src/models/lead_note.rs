//! Free-text notes attached to a lead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note on a lead. System-generated notes have no author.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LeadNote {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub author: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeadNote {
    pub lead_id: Uuid,
    pub author: Option<Uuid>,
    pub body: String,
}

impl NewLeadNote {
    pub fn system(lead_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            lead_id,
            author: None,
            body: body.into(),
        }
    }
}
