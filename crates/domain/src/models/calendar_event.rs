//! Calendar events scheduled against a lead.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventType {
    Viewing,
    Callback,
}

impl CalendarEventType {
    /// Slot length booked for the event.
    pub fn default_length(&self) -> Duration {
        match self {
            CalendarEventType::Viewing => Duration::hours(1),
            CalendarEventType::Callback => Duration::minutes(30),
        }
    }
}

impl FromStr for CalendarEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viewing" => Ok(CalendarEventType::Viewing),
            "callback" => Ok(CalendarEventType::Callback),
            _ => Err(format!("Unknown calendar event type: {}", s)),
        }
    }
}

impl std::fmt::Display for CalendarEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarEventType::Viewing => write!(f, "viewing"),
            CalendarEventType::Callback => write!(f, "callback"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub title: String,
    pub event_type: CalendarEventType,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub lead_id: Uuid,
    pub title: String,
    pub event_type: CalendarEventType,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl NewCalendarEvent {
    /// Builds an event with the default slot length for its type.
    pub fn starting_at(
        lead_id: Uuid,
        event_type: CalendarEventType,
        title: impl Into<String>,
        starts_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lead_id,
            title: title.into(),
            event_type,
            starts_at,
            ends_at: starts_at + event_type.default_length(),
        }
    }
}
