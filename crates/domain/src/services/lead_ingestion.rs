//! Normalizes website form submissions into canonical leads.
//!
//! Providers disagree on field names, casing and nesting. This module
//! resolves the common variants into a single [`NormalizedLead`] and never
//! performs I/O; persisting the lead and the follow-on tasks is the caller's
//! job.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::models::form_submission::{FormPayload, FormType, NormalizedLead};
use crate::models::lead::{revenue_for_status, LeadStatus, NewLead, RoomChoice, StayDuration};

const EMAIL_KEYS: [&str; 4] = ["email", "email_address", "your_email", "e_mail"];
const FORM_NAME_KEYS: [&str; 4] = ["form_name", "form_title", "form", "form_id"];
const NAME_KEYS: [&str; 3] = ["full_name", "name", "your_name"];
const PHONE_KEYS: [&str; 5] = ["phone", "phone_number", "telephone", "mobile", "tel"];
const MESSAGE_KEYS: [&str; 4] = ["message", "comments", "enquiry", "notes"];
const ROOM_KEYS: [&str; 3] = ["room_choice", "room", "room_type"];
const STAY_KEYS: [&str; 4] = ["stay_duration", "duration", "tenancy", "tenancy_length"];
const DATE_KEYS: [&str; 4] = ["preferred_date", "viewing_date", "callback_date", "date"];
const TIME_KEYS: [&str; 4] = ["preferred_time", "viewing_time", "callback_time", "time"];

/// Errors raised while normalizing a submission. Nothing is persisted when
/// normalization fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestionError {
    #[error("Submission does not contain an email address")]
    MissingEmail,

    #[error("Submission email address is not valid: {0}")]
    InvalidEmail(String),
}

/// Normalizes a flattened submission into a lead for `academic_year`.
pub fn normalize_submission(
    payload: &FormPayload,
    academic_year: &str,
) -> Result<NormalizedLead, IngestionError> {
    let email = resolve_email(payload)?;
    let form_name = payload.first_of(&FORM_NAME_KEYS).map(str::to_string);
    let form_type = resolve_form_type(payload, form_name.as_deref());

    let room_choice = payload
        .first_of(&ROOM_KEYS)
        .map(RoomChoice::from_free_text)
        .unwrap_or(RoomChoice::Standard);
    let stay_duration = payload
        .first_of(&STAY_KEYS)
        .map(StayDuration::from_free_text)
        .unwrap_or(StayDuration::ShortStay);

    let (lead_status, is_hot) = match form_type {
        FormType::Deposit => (LeadStatus::Converted, true),
        _ => (LeadStatus::New, false),
    };

    let message = payload.first_of(&MESSAGE_KEYS).map(str::to_string);
    let full_name = resolve_name(payload).unwrap_or_else(|| email.clone());

    let lead = NewLead {
        full_name,
        email,
        phone: payload.first_of(&PHONE_KEYS).map(str::to_string),
        source: form_type.source_slug().to_string(),
        room_choice,
        stay_duration,
        lead_status,
        potential_revenue: revenue_for_status(lead_status, room_choice, stay_duration),
        assigned_to: None,
        academic_year: academic_year.to_string(),
        is_hot,
        notes: message.clone(),
    };

    Ok(NormalizedLead {
        form_type,
        form_name,
        lead,
        message,
        preferred_at: resolve_preferred_at(payload),
    })
}

fn resolve_email(payload: &FormPayload) -> Result<String, IngestionError> {
    let candidate = payload.first_of(&EMAIL_KEYS).or_else(|| {
        payload
            .entries()
            .find(|(k, v)| k.contains("email") && v.contains('@'))
            .map(|(_, v)| v)
    });

    match candidate {
        None => Err(IngestionError::MissingEmail),
        Some(raw) => {
            let email = raw.trim().to_lowercase();
            if shared::validation::is_valid_email(&email) {
                Ok(email)
            } else {
                Err(IngestionError::InvalidEmail(raw.to_string()))
            }
        }
    }
}

fn resolve_form_type(payload: &FormPayload, form_name: Option<&str>) -> FormType {
    if let Some(explicit) = payload.get("form_type") {
        return explicit
            .parse()
            .unwrap_or_else(|_| FormType::infer(explicit));
    }
    form_name.map(FormType::infer).unwrap_or(FormType::Contact)
}

fn resolve_name(payload: &FormPayload) -> Option<String> {
    if let Some(name) = payload.first_of(&NAME_KEYS) {
        return Some(name.to_string());
    }
    let first = payload.first_of(&["first_name", "firstname", "given_name"]);
    let last = payload.first_of(&["last_name", "lastname", "surname", "family_name"]);
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
        (Some(f), None) => Some(f.to_string()),
        (None, Some(l)) => Some(l.to_string()),
        (None, None) => None,
    }
}

/// Resolves the preferred viewing or callback time.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` and `DD/MM/YYYY` dates. Bare
/// dates take their time from `preferred_time` (`HH:MM`), else 10:00 UTC.
fn resolve_preferred_at(payload: &FormPayload) -> Option<DateTime<Utc>> {
    let raw = payload.first_of(&DATE_KEYS)?;

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()?;
    let time = payload
        .first_of(&TIME_KEYS)
        .and_then(parse_time)
        .unwrap_or_else(default_preferred_time);

    Utc.from_local_datetime(&date.and_time(time)).single()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn default_preferred_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN)
}
