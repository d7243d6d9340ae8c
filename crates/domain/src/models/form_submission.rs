//! Website form submissions received by the lead webhook.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use super::calendar_event::CalendarEventType;
use super::lead::NewLead;

lazy_static::lazy_static! {
    static ref BRACKETED_FIELD: regex::Regex =
        regex::Regex::new(r"^(?:form_)?fields\[([^\]]+)\]").unwrap();
}

/// Keys under which providers nest per-field entries.
const NESTED_FIELD_KEYS: [&str; 3] = ["fields", "form_fields", "data"];

/// Normalizes a form key: lowercase, with brackets, dashes, dots and
/// whitespace collapsed into single underscores.
///
/// `fields[Your Email]` style keys are unwrapped to their inner name first.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = BRACKETED_FIELD
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let mut out = String::with_capacity(inner.len());
    let mut pending_sep = false;
    for c in inner.chars() {
        if matches!(c, '[' | ']' | '-' | '.' | '_') || c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// A flattened form submission: ordered `(key, value)` pairs with normalized keys.
///
/// JSON, URL-encoded and multipart bodies all reduce to this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormPayload {
    entries: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, normalizing its key. Blank values are dropped.
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        let key = normalize_key(key);
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.entries.push((key, value.to_string()));
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut payload = Self::new();
        for (k, v) in pairs {
            payload.push(k.as_ref(), v);
        }
        payload
    }

    /// Flattens a JSON body.
    ///
    /// Top-level scalars become entries. `fields`, `form_fields` and `data`
    /// may hold either an object or an array of `{id|name|label, value}`
    /// entries; each identifier present on an entry contributes its own key.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let mut payload = Self::new();
        let Some(object) = body.as_object() else {
            return payload;
        };

        for (key, value) in object {
            let normalized = normalize_key(key);
            if NESTED_FIELD_KEYS.contains(&normalized.as_str()) {
                match value {
                    serde_json::Value::Array(items) => {
                        for item in items {
                            payload.push_field_entry(item);
                        }
                        continue;
                    }
                    serde_json::Value::Object(inner) => {
                        for (inner_key, inner_value) in inner {
                            if let Some(text) = scalar_text(inner_value) {
                                payload.push(inner_key, text);
                            }
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            if let Some(text) = scalar_text(value) {
                payload.push(key, text);
            }
        }
        payload
    }

    fn push_field_entry(&mut self, item: &serde_json::Value) {
        let Some(entry) = item.as_object() else {
            return;
        };
        let Some(value) = entry.get("value").and_then(scalar_text) else {
            return;
        };
        for id_key in ["id", "name", "label"] {
            if let Some(id) = entry.get(id_key).and_then(|v| v.as_str()) {
                self.push(id, value.clone());
            }
        }
    }

    /// First non-empty value stored under `key` (already normalized).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value found among `keys`, in the order given.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
                    other => scalar_text(other),
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
    }
}

/// Kind of website form a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    Booking,
    Callback,
    Deposit,
    Contact,
}

impl FormType {
    /// Infers the form type from a free-text form name.
    pub fn infer(form_name: &str) -> Self {
        let lower = form_name.to_lowercase();
        if lower.contains("book") || lower.contains("viewing") {
            FormType::Booking
        } else if lower.contains("callback") {
            FormType::Callback
        } else if lower.contains("deposit") {
            FormType::Deposit
        } else {
            FormType::Contact
        }
    }

    /// Lead `source` slug recorded for submissions of this type.
    pub fn source_slug(&self) -> &'static str {
        match self {
            FormType::Booking => "web_booking",
            FormType::Callback => "web_callback",
            FormType::Deposit => "web_deposit",
            FormType::Contact => "web_contact",
        }
    }

    /// Calendar slot booked for this form type, if any.
    pub fn calendar_event_type(&self) -> Option<CalendarEventType> {
        match self {
            FormType::Booking => Some(CalendarEventType::Viewing),
            FormType::Callback => Some(CalendarEventType::Callback),
            FormType::Deposit | FormType::Contact => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Booking => "booking",
            FormType::Callback => "callback",
            FormType::Deposit => "deposit",
            FormType::Contact => "contact",
        }
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "booking" => Ok(FormType::Booking),
            "callback" => Ok(FormType::Callback),
            "deposit" => Ok(FormType::Deposit),
            "contact" => Ok(FormType::Contact),
            _ => Err(format!("Unknown form type: {}", s)),
        }
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The canonical lead produced from a form submission, plus the context the
/// follow-on tasks need.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLead {
    pub form_type: FormType,
    pub form_name: Option<String>,
    pub lead: NewLead,
    pub message: Option<String>,
    pub preferred_at: Option<DateTime<Utc>>,
}

impl NormalizedLead {
    /// Body of the system note recorded against the new lead.
    pub fn note_body(&self) -> String {
        let mut body = match &self.form_name {
            Some(name) => format!(
                "Lead created from website form \"{}\" ({}).",
                name, self.form_type
            ),
            None => format!("Lead created from website {} form.", self.form_type),
        };
        if let Some(at) = self.preferred_at {
            body.push_str(&format!(" Preferred time: {}.", at.format("%Y-%m-%d %H:%M UTC")));
        }
        if let Some(message) = &self.message {
            body.push_str("\n\nMessage: ");
            body.push_str(message);
        }
        body
    }

    /// Whether a new-lead alert goes out for this submission.
    pub fn wants_new_lead_alert(&self) -> bool {
        self.form_type != FormType::Deposit
    }

    /// Title of the calendar event for `lead_id`, when one applies.
    pub fn calendar_title(&self) -> String {
        match self.form_type {
            FormType::Callback => format!("Callback: {}", self.lead.full_name),
            _ => format!("Viewing: {}", self.lead.full_name),
        }
    }
}

/// Response returned to the form provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAcceptedResponse {
    pub success: bool,
    pub lead_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Email"), "email");
        assert_eq!(normalize_key("Your Email"), "your_email");
        assert_eq!(normalize_key("e-mail"), "e_mail");
        assert_eq!(normalize_key("  Phone  Number "), "phone_number");
        assert_eq!(normalize_key("fields[Your Email]"), "your_email");
        assert_eq!(normalize_key("form_fields[room-choice]"), "room_choice");
        assert_eq!(normalize_key("contact[name]"), "contact_name");
    }

    #[test]
    fn test_push_drops_blank_values() {
        let mut payload = FormPayload::new();
        payload.push("email", "   ");
        payload.push("", "value");
        assert!(payload.is_empty());
    }

    #[test]
    fn test_from_json_flat() {
        let body = serde_json::json!({
            "Email": "a@b.com",
            "Room Choice": "Gold Suite",
            "guests": 2,
            "newsletter": true,
            "ignored": null
        });
        let payload = FormPayload::from_json(&body);
        assert_eq!(payload.get("email"), Some("a@b.com"));
        assert_eq!(payload.get("room_choice"), Some("Gold Suite"));
        assert_eq!(payload.get("guests"), Some("2"));
        assert_eq!(payload.get("newsletter"), Some("true"));
        assert_eq!(payload.get("ignored"), None);
    }

    #[test]
    fn test_from_json_nested_field_array() {
        let body = serde_json::json!({
            "form_name": "Request a Callback",
            "fields": [
                {"id": "field_1", "label": "Email Address", "value": "x@y.org"},
                {"name": "phone", "value": "07700 900123"},
                {"label": "Interests", "value": ["gold", "parking"]},
                {"label": "No value"}
            ]
        });
        let payload = FormPayload::from_json(&body);
        assert_eq!(payload.get("form_name"), Some("Request a Callback"));
        assert_eq!(payload.get("email_address"), Some("x@y.org"));
        assert_eq!(payload.get("field_1"), Some("x@y.org"));
        assert_eq!(payload.get("phone"), Some("07700 900123"));
        assert_eq!(payload.get("interests"), Some("gold, parking"));
        assert_eq!(payload.get("no_value"), None);
    }

    #[test]
    fn test_from_json_nested_object() {
        let body = serde_json::json!({
            "form_fields": {"Full Name": "Grace Hopper", "email": "g@navy.mil"}
        });
        let payload = FormPayload::from_json(&body);
        assert_eq!(payload.get("full_name"), Some("Grace Hopper"));
        assert_eq!(payload.get("email"), Some("g@navy.mil"));
    }

    #[test]
    fn test_from_json_non_object() {
        assert!(FormPayload::from_json(&serde_json::json!(["a"])).is_empty());
    }

    #[test]
    fn test_first_of_respects_order() {
        let payload = FormPayload::from_pairs([("name", "Short"), ("full_name", "Full Name")]);
        assert_eq!(payload.first_of(&["full_name", "name"]), Some("Full Name"));
        assert_eq!(payload.first_of(&["missing"]), None);
    }

    #[test]
    fn test_form_type_inference() {
        assert_eq!(FormType::infer("Book a Viewing - X"), FormType::Booking);
        assert_eq!(FormType::infer("Viewing request"), FormType::Booking);
        assert_eq!(FormType::infer("Request a CALLBACK"), FormType::Callback);
        assert_eq!(FormType::infer("Pay deposit"), FormType::Deposit);
        assert_eq!(FormType::infer("General enquiry"), FormType::Contact);
    }

    #[test]
    fn test_source_slugs() {
        assert_eq!(FormType::Booking.source_slug(), "web_booking");
        assert_eq!(FormType::Callback.source_slug(), "web_callback");
        assert_eq!(FormType::Deposit.source_slug(), "web_deposit");
        assert_eq!(FormType::Contact.source_slug(), "web_contact");
    }
}
