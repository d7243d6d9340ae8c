//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

lazy_static::lazy_static! {
    static ref ACADEMIC_YEAR_REGEX: regex::Regex =
        regex::Regex::new(r"^(\d{4})/(\d{4})$").unwrap();
}

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 7;

/// Maximum number of digits in a phone number (E.164 allows 15, leave room for extensions).
const MAX_PHONE_DIGITS: usize = 18;

/// Validates an academic year partition key such as `2025/2026`.
///
/// The second year must directly follow the first.
pub fn validate_academic_year(value: &str) -> Result<(), ValidationError> {
    let valid = ACADEMIC_YEAR_REGEX
        .captures(value)
        .and_then(|caps| {
            let start: i32 = caps[1].parse().ok()?;
            let end: i32 = caps[2].parse().ok()?;
            Some(end == start + 1)
        })
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("academic_year_format");
        err.message = Some("Academic year must look like 2025/2026".into());
        Err(err)
    }
}

/// Validates a loosely formatted phone number.
///
/// Accepts digits, spaces, `+`, `-`, `.` and parentheses.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '.' | '(' | ')'));
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();

    if allowed && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number is not valid".into());
        Err(err)
    }
}

/// Validates that a string has non-whitespace content.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Returns true when the value parses as an email address.
pub fn is_valid_email(value: &str) -> bool {
    value.trim().to_string().validate_email()
}
