//! Input validation shared by the JSON handlers.

use std::sync::LazyLock;

use regex::Regex;
use ushop_core::Email;

use crate::error::AppError;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ().-]{7,20}$").expect("Invalid regex"));

/// A required text field, trimmed, with a length range in characters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `field` when out of range.
pub fn required_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// An optional text field, trimmed. Blank values become `None`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `field` when longer than `max`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, AppError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

/// An optional contact email.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed addresses.
pub fn optional_email(value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => Email::parse(raw)
            .map(|email| Some(email.as_str().to_string()))
            .map_err(|e| AppError::BadRequest(format!("email: {e}"))),
    }
}

/// An optional phone number: digits with common separators, 7 to 20 characters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for anything else.
pub fn optional_phone(value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) if PHONE_RE.is_match(raw) && raw.chars().filter(char::is_ascii_digit).count() >= 7 => {
            Ok(Some(raw.to_string()))
        }
        Some(_) => Err(AppError::BadRequest("phone number is not valid".to_string())),
    }
}

/// Clamp a page size to `1..=max`, using `default` when absent.
#[must_use]
pub fn page_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, max)
}
