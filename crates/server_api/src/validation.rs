//! Field rules applied to registration and reference-data writes.

use std::sync::OnceLock;

use regex::Regex;
use shared::error::ApiError;

pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_NAME_LEN: usize = 20;
pub const MAX_LAST_NAME_LEN: usize = 20;
pub const MAX_PLACE_EXPEDITION_LEN: usize = 60;
pub const MAX_CITY_LEN: usize = 50;
pub const MAX_COUNTRY_CODE_LEN: usize = 4;
pub const MAX_COUNTRY_NAME_LEN: usize = 100;
pub const MAX_DOCUMENT_TYPE_NAME_LEN: usize = 50;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\s\-N*]+$").expect("address pattern"))
}

pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), ApiError> {
    if !address_pattern().is_match(address) {
        return Err(ApiError::validation(
            "address may only contain letters, digits, spaces and the characters - N *",
        ));
    }
    Ok(())
}

pub fn validate_phone(field: &str, phone: &str) -> Result<(), ApiError> {
    if phone.is_empty() || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(format!(
            "{field} must contain digits only"
        )));
    }
    Ok(())
}

pub fn validate_max_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Lower-cases the domain part and leaves the local part as typed.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(ApiError::validation("email address is invalid"));
    };
    if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
        return Err(ApiError::validation("email address is invalid"));
    }
    Ok(format!("{local}@{}", domain.to_ascii_lowercase()))
}
