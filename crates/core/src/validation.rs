//! Client-side pre-flight validation.
//!
//! These checks run before any Shop API call. Failures are reported field by
//! field so a form can highlight each offending input, and they are never
//! logged: malformed input is expected user noise, not an operational event.

use serde::Serialize;

use crate::types::Email;

/// Minimum password length accepted by the password policy.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted by the password policy.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length of a person's first or last name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Phone numbers must contain between this many digits...
pub const MIN_PHONE_DIGITS: usize = 7;

/// ...and this many digits (E.164 maximum).
pub const MAX_PHONE_DIGITS: usize = 15;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name (matches the input's `name` attribute).
    pub field: String,
    /// User-facing message.
    pub message: String,
}

/// Accumulated validation failures for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} invalid field(s)", .0.len())]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Record the outcome of a single-field check.
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over recorded errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Convert into `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed validation.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Require a non-blank value.
///
/// # Errors
///
/// Returns a message when the value is empty after trimming.
pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }
    Ok(())
}

/// Validate an email address shape.
///
/// # Errors
///
/// Returns the [`crate::EmailError`] message for malformed addresses.
pub fn validate_email(value: &str) -> Result<(), String> {
    Email::parse(value).map(|_| ()).map_err(|e| {
        let message = e.to_string();
        let mut chars = message.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    })
}

/// Validate a password against the storefront policy.
///
/// # Errors
///
/// Returns a message when the password is too short, too long, or lacks a
/// letter or a digit.
pub fn validate_password(value: &str) -> Result<(), String> {
    let length = value.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        ));
    }
    if !value.chars().any(char::is_alphabetic) || !value.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one letter and one number".to_string());
    }
    Ok(())
}

/// Validate a person's name.
///
/// Letters (any script), spaces, hyphens, apostrophes and periods are allowed.
///
/// # Errors
///
/// Returns a message for blank, overlong, or disallowed-character names.
pub fn validate_name(value: &str, label: &str) -> Result<(), String> {
    let value = value.trim();
    validate_required(value, label)?;
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "{label} must be at most {MAX_NAME_LENGTH} characters"
        ));
    }
    let allowed = |c: char| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.');
    if !value.chars().all(allowed) {
        return Err(format!(
            "{label} may only contain letters, spaces, hyphens, apostrophes and periods"
        ));
    }
    Ok(())
}

/// Validate an optional phone number.
///
/// Blank is accepted. Otherwise only digits and common separators are allowed
/// and the digit count must be within the E.164 range.
///
/// # Errors
///
/// Returns a message for disallowed characters or an out-of-range digit count.
pub fn validate_phone(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.');
    if !value.chars().all(allowed) {
        return Err("Phone number may only contain digits, spaces and + - ( ) .".to_string());
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(format!(
            "Phone number must have between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_accumulate() {
        let mut errors = FieldErrors::new();
        errors.check("email", validate_email("bad"));
        errors.check("firstName", validate_name("Ada", "First name"));
        errors.check("password", validate_password("short"));

        assert_eq!(errors.iter().count(), 2);
        assert!(errors.get("email").is_some());
        assert!(errors.get("firstName").is_none());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_email_message_is_capitalized() {
        assert_eq!(
            validate_email("").unwrap_err(),
            "Email cannot be empty".to_string()
        );
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("abc12345").is_ok());
        assert!(validate_password("abc1234").is_err());
        assert!(validate_password("abcdefgh").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password(&format!("a1{}", "x".repeat(127))).is_err());
    }

    #[test]
    fn test_name_character_set() {
        assert!(validate_name("Zoë O'Brien-Smith", "Name").is_ok());
        assert!(validate_name("J. R.", "Name").is_ok());
        assert!(validate_name("R2D2", "Name").is_err());
        assert!(validate_name("  ", "Name").is_err());
        assert!(validate_name("<script>", "Name").is_err());
    }

    #[test]
    fn test_phone_digit_count() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+1 (555) 010-9999").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("555-CALL-NOW").is_err());
    }
}
