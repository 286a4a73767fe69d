//! Request validation primitives.
//!
//! # Responsibility
//! - Collect field-keyed validation messages for one request.
//! - Provide shared shape checks (length caps, email, date) used by the
//!   static entity rules and the dynamic custom-field plan.
//!
//! # Invariants
//! - Error keys are stable identifiers a hosting form layer can map back to
//!   inputs (`name`, `email`, `custom_fields.<field_id>`, ...).
//! - Checks never mutate the request payload; normalization happens in the
//!   services.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod plan;

pub use plan::FieldPlan;

// Deliberately permissive: one `@`, no spaces, a dot in the domain part.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

// `YYYY-MM-DD`, optionally followed by `HH:MM` or `HH:MM:SS`.
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2})?)?$").expect("valid date regex")
});

/// One field-keyed validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Input key the message belongs to.
    pub key: String,
    /// Human-readable message for form rendering.
    pub message: String,
}

/// Validation failure carrying every collected field message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Returns the first message recorded for `key`, if any.
    pub fn message_for(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.key == key)
            .map(|error| error.message.as_str())
    }

    /// Whether any message was recorded for `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.errors.iter().any(|error| error.key == key)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed:")?;
        for error in &self.errors {
            write!(f, " [{}: {}]", error.key, error.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Accumulator for field-keyed validation messages.
///
/// Services run every check before failing, so one response carries all
/// messages instead of only the first violation.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `key`.
    pub fn push(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            key: key.into(),
            message: message.into(),
        });
    }

    /// Requires a non-blank string no longer than `max_chars`.
    pub fn require_text(&mut self, key: &str, value: &str, max_chars: usize) {
        if value.trim().is_empty() {
            self.push(key, format!("{key} is required"));
        } else {
            self.cap_length(key, value, max_chars);
        }
    }

    /// Caps an optional string at `max_chars` when present.
    pub fn optional_text(&mut self, key: &str, value: Option<&str>, max_chars: usize) {
        if let Some(value) = value {
            self.cap_length(key, value, max_chars);
        }
    }

    /// Checks email shape when a value is present.
    pub fn optional_email(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            if !EMAIL_RE.is_match(value.trim()) {
                self.push(key, format!("{key} must be a valid email address"));
            }
        }
    }

    /// Converts collected messages into a result.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }

    fn cap_length(&mut self, key: &str, value: &str, max_chars: usize) {
        if value.chars().count() > max_chars {
            self.push(
                key,
                format!("{key} must not be longer than {max_chars} characters"),
            );
        }
    }
}

/// Whether `value` looks like a calendar date (optionally with a time).
pub fn is_date_like(value: &str) -> bool {
    DATE_RE.is_match(value.trim())
}

/// Whether `value` parses as a number.
pub fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::{is_date_like, is_numeric, Validator};

    #[test]
    fn require_text_rejects_blank_and_overlong_values() {
        let mut validator = Validator::new();
        validator.require_text("name", "   ", 255);
        validator.require_text("title", &"x".repeat(300), 255);
        validator.require_text("ok", "fine", 255);

        let err = validator.finish().unwrap_err();
        assert!(err.has_key("name"));
        assert!(err.has_key("title"));
        assert!(!err.has_key("ok"));
    }

    #[test]
    fn optional_email_accepts_absent_and_checks_shape() {
        let mut validator = Validator::new();
        validator.optional_email("email", None);
        validator.optional_email("email", Some("ann@x.com"));
        assert!(validator.finish().is_ok());

        let mut validator = Validator::new();
        validator.optional_email("email", Some("not-an-email"));
        assert!(validator.finish().unwrap_err().has_key("email"));
    }

    #[test]
    fn date_and_number_shape_checks() {
        assert!(is_date_like("2025-07-13"));
        assert!(is_date_like("2025-07-13 09:30"));
        assert!(is_date_like("2025-07-13T09:30:00"));
        assert!(!is_date_like("13/07/2025"));
        assert!(!is_date_like("soon"));

        assert!(is_numeric("500"));
        assert!(is_numeric(" -3.25 "));
        assert!(!is_numeric("12abc"));
    }
}
