// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form schema validation.
//!
//! Every field is checked and every failure is collected, so the caller gets
//! the complete list of corrections in one round trip. A
//! [`SanitizedSubmission`] can only be obtained when all checks pass.

use crate::sanitizer::{sanitize_text, to_plain_text};
use email_address::EmailAddress;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 254;
pub const SUBJECT_MAX_LEN: usize = 200;
pub const MESSAGE_MIN_LEN: usize = 10;
pub const MESSAGE_MAX_LEN: usize = 5000;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A submission that passed validation and had its markup stripped.
///
/// Accessors return strict-mode sanitizer output, which is HTML-escaped; use
/// [`to_plain_text`] before putting a field anywhere that is not HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
}

impl SanitizedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text the spam classifier looks at: name, subject and message, with
    /// entities decoded so the heuristics see what the sender typed.
    pub fn spam_corpus(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.message.len() + self.subject.as_ref().map_or(0, String::len) + 2,
        );
        text.push_str(&self.name);
        text.push(' ');
        if let Some(subject) = &self.subject {
            text.push_str(subject);
            text.push(' ');
        }
        text.push_str(&self.message);
        to_plain_text(&text)
    }
}

/// Validate an untrusted JSON value and sanitize the accepted fields.
///
/// Length and presence rules apply to the sanitized text, so a field that is
/// only markup counts as empty and entity escaping counts toward the maximum.
/// The name charset is checked on what the client sent, email syntax on the
/// decoded sanitized address.
pub fn validate_submission(input: &Value) -> Result<SanitizedSubmission, Vec<FieldError>> {
    let Some(fields) = input.as_object() else {
        return Err(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]);
    };

    let mut errors = Vec::new();

    let name = string_field(fields, "name", "Name", true, &mut errors).and_then(|raw| {
        let name = required_text(&raw, "name", "Name", &mut errors)?;
        check_name(&raw, &name, &mut errors);
        Some(name)
    });

    let email = string_field(fields, "email", "Email", true, &mut errors).and_then(|raw| {
        let email = required_text(&raw, "email", "Email", &mut errors)?;
        check_email(&email, &mut errors);
        Some(email)
    });

    let subject = string_field(fields, "subject", "Subject", false, &mut errors)
        .map(|raw| clean(&raw))
        .filter(|subject| !subject.is_empty());
    if let Some(subject) = &subject {
        if subject.chars().count() > SUBJECT_MAX_LEN {
            errors.push(FieldError::new(
                "subject",
                format!("Subject must be {SUBJECT_MAX_LEN} characters or less"),
            ));
        }
    }

    // A message that sanitizes to nothing falls under the minimum length.
    let message =
        string_field(fields, "message", "Message", true, &mut errors).map(|raw| clean(&raw));
    if let Some(message) = &message {
        let len = message.chars().count();
        if len < MESSAGE_MIN_LEN {
            errors.push(FieldError::new(
                "message",
                format!("Message must be at least {MESSAGE_MIN_LEN} characters"),
            ));
        } else if len > MESSAGE_MAX_LEN {
            errors.push(FieldError::new(
                "message",
                format!("Message must be {MESSAGE_MAX_LEN} characters or less"),
            ));
        }
    }

    if !errors.is_empty() {
        debug!(count = errors.len(), "Submission failed validation");
        return Err(errors);
    }

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) => Ok(SanitizedSubmission {
            name,
            email,
            subject,
            message,
        }),
        // Required fields that are absent always push an error above.
        _ => Err(vec![FieldError::new("body", "Incomplete submission")]),
    }
}

/// Strict-mode sanitize, trimmed again since stripped tags can leave
/// surrounding whitespace.
fn clean(raw: &str) -> String {
    sanitize_text(raw).trim().to_string()
}

fn required_text(
    raw: &str,
    key: &'static str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let text = clean(raw);
    if text.is_empty() {
        errors.push(FieldError::new(key, format!("{label} is required")));
        return None;
    }
    Some(text)
}

/// Extract a trimmed string field.
///
/// Returns `None` when the field is absent, null or blank, recording a
/// "required" error if it had to be present. A non-string value is an error
/// whether or not the field is required.
fn string_field(
    fields: &Map<String, Value>,
    key: &'static str,
    label: &str,
    required: bool,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            if required {
                errors.push(FieldError::new(key, format!("{label} is required")));
            }
            None
        }
        Some(_) => {
            errors.push(FieldError::new(key, format!("{label} must be a string")));
            None
        }
    }
}

fn check_name(raw: &str, name: &str, errors: &mut Vec<FieldError>) {
    if name.chars().count() > NAME_MAX_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Name must be {NAME_MAX_LEN} characters or less"),
        ));
    }
    if !raw.chars().all(is_name_char) {
        errors.push(FieldError::new(
            "name",
            "Name can only contain letters, spaces, hyphens, apostrophes, and periods",
        ));
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.')
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.chars().count() > EMAIL_MAX_LEN {
        errors.push(FieldError::new(
            "email",
            format!("Email must be {EMAIL_MAX_LEN} characters or less"),
        ));
    }
    if !is_valid_email(&to_plain_text(email)) {
        errors.push(FieldError::new(
            "email",
            "Please provide a valid email address",
        ));
    }
}

/// RFC 5322 syntax plus a dotted domain (`user@host` alone is rejected).
fn is_valid_email(email: &str) -> bool {
    if !EmailAddress::is_valid(email) {
        return false;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let segments: Vec<&str> = domain.split('.').collect();
    segments.len() >= 2
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '-'))
}
