//! Contact form validation.
//!
//! [`validate`] applies the form's field rules and reports every failing
//! field at once. [`validate_for_intake`] is the server-side gate: it trims
//! the fields, re-runs the same rules, adds length limits, and on success
//! hands back a [`ValidContact`], the only value the request store accepts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::phone::{self, COUNTRY_CODE, INTERNATIONAL_DIGITS, PHONE_PREFIX};
use crate::submission::{ContactFields, Service};

/// Maximum stored lengths, in characters.
pub const MAX_NAME_LEN: usize = 512;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_MESSAGE_LEN: usize = 5000;
pub const MAX_NOTES_LEN: usize = 5000;

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern")
});

#[allow(clippy::expect_used)]
static INTERNATIONAL_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+998\s[0-9]{2}\s[0-9]{3}\s[0-9]{2}\s[0-9]{2}$")
        .expect("invalid international phone pattern")
});

#[allow(clippy::expect_used)]
static LOCAL_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9\s\-()]{9,12}$").expect("invalid local phone pattern")
});

/// A validated form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Message,
    AdminNotes,
}

impl Field {
    /// Wire name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Message => "message",
            Self::AdminNotes => "admin_notes",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name → message for every field that failed validation.
///
/// An empty map means the form is valid. Iteration is in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Record a failure. The first message recorded for a field wins.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Forget a field's failure, e.g. once the visitor edits it.
    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// The first failing field in field order.
    #[must_use]
    pub fn first(&self) -> Option<(Field, &str)> {
        self.0.iter().next().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise the map itself.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validate the form as typed.
///
/// Checks `name`, `email`, `phone` and `message`; `service` is optional and
/// never fails. The input is not modified.
#[must_use]
pub fn validate(fields: &ContactFields) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if fields.name.trim().is_empty() {
        errors.insert(Field::Name, "Name is required");
    }

    if fields.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !EMAIL.is_match(&fields.email) {
        errors.insert(Field::Email, "Invalid email format");
    }

    if let Some(message) = phone_error(&fields.phone) {
        errors.insert(Field::Phone, message);
    }

    if fields.message.trim().is_empty() {
        errors.insert(Field::Message, "Message is required");
    }

    errors
}

/// Message describing why `phone` is not acceptable, if it is not.
#[must_use]
pub fn phone_error(phone: &str) -> Option<&'static str> {
    if phone.trim().is_empty() {
        return Some("Phone number is required");
    }

    if phone.starts_with(PHONE_PREFIX) {
        return (!INTERNATIONAL_PHONE.is_match(phone))
            .then_some("Phone number must be in the format +998 90 123 45 67 (with spaces)");
    }

    let digits = phone::digits(phone);
    if digits.starts_with(COUNTRY_CODE) {
        return (digits.len() != INTERNATIONAL_DIGITS).then_some(
            "Phone number must contain 12 digits with the 998 code \
             (for example 998901234567 or +998 90 123 45 67)",
        );
    }

    let plausible_length = (9..=12).contains(&digits.len());
    (!plausible_length || !LOCAL_PHONE.is_match(phone)).then_some(
        "Invalid phone number format. Use +998 90 123 45 67, or locally 90 123 45 67",
    )
}

/// Contact fields that passed server-side validation.
///
/// Values are trimmed. Only [`validate_for_intake`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    name: String,
    email: String,
    phone: String,
    message: String,
    service: Option<Service>,
}

impl ValidContact {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn service(&self) -> Option<Service> {
        self.service
    }
}

/// Trim, validate, and enforce length limits on an incoming submission.
///
/// # Errors
///
/// Returns every failing field when the submission is not acceptable.
pub fn validate_for_intake(fields: &ContactFields) -> Result<ValidContact, FieldErrors> {
    let trimmed = ContactFields {
        name: fields.name.trim().to_owned(),
        email: fields.email.trim().to_owned(),
        phone: fields.phone.trim().to_owned(),
        message: fields.message.trim().to_owned(),
        service: fields.service,
    };

    let mut errors = validate(&trimmed);
    check_length(&mut errors, Field::Name, &trimmed.name, MAX_NAME_LEN);
    check_length(&mut errors, Field::Email, &trimmed.email, MAX_EMAIL_LEN);
    check_length(&mut errors, Field::Phone, &trimmed.phone, MAX_PHONE_LEN);
    check_length(&mut errors, Field::Message, &trimmed.message, MAX_MESSAGE_LEN);
    errors.into_result()?;

    Ok(ValidContact {
        name: trimmed.name,
        email: trimmed.email,
        phone: trimmed.phone,
        message: trimmed.message,
        service: trimmed.service,
    })
}

/// Validate admin notes attached to a status update.
///
/// # Errors
///
/// Returns an `admin_notes` failure when the notes are too long.
pub fn validate_notes(notes: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_length(&mut errors, Field::AdminNotes, notes, MAX_NOTES_LEN);
    errors.into_result()
}

fn check_length(errors: &mut FieldErrors, field: Field, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.insert(field, format!("Must be at most {max} characters"));
    }
}
