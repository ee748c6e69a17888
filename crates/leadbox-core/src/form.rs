//! Client-side model of the contact form.
//!
//! [`ContactForm`] owns the values a visitor has typed, the per-field errors
//! shown next to the inputs, and the in-flight flag that disables the submit
//! control. A submission goes through [`ContactForm::begin_submit`] and
//! always ends with [`ContactForm::finish_submit`], whatever the outcome.

use crate::phone;
use crate::submission::{ContactFields, Service};
use crate::validate::{self, Field, FieldErrors};

/// Why a submit could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    /// A previous submit has not finished yet.
    #[error("a submission is already in progress")]
    InFlight,

    /// One or more fields failed validation; nothing was sent.
    #[error("form has invalid fields: {0}")]
    Invalid(FieldErrors),
}

/// State of a contact form between keystrokes.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    fields: ContactFields,
    errors: FieldErrors,
    submitting: bool,
}

impl ContactForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current field values.
    #[must_use]
    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    /// Errors from the last submit attempt, minus fields edited since.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether a submit is in flight. The submit control is disabled while
    /// this is `true`.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_name(&mut self, value: &str) {
        value.clone_into(&mut self.fields.name);
        self.errors.remove(Field::Name);
    }

    pub fn set_email(&mut self, value: &str) {
        value.clone_into(&mut self.fields.email);
        self.errors.remove(Field::Email);
    }

    /// Store the phone as typed, reformatted into its canonical shape.
    pub fn set_phone(&mut self, value: &str) {
        self.fields.phone = phone::normalize(value);
        self.errors.remove(Field::Phone);
    }

    pub fn set_message(&mut self, value: &str) {
        value.clone_into(&mut self.fields.message);
        self.errors.remove(Field::Message);
    }

    pub fn set_service(&mut self, service: Option<Service>) {
        self.fields.service = service;
    }

    /// The phone input gained focus.
    pub fn focus_phone(&mut self) {
        self.fields.phone = phone::on_focus(&self.fields.phone);
    }

    /// The phone input lost focus.
    pub fn blur_phone(&mut self) {
        self.fields.phone = phone::on_blur(&self.fields.phone);
    }

    /// Validate and, if everything passes, mark the form as submitting.
    ///
    /// Returns the payload to send. Field errors are kept on the form so they
    /// can be shown inline.
    ///
    /// # Errors
    ///
    /// - [`SubmitBlocked::InFlight`] if a submit is already running.
    /// - [`SubmitBlocked::Invalid`] if a field failed validation.
    pub fn begin_submit(&mut self) -> Result<ContactFields, SubmitBlocked> {
        if self.submitting {
            return Err(SubmitBlocked::InFlight);
        }

        self.errors = validate::validate(&self.fields);
        if !self.errors.is_empty() {
            return Err(SubmitBlocked::Invalid(self.errors.clone()));
        }

        self.submitting = true;
        Ok(self.fields.clone())
    }

    /// End the current submit.
    ///
    /// The form is cleared only after a confirmed success; on any failure the
    /// values stay so the visitor can retry without retyping.
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            self.fields = ContactFields::default();
            self.errors = FieldErrors::new();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_form() -> ContactForm {
        let mut form = ContactForm::new();
        form.set_name("Timur");
        form.set_email("timur@example.uz");
        form.focus_phone();
        form.set_phone("+998 901234567");
        form.set_message("Need a Telegram bot");
        form.set_service(Some(Service::TelegramBots));
        form
    }

    #[test]
    fn phone_is_normalized_while_typing() {
        let mut form = ContactForm::new();
        form.focus_phone();
        assert_eq!(form.fields().phone, "+998 ");
        form.set_phone("+998 9012");
        assert_eq!(form.fields().phone, "+998 90 12");
    }

    #[test]
    fn blur_completes_national_number() {
        let mut form = ContactForm::new();
        form.set_phone("12345678");
        form.set_phone("123456789");
        assert_eq!(form.fields().phone, "12 345 67 89");
        form.blur_phone();
        assert_eq!(form.fields().phone, "+998 12 345 67 89");
    }

    #[test]
    fn invalid_form_does_not_start_submitting() {
        let mut form = filled_form();
        form.set_message("");
        let blocked = form.begin_submit().unwrap_err();

        let SubmitBlocked::Invalid(errors) = blocked else {
            unreachable!("expected validation failure");
        };
        assert!(errors.contains(Field::Message));
        assert_eq!(errors.len(), 1);
        assert!(!form.is_submitting());
        assert!(form.errors().contains(Field::Message));
    }

    #[test]
    fn editing_a_field_clears_its_error() {
        let mut form = filled_form();
        form.set_message("");
        let _ = form.begin_submit();
        form.set_message("Actually, a website");
        assert!(form.errors().is_empty());
    }

    #[test]
    fn second_submit_is_refused_while_in_flight() {
        let mut form = filled_form();
        let payload = form.begin_submit().unwrap();
        assert_eq!(payload.phone, "+998 90 123 45 67");
        assert!(form.is_submitting());
        assert_eq!(form.begin_submit(), Err(SubmitBlocked::InFlight));
    }

    #[test]
    fn failure_keeps_values_and_success_clears_them() {
        let mut form = filled_form();
        form.begin_submit().unwrap();
        form.finish_submit(false);
        assert!(!form.is_submitting());
        assert_eq!(form.fields().name, "Timur");

        form.begin_submit().unwrap();
        form.finish_submit(true);
        assert!(!form.is_submitting());
        assert_eq!(form.fields(), &ContactFields::default());
    }
}
