use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::api::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap();
}

pub type Validator = fn(&str) -> Option<String>;

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn required(value: &str, message: &str) -> Option<String> {
    value.is_empty().then(|| message.to_string())
}

pub fn min_length(value: &str, min: usize, message: &str) -> Option<String> {
    (value.chars().count() < min).then(|| message.to_string())
}

/// E-mails and names are sent trimmed, so they are checked trimmed
pub fn email(value: &str) -> Option<String> {
    let value = value.trim();
    required(value, "Email is required").or_else(|| {
        (!is_valid_email(value)).then(|| "Invalid email address".to_string())
    })
}

pub fn first_name(value: &str) -> Option<String> {
    let value = value.trim();
    required(value, "First name is required")
        .or_else(|| min_length(value, 2, "First name must be at least 2 characters"))
}

pub fn optional(_value: &str) -> Option<String> {
    None
}

/// One input of a form with its client and server error.
#[derive(Debug, Clone)]
pub struct FieldState {
    pub value: String,
    touched: bool,
    client_error: Option<String>,
    server_error: Option<String>,
    validator: Validator,
}

impl FieldState {
    pub fn new(validator: Validator) -> Self {
        Self::with_value("", validator)
    }

    pub fn with_value(value: &str, validator: Validator) -> Self {
        Self {
            value: value.to_string(),
            touched: false,
            client_error: validator(value),
            server_error: None,
            validator,
        }
    }

    /// Change handler: store and revalidate.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.touched = true;
        self.validate();
    }

    pub fn push_char(&mut self, c: char) {
        let mut value = std::mem::take(&mut self.value);
        value.push(c);
        self.set_value(&value);
    }

    pub fn pop_char(&mut self) {
        let mut value = std::mem::take(&mut self.value);
        value.pop();
        self.set_value(&value);
    }

    /// Blur handler
    pub fn blur(&mut self) {
        self.touched = true;
        self.validate();
    }

    pub fn validate(&mut self) -> bool {
        self.client_error = (self.validator)(&self.value);
        self.client_error.is_none()
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn client_error(&self) -> Option<&str> {
        self.client_error.as_deref().filter(|_| self.touched)
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    /// Everything to display under the field, client error first.
    pub fn errors(&self) -> Vec<&str> {
        self.client_error()
            .into_iter()
            .chain(self.server_error())
            .collect()
    }

    pub fn set_server_error(&mut self, message: &str) {
        self.server_error = Some(message.to_string());
    }

    pub fn clear_server_error(&mut self) {
        self.server_error = None;
    }
}

/// Submission state shared by every form.
#[derive(Debug, Clone, Default)]
pub struct FormStatus {
    pub submitting: bool,
    pub form_error: Option<String>,
}

/// A form is a fixed set of named fields plus a `FormStatus`.
pub trait Form {
    /// `(server field name, field)` pairs
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut FieldState)>;

    fn status(&self) -> &FormStatus;

    fn status_mut(&mut self) -> &mut FormStatus;

    /// Start a submission: drop the previous submission's server errors,
    /// touch every field and validate. Returns true when the form can be sent.
    fn begin_submit(&mut self) -> bool {
        let status = self.status_mut();
        status.form_error = None;
        status.submitting = false;

        let mut valid = true;
        for (_, field) in self.fields_mut() {
            field.clear_server_error();
            field.touched = true;
            valid &= field.validate();
        }
        if valid {
            self.status_mut().submitting = true;
        }
        valid
    }

    /// Route a failed submission's error to the fields it names, or to the
    /// form-level error when it names none.
    fn apply_server_error(&mut self, error: &ApiError) {
        self.status_mut().submitting = false;

        let Some(errors) = error.field_errors().filter(|e| !e.is_empty()) else {
            self.status_mut().form_error = Some(error.to_string());
            return;
        };

        let mut unmatched = Vec::new();
        let mut fields = self.fields_mut();
        for (name, message) in errors {
            match fields.iter_mut().find(|(field_name, _)| *field_name == name.as_str()) {
                Some((_, field)) => field.set_server_error(message),
                None => unmatched.push(message.clone()),
            }
        }
        drop(fields);

        if !unmatched.is_empty() {
            debug!(count = unmatched.len(), "Server errors for unknown fields");
            self.status_mut().form_error = Some(unmatched.join(", "));
        }
    }

    fn finish_submit(&mut self) {
        self.status_mut().submitting = false;
    }

    fn form_error(&self) -> Option<&str> {
        self.status().form_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("First.Last+tag@Sub.Example.ORG"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@b.c"));
    }

    #[test]
    fn test_email_validator_messages() {
        assert_eq!(email("").as_deref(), Some("Email is required"));
        assert_eq!(email("nope").as_deref(), Some("Invalid email address"));
        assert_eq!(email("a@b.com"), None);
        assert_eq!(email("  a@b.com "), None);
        assert_eq!(email("   ").as_deref(), Some("Email is required"));
    }

    #[test]
    fn test_first_name_ignores_padding() {
        assert_eq!(first_name("   ").as_deref(), Some("First name is required"));
        assert_eq!(
            first_name(" A ").as_deref(),
            Some("First name must be at least 2 characters")
        );
        assert_eq!(first_name("  Al "), None);
    }

    #[test]
    fn test_min_length_counts_chars() {
        assert!(min_length("é", 2, "short").is_some());
        assert!(min_length("éé", 2, "short").is_none());
    }

    #[test]
    fn test_errors_hidden_until_touched() {
        let mut field = FieldState::new(email);
        assert!(field.errors().is_empty());
        field.blur();
        assert_eq!(field.errors(), vec!["Email is required"]);
        field.set_value("a@b.com");
        assert!(field.errors().is_empty());
    }

    #[test]
    fn test_client_and_server_errors_both_show() {
        let mut field = FieldState::new(email);
        field.set_value("bad");
        field.set_server_error("Email is already taken");
        assert_eq!(
            field.errors(),
            vec!["Invalid email address", "Email is already taken"]
        );
    }

    #[test]
    fn test_push_and_pop_char() {
        let mut field = FieldState::new(optional);
        field.push_char('a');
        field.push_char('b');
        field.pop_char();
        assert_eq!(field.value, "a");
        assert!(field.is_touched());
    }
}
