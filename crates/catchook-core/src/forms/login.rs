use super::validation::{email, required, FieldState, Form, FormStatus};
use crate::models::LoginCredentials;

fn password(value: &str) -> Option<String> {
    required(value, "Password is required")
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: FieldState,
    pub password: FieldState,
    status: FormStatus,
}

impl LoginForm {
    pub fn new(last_email: Option<&str>) -> Self {
        Self {
            email: FieldState::with_value(last_email.unwrap_or_default(), email),
            password: FieldState::new(password),
            status: FormStatus::default(),
        }
    }

    /// Validate and build the request body, or `None` if any field is invalid.
    pub fn submit(&mut self) -> Option<LoginCredentials> {
        if !self.begin_submit() {
            return None;
        }
        Some(LoginCredentials {
            email: self.email.value.trim().to_string(),
            password: self.password.value.clone(),
        })
    }
}

impl Form for LoginForm {
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut FieldState)> {
        vec![("email", &mut self.email), ("password", &mut self.password)]
    }

    fn status(&self) -> &FormStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut FormStatus {
        &mut self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use reqwest::StatusCode;

    #[test]
    fn test_empty_submit_touches_fields() {
        let mut form = LoginForm::new(None);
        assert!(form.submit().is_none());
        assert_eq!(form.email.errors(), vec!["Email is required"]);
        assert_eq!(form.password.errors(), vec!["Password is required"]);
        assert!(!form.status().submitting);
    }

    #[test]
    fn test_valid_submit() {
        let mut form = LoginForm::new(Some("a@b.com"));
        form.password.set_value("x");
        let creds = form.submit().unwrap();
        assert_eq!(creds.email, "a@b.com");
        assert_eq!(creds.password, "x");
        assert!(form.status().submitting);
    }

    #[test]
    fn test_bad_credentials_become_form_error() {
        let mut form = LoginForm::new(Some("a@b.com"));
        form.password.set_value("wrong");
        form.submit().unwrap();

        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid email or password"}}"#,
        );
        form.apply_server_error(&err);
        assert_eq!(form.form_error(), Some("Invalid email or password"));
        assert!(!form.status().submitting);

        // Next submission starts clean
        form.submit().unwrap();
        assert!(form.form_error().is_none());
    }
}
