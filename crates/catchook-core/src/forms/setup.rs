use super::validation::{email, first_name, min_length, optional, required, FieldState, Form, FormStatus};
use crate::models::SetupAdminUserRequest;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

fn password(value: &str) -> Option<String> {
    required(value, "Password is required")
        .or_else(|| min_length(value, 8, "Password must be at least 8 characters"))
}

fn confirm_password(value: &str) -> Option<String> {
    required(value, "Please confirm your password")
}

/// First administrator account, shown while the backend reports first-time setup.
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub first_name: FieldState,
    pub last_name: FieldState,
    pub email: FieldState,
    pub password: FieldState,
    pub confirm_password: FieldState,
    status: FormStatus,
}

impl Default for SetupForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupForm {
    pub fn new() -> Self {
        Self {
            first_name: FieldState::new(first_name),
            last_name: FieldState::new(optional),
            email: FieldState::new(email),
            password: FieldState::new(password),
            confirm_password: FieldState::new(confirm_password),
            status: FormStatus::default(),
        }
    }

    /// Validate and build the request body. A password mismatch is reported
    /// as the form error and nothing is returned, so no request is made.
    pub fn submit(&mut self) -> Option<SetupAdminUserRequest> {
        if !self.begin_submit() {
            return None;
        }
        if self.password.value != self.confirm_password.value {
            let status = self.status_mut();
            status.submitting = false;
            status.form_error = Some(PASSWORD_MISMATCH.to_string());
            return None;
        }

        let last_name = self.last_name.value.trim();
        Some(SetupAdminUserRequest {
            first_name: self.first_name.value.trim().to_string(),
            last_name: (!last_name.is_empty()).then(|| last_name.to_string()),
            email: self.email.value.trim().to_string(),
            password: self.password.value.clone(),
        })
    }
}

impl Form for SetupForm {
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut FieldState)> {
        vec![
            ("first_name", &mut self.first_name),
            ("last_name", &mut self.last_name),
            ("email", &mut self.email),
            ("password", &mut self.password),
            ("confirmPassword", &mut self.confirm_password),
        ]
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

    fn filled() -> SetupForm {
        let mut form = SetupForm::new();
        form.first_name.set_value("Ada");
        form.email.set_value("ada@example.com");
        form.password.set_value("supersecret");
        form.confirm_password.set_value("supersecret");
        form
    }

    #[test]
    fn test_valid_setup() {
        let mut form = filled();
        let request = form.submit().unwrap();
        assert_eq!(request.first_name, "Ada");
        assert_eq!(request.last_name, None);
        assert_eq!(request.email, "ada@example.com");
    }

    #[test]
    fn test_password_mismatch_is_rejected_locally() {
        let mut form = filled();
        form.confirm_password.set_value("different1");
        assert!(form.submit().is_none());
        assert_eq!(form.form_error(), Some(PASSWORD_MISMATCH));
        assert!(!form.status().submitting);
    }

    #[test]
    fn test_length_rules() {
        let mut form = filled();
        form.first_name.set_value("A");
        form.password.set_value("short");
        form.confirm_password.set_value("short");
        assert!(form.submit().is_none());
        assert_eq!(
            form.first_name.errors(),
            vec!["First name must be at least 2 characters"]
        );
        assert_eq!(
            form.password.errors(),
            vec!["Password must be at least 8 characters"]
        );
        assert!(form.form_error().is_none());
    }

    #[test]
    fn test_padded_first_name_is_rejected() {
        let mut form = filled();
        form.first_name.set_value(" A");
        assert!(form.submit().is_none());
        assert_eq!(
            form.first_name.errors(),
            vec!["First name must be at least 2 characters"]
        );

        form.first_name.set_value("  Ada  ");
        let request = form.submit().unwrap();
        assert_eq!(request.first_name, "Ada");
    }

    #[test]
    fn test_server_field_errors_merge() {
        let mut form = filled();
        form.submit().unwrap();
        let body = r#"{"success":false,"message":"Validation failed","errors":{"email":"Email is already taken","confirmPassword":"Must match"}}"#;
        form.apply_server_error(&ApiError::from_status(StatusCode::BAD_REQUEST, body));

        assert_eq!(form.email.errors(), vec!["Email is already taken"]);
        assert_eq!(form.confirm_password.errors(), vec!["Must match"]);
        assert!(form.form_error().is_none());

        // Server errors belong to the latest submission only
        form.submit().unwrap();
        assert!(form.email.errors().is_empty());
    }
}
