use super::validation::{email, first_name, optional, FieldState, Form, FormStatus};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(i64),
}

/// What a valid submission sends
#[derive(Debug, Clone, PartialEq)]
pub enum UserSubmission {
    Create(CreateUserRequest),
    Update(UpdateUserRequest),
}

/// Create/edit dialog for a user. The e-mail is fixed once a user exists;
/// the active flag only applies to existing users.
#[derive(Debug, Clone)]
pub struct UserEditorForm {
    mode: EditorMode,
    pub first_name: FieldState,
    pub last_name: FieldState,
    pub email: FieldState,
    pub role: UserRole,
    pub is_active: bool,
    status: FormStatus,
}

impl UserEditorForm {
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            first_name: FieldState::new(first_name),
            last_name: FieldState::new(optional),
            email: FieldState::new(email),
            role: UserRole::Viewer,
            is_active: true,
            status: FormStatus::default(),
        }
    }

    pub fn edit(user: &User) -> Self {
        Self {
            mode: EditorMode::Edit(user.id),
            first_name: FieldState::with_value(&user.first_name, first_name),
            last_name: FieldState::with_value(user.last_name.as_deref().unwrap_or_default(), optional),
            email: FieldState::with_value(&user.email, optional),
            role: user.role,
            is_active: user.is_active,
            status: FormStatus::default(),
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_create(&self) -> bool {
        self.mode == EditorMode::Create
    }

    pub fn cycle_role(&mut self) {
        self.role = self.role.next();
    }

    pub fn toggle_active(&mut self) {
        if !self.is_create() {
            self.is_active = !self.is_active;
        }
    }

    pub fn submit(&mut self) -> Option<UserSubmission> {
        if !self.begin_submit() {
            return None;
        }
        let first_name = self.first_name.value.trim().to_string();
        let last_name = self.last_name.value.trim().to_string();
        Some(match self.mode {
            EditorMode::Create => UserSubmission::Create(CreateUserRequest {
                first_name,
                last_name,
                email: self.email.value.trim().to_string(),
                role: Some(self.role),
            }),
            EditorMode::Edit(id) => UserSubmission::Update(UpdateUserRequest {
                id,
                first_name,
                last_name,
                role: Some(self.role),
                is_active: Some(self.is_active),
            }),
        })
    }
}

impl Form for UserEditorForm {
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut FieldState)> {
        let mut fields = vec![
            ("first_name", &mut self.first_name),
            ("last_name", &mut self.last_name),
        ];
        if self.mode == EditorMode::Create {
            fields.push(("email", &mut self.email));
        }
        fields
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
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 42,
            email: "dev@example.com".to_string(),
            role: UserRole::Developer,
            first_name: "Dee".to_string(),
            last_name: None,
            full_name: "Dee".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_create_submission() {
        let mut form = UserEditorForm::create();
        form.first_name.set_value("Bo");
        form.last_name.set_value("Li");
        form.email.set_value("bo@li.com");
        form.cycle_role();
        form.toggle_active();

        match form.submit() {
            Some(UserSubmission::Create(req)) => {
                assert_eq!(req.email, "bo@li.com");
                assert_eq!(req.role, Some(UserRole::Developer));
            }
            other => panic!("unexpected submission: {:?}", other),
        }
        assert!(form.is_active);
    }

    #[test]
    fn test_blank_first_name_is_rejected() {
        let mut form = UserEditorForm::edit(&user());
        form.first_name.set_value("   ");
        assert!(form.submit().is_none());
        assert_eq!(form.first_name.errors(), vec!["First name is required"]);
    }

    #[test]
    fn test_create_requires_valid_email() {
        let mut form = UserEditorForm::create();
        form.first_name.set_value("Bo");
        form.email.set_value("bo");
        assert!(form.submit().is_none());
        assert_eq!(form.email.errors(), vec!["Invalid email address"]);
    }

    #[test]
    fn test_edit_submission_keeps_id() {
        let mut form = UserEditorForm::edit(&user());
        assert_eq!(form.mode(), EditorMode::Edit(42));
        form.toggle_active();

        match form.submit() {
            Some(UserSubmission::Update(req)) => {
                assert_eq!(req.id, 42);
                assert_eq!(req.first_name, "Dee");
                assert_eq!(req.is_active, Some(false));
                assert_eq!(req.role, Some(UserRole::Developer));
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }
}
