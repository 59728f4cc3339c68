//! Form state and client-side validation.
//!
//! Fields validate on every change and on blur; errors show once a field has
//! been touched. Server-side field errors from the latest submission are
//! shown next to client errors, never replacing them.

pub mod login;
pub mod setup;
pub mod user_editor;
pub mod validation;

pub use login::LoginForm;
pub use setup::SetupForm;
pub use user_editor::{EditorMode, UserEditorForm, UserSubmission};
pub use validation::{FieldState, Form, FormStatus};
