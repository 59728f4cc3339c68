//! Keyboard input handling for the TUI.
//!
//! Overlays take precedence over the screen underneath. Public screens are
//! forms, so printable keys go into the focused field there; protected
//! screens use single-key shortcuts.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use catchook_core::auth::guard::{HOME, USERS};
use catchook_core::forms::FieldState;
use catchook_core::models::UserRole;
use catchook_core::users::SortField;

use crate::app::{can_add_char, App, AppState, EditorFocus, LoginFocus, Screen, SetupFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete(id) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.delete_user(id),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::CommandMenu => {
            handle_command_menu_input(app, key);
            return Ok(false);
        }
        AppState::EditingUser => {
            handle_editor_input(app, key);
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    match app.screen {
        Screen::Login => handle_login_input(app, key),
        Screen::Setup => handle_setup_input(app, key),
        Screen::Dashboard | Screen::Users => handle_protected_input(app, key),
    }
}

/// Type into or erase from a text field. Returns true if the key was consumed.
fn edit_field(field: &mut FieldState, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if can_add_char(field.value.chars().count(), c) => {
            field.push_char(c);
            true
        }
        KeyCode::Backspace => {
            field.pop_char();
            true
        }
        _ => false,
    }
}

fn edit_text(text: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if can_add_char(text.chars().count(), c) => {
            text.push(c);
            true
        }
        KeyCode::Backspace => {
            text.pop();
            true
        }
        _ => false,
    }
}

// ============================================================================
// Public screens
// ============================================================================

fn login_field(app: &mut App) -> Option<&mut FieldState> {
    match app.login_focus {
        LoginFocus::Email => Some(&mut app.login_form.email),
        LoginFocus::Password => Some(&mut app.login_form.password),
        LoginFocus::Button => None,
    }
}

fn move_login_focus(app: &mut App, forward: bool) {
    if let Some(field) = login_field(app) {
        field.blur();
    }
    app.login_focus = if forward {
        app.login_focus.next()
    } else {
        app.login_focus.prev()
    };
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Tab | KeyCode::Down => move_login_focus(app, true),
        KeyCode::BackTab | KeyCode::Up => move_login_focus(app, false),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => move_login_focus(app, true),
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
        },
        _ => {
            if let Some(field) = login_field(app) {
                edit_field(field, key);
            }
        }
    }
    Ok(false)
}

fn setup_field(app: &mut App) -> Option<&mut FieldState> {
    let form = &mut app.setup_form;
    match app.setup_focus {
        SetupFocus::FirstName => Some(&mut form.first_name),
        SetupFocus::LastName => Some(&mut form.last_name),
        SetupFocus::Email => Some(&mut form.email),
        SetupFocus::Password => Some(&mut form.password),
        SetupFocus::ConfirmPassword => Some(&mut form.confirm_password),
        SetupFocus::Button => None,
    }
}

fn move_setup_focus(app: &mut App, forward: bool) {
    if let Some(field) = setup_field(app) {
        field.blur();
    }
    app.setup_focus = if forward {
        app.setup_focus.next()
    } else {
        app.setup_focus.prev()
    };
}

fn handle_setup_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Tab | KeyCode::Down => move_setup_focus(app, true),
        KeyCode::BackTab | KeyCode::Up => move_setup_focus(app, false),
        KeyCode::Enter => match app.setup_focus {
            SetupFocus::ConfirmPassword | SetupFocus::Button => app.submit_setup(),
            _ => move_setup_focus(app, true),
        },
        _ => {
            if let Some(field) = setup_field(app) {
                edit_field(field, key);
            }
        }
    }
    Ok(false)
}

// ============================================================================
// Protected screens
// ============================================================================

fn handle_protected_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('k') {
        app.open_command_menu();
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.navigate(HOME),
        KeyCode::Char('2') => app.navigate(USERS),
        KeyCode::Char('u') => app.refresh(),
        KeyCode::Char('L') => app.logout(),
        _ => {
            if app.screen == Screen::Users {
                handle_users_input(app, key);
            }
        }
    }
    Ok(false)
}

/// Role filter order: all roles, then each role in turn
fn next_role_filter(current: Option<UserRole>) -> Option<UserRole> {
    match current {
        None => Some(UserRole::ALL[0]),
        Some(role) if role == UserRole::ALL[UserRole::ALL.len() - 1] => None,
        Some(role) => Some(role.next()),
    }
}

fn handle_users_input(app: &mut App, key: KeyEvent) {
    let count = app.users.users.len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.user_selection = app.user_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.user_selection + 1 < count {
                app.user_selection += 1;
            }
        }
        KeyCode::Left | KeyCode::PageUp => {
            app.users.prev_page();
            app.user_selection = 0;
        }
        KeyCode::Right | KeyCode::PageDown => {
            app.users.next_page();
            app.user_selection = 0;
        }
        KeyCode::Char('/') => app.state = AppState::Searching,
        KeyCode::Char('n') => app.users.toggle_sort(SortField::FirstName),
        KeyCode::Char('e') => app.users.toggle_sort(SortField::Email),
        KeyCode::Char('r') => app.users.toggle_sort(SortField::Role),
        KeyCode::Char('s') => app.users.toggle_sort(SortField::IsActive),
        KeyCode::Char('c') => app.users.toggle_sort(SortField::CreatedAt),
        KeyCode::Char('f') => {
            let role = next_role_filter(app.users.filters().role);
            app.users.set_role(role);
        }
        KeyCode::Char('t') => {
            let status = app.users.filters().status.next();
            app.users.set_status(status);
        }
        KeyCode::Char('x') => {
            app.search_input.clear();
            app.users.reset_filters();
            app.user_selection = 0;
        }
        KeyCode::Char('a') => app.open_create_user(),
        KeyCode::Enter => app.open_edit_user(),
        KeyCode::Char('d') | KeyCode::Delete => app.confirm_delete_selected(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.commit_search();
            app.state = AppState::Normal;
        }
        KeyCode::Esc => {
            app.search_input.clear();
            app.commit_search();
            app.state = AppState::Normal;
        }
        _ => {
            let mut text = app.search_input.clone();
            if edit_text(&mut text, key) {
                app.user_selection = 0;
                app.edit_search(text);
            }
        }
    }
}

fn handle_command_menu_input(app: &mut App, key: KeyEvent) {
    let commands = app.filtered_commands();
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Up => app.command_selection = app.command_selection.saturating_sub(1),
        KeyCode::Down => {
            if app.command_selection + 1 < commands.len() {
                app.command_selection += 1;
            }
        }
        KeyCode::Enter => match commands.get(app.command_selection) {
            Some(command) => app.run_command(*command),
            None => app.state = AppState::Normal,
        },
        _ => {
            if edit_text(&mut app.command_filter, key) {
                app.command_selection = 0;
            }
        }
    }
}

// ============================================================================
// User editor overlay
// ============================================================================

fn editor_field(app: &mut App) -> Option<&mut FieldState> {
    let focus = app.editor_focus;
    let editor = app.editor.as_mut()?;
    match focus {
        EditorFocus::FirstName => Some(&mut editor.first_name),
        EditorFocus::LastName => Some(&mut editor.last_name),
        EditorFocus::Email if editor.is_create() => Some(&mut editor.email),
        _ => None,
    }
}

fn move_editor_focus(app: &mut App, forward: bool) {
    let Some(create) = app.editor.as_ref().map(|e| e.is_create()) else {
        return;
    };
    if let Some(field) = editor_field(app) {
        field.blur();
    }
    app.editor_focus = if forward {
        app.editor_focus.next(create)
    } else {
        app.editor_focus.prev(create)
    };
}

fn handle_editor_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_editor(),
        KeyCode::Tab | KeyCode::Down => move_editor_focus(app, true),
        KeyCode::BackTab | KeyCode::Up => move_editor_focus(app, false),
        _ => match app.editor_focus {
            EditorFocus::Role => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) {
                    if let Some(ref mut editor) = app.editor {
                        editor.cycle_role();
                    }
                }
            }
            EditorFocus::Active => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    if let Some(ref mut editor) = app.editor {
                        editor.toggle_active();
                    }
                }
            }
            EditorFocus::Button => {
                if key.code == KeyCode::Enter {
                    app.submit_editor();
                }
            }
            _ => {
                if key.code == KeyCode::Enter {
                    move_editor_focus(app, true);
                } else if let Some(field) = editor_field(app) {
                    edit_field(field, key);
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::app_with_session;
    use catchook_core::users::SortOrder;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_login_typing_goes_into_focused_field() {
        let (_, mut app) = app_with_session(false);
        assert_eq!(app.login_focus, LoginFocus::Email);
        type_text(&mut app, "q@example.com");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pw");

        assert_eq!(app.login_form.email.value, "q@example.com");
        assert_eq!(app.login_form.password.value, "pw");
        // 'q' was typed, not treated as quit
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_login_blur_shows_error() {
        let (_, mut app) = app_with_session(false);
        type_text(&mut app, "nope");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.login_form.email.errors(), vec!["Invalid email address"]);
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let (_, mut app) = app_with_session(true);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(press(&mut app, KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_users_sort_and_filters() {
        let (_, mut app) = app_with_session(true);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.screen, Screen::Users);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.users.filters().order_by, SortField::Email);
        assert_eq!(app.users.filters().order, SortOrder::Asc);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.users.filters().role, Some(UserRole::Viewer));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.users.filters().role, None);
    }

    #[test]
    fn test_role_filter_wraps_to_all() {
        let mut role = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            role = next_role_filter(role);
            seen.push(role);
        }
        assert_eq!(
            seen,
            vec![Some(UserRole::Viewer), Some(UserRole::Developer), Some(UserRole::Admin), None]
        );
    }

    #[tokio::test]
    async fn test_search_escape_clears() {
        let (_, mut app) = app_with_session(true);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "ann");
        assert_eq!(app.search_input, "ann");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.users.filters().search, "ann");

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.users.filters().search, "");
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_editor_role_cycles() {
        let (_, mut app) = app_with_session(true);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::EditingUser);

        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.editor_focus, EditorFocus::Role);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.editor.as_ref().unwrap().role, UserRole::Developer);

        press(&mut app, KeyCode::Esc);
        assert!(app.editor.is_none());
    }

    #[tokio::test]
    async fn test_command_menu_keys() {
        let (_, mut app) = app_with_session(true);
        handle_input(&mut app, KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(app.state, AppState::CommandMenu);

        type_text(&mut app, "users");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.screen, Screen::Users);
    }
}
