//! Application state management for the Catchook dashboard.
//!
//! `App` owns every piece of front-end state: the route guard and current
//! screen, form state, the user listing, health status and overlays. Network
//! calls run in spawned tasks and report back through `BackgroundResult`
//! messages, drained once per UI tick by `check_background_tasks`.
//!
//! A `SessionEvent::Expired` from the gateway client triggers a hard reset:
//! the whole `App` is rebuilt and the user lands on the login screen.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use catchook_core::api::ApiError;
use catchook_core::auth::guard::{self, HOME, LOGIN, SETUP, USERS};
use catchook_core::auth::{load_current_user, CurrentUserOutcome, FileCookieJar, RouteGuard, SessionEvent, SessionStore};
use catchook_core::forms::{Form, LoginForm, SetupForm, UserEditorForm, UserSubmission};
use catchook_core::models::{ApiStatus, HealthCheckResponse, Pagination, User};
use catchook_core::users::{UserListState, UserQuery};
use catchook_core::{ApiClient, Config};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for any text input.
const MAX_INPUT_LENGTH: usize = 128;

/// Quiet period after the last keystroke before a search is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Health check retries at start-up.
const HEALTH_RETRIES: u32 = 2;

// ============================================================================
// UI State Types
// ============================================================================

/// One screen per route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Setup,
    Dashboard,
    Users,
}

impl Screen {
    pub fn from_path(path: &str) -> Self {
        match path {
            LOGIN => Screen::Login,
            SETUP => Screen::Setup,
            USERS => Screen::Users,
            _ => Screen::Dashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Login => LOGIN,
            Screen::Setup => SETUP,
            Screen::Dashboard => HOME,
            Screen::Users => USERS,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Setup => "Setup",
            Screen::Dashboard => "Dashboard",
            Screen::Users => "Users",
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    CommandMenu,
    EditingUser,
    ConfirmingDelete(i64),
    ConfirmingQuit,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFocus {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    Button,
}

impl SetupFocus {
    const ORDER: [SetupFocus; 6] = [
        SetupFocus::FirstName,
        SetupFocus::LastName,
        SetupFocus::Email,
        SetupFocus::Password,
        SetupFocus::ConfirmPassword,
        SetupFocus::Button,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFocus {
    FirstName,
    LastName,
    Email,
    Role,
    Active,
    Button,
}

impl EditorFocus {
    /// Focus order; e-mail is only editable when creating, the active flag
    /// only when editing.
    fn order(create: bool) -> &'static [EditorFocus] {
        if create {
            &[
                EditorFocus::FirstName,
                EditorFocus::LastName,
                EditorFocus::Email,
                EditorFocus::Role,
                EditorFocus::Button,
            ]
        } else {
            &[
                EditorFocus::FirstName,
                EditorFocus::LastName,
                EditorFocus::Role,
                EditorFocus::Active,
                EditorFocus::Button,
            ]
        }
    }

    pub fn next(self, create: bool) -> Self {
        let order = Self::order(create);
        let i = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(i + 1) % order.len()]
    }

    pub fn prev(self, create: bool) -> Self {
        let order = Self::order(create);
        let i = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(i + order.len() - 1) % order.len()]
    }
}

/// Entries of the Ctrl+K command menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dashboard,
    Users,
    Refresh,
    Logout,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Dashboard, Command::Users, Command::Refresh, Command::Logout];

    pub fn label(&self) -> &'static str {
        match self {
            Command::Dashboard => "Go to Dashboard",
            Command::Users => "Go to Users",
            Command::Refresh => "Refresh data",
            Command::Logout => "Log out",
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Messages from spawned network tasks back to the UI loop.
pub enum BackgroundResult {
    Health(Result<HealthCheckResponse, ApiError>),
    Login(Result<Option<User>, ApiError>),
    Setup { email: String, result: Result<(), ApiError> },
    CurrentUser(CurrentUserOutcome),
    Users(UserQuery, Result<(Vec<User>, Pagination), String>),
    UserSaved(Result<User, ApiError>),
    UserDeleted(Result<i64, ApiError>),
    LoggedOut,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,

    // Navigation
    pub guard: RouteGuard,
    pub screen: Screen,
    pub state: AppState,

    // Session
    pub current_user: Option<User>,
    user_loading: bool,

    // Public forms
    pub login_form: LoginForm,
    pub login_focus: LoginFocus,
    pub setup_form: SetupForm,
    pub setup_focus: SetupFocus,

    // Health
    pub health: Option<HealthCheckResponse>,
    health_loading: bool,
    health_failed: bool,

    // Users screen
    pub users: UserListState,
    pub user_selection: usize,
    pub search_input: String,
    search_edited_at: Option<Instant>,
    pub editor: Option<UserEditorForm>,
    pub editor_focus: EditorFocus,

    // Command menu
    pub command_filter: String,
    pub command_selection: usize,

    pub status_message: Option<String>,

    // Channels
    bg_tx: mpsc::Sender<BackgroundResult>,
    bg_rx: mpsc::Receiver<BackgroundResult>,
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl App {
    /// Create the application with a cookie jar in the cache directory
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let jar = Arc::new(FileCookieJar::new(&cache_dir));
        let store = SessionStore::for_kind(config.scheme, jar);
        let api = ApiClient::new(&config, store)?;
        Ok(Self::with_client(config, api))
    }

    /// Fresh state around an existing client. Nothing is fetched until `start`.
    pub fn with_client(config: Config, api: ApiClient) -> Self {
        let (bg_tx, bg_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let api = api.with_session_events(session_tx);
        let login_form = LoginForm::new(config.last_email.as_deref());
        let login_focus = if config.last_email.is_some() {
            LoginFocus::Password
        } else {
            LoginFocus::Email
        };

        let mut app = Self {
            config,
            api,
            guard: RouteGuard::new(),
            screen: Screen::Dashboard,
            state: AppState::Normal,
            current_user: None,
            user_loading: false,
            login_form,
            login_focus,
            setup_form: SetupForm::new(),
            setup_focus: SetupFocus::FirstName,
            health: None,
            health_loading: false,
            health_failed: false,
            users: UserListState::new(),
            user_selection: 0,
            search_input: String::new(),
            search_edited_at: None,
            editor: None,
            editor_focus: EditorFocus::FirstName,
            command_filter: String::new(),
            command_selection: 0,
            status_message: None,
            bg_tx,
            bg_rx,
            session_rx,
        };
        app.resolve_route(HOME);
        app
    }

    /// Kick off start-up fetches
    pub fn start(&mut self) {
        self.fetch_health();
        self.load_user_if_needed();
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = BackgroundResult> + Send + 'static,
    {
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            // Receiver gone means the app was reset or is quitting
            let _ = tx.send(result).await;
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn resolve_route(&mut self, path: &str) {
        let has_session = self.api.session_store().has_session();
        let resolved = self.guard.navigate(path, has_session).to_string();
        self.screen = Screen::from_path(&resolved);
        debug!(requested = %path, resolved = %resolved, "Route resolved");
    }

    /// Navigate to `path` through the route guard.
    pub fn navigate(&mut self, path: &str) {
        self.state = AppState::Normal;
        self.resolve_route(path);
        self.load_user_if_needed();
    }

    pub fn is_protected_screen(&self) -> bool {
        self.guard.is_protected()
    }

    fn load_user_if_needed(&mut self) {
        if !self.guard.is_ready()
            || !self.guard.is_protected()
            || self.current_user.is_some()
            || self.user_loading
            || !self.api.session_store().has_session()
        {
            return;
        }
        self.user_loading = true;
        let api = self.api.clone();
        self.spawn_task(async move { BackgroundResult::CurrentUser(load_current_user(&api).await) });
    }

    /// Rebuild every piece of in-memory state and land on the login screen.
    pub fn hard_reset(&mut self, message: Option<String>) {
        info!("Resetting application state");
        let fresh = Self::with_client(self.config.clone(), self.api.clone());
        *self = fresh;
        self.status_message = message;
        self.navigate(LOGIN);
        self.fetch_health();
    }

    // =========================================================================
    // Health
    // =========================================================================

    pub fn fetch_health(&mut self) {
        self.health_loading = true;
        let api = self.api.clone();
        self.spawn_task(async move { BackgroundResult::Health(api.health_with_retries(HEALTH_RETRIES).await) });
    }

    pub fn api_status(&self) -> ApiStatus {
        ApiStatus::from_health(self.health_loading, self.health_failed, self.health.as_ref())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub fn submit_login(&mut self) {
        if self.login_form.status().submitting {
            return;
        }
        let Some(credentials) = self.login_form.submit() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_task(async move {
            BackgroundResult::Login(api.login(&credentials).await.map(|auth| auth.user))
        });
    }

    /// Validate the setup form and create the administrator. A password
    /// mismatch stops here without a request.
    pub fn submit_setup(&mut self) {
        if self.setup_form.status().submitting {
            return;
        }
        let Some(request) = self.setup_form.submit() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_task(async move {
            let result = api.setup_admin(&request).await;
            BackgroundResult::Setup {
                email: request.email,
                result,
            }
        });
    }

    pub fn logout(&mut self) {
        let api = self.api.clone();
        self.spawn_task(async move {
            if let Err(e) = api.logout().await {
                warn!(error = %e, "Logout call failed");
            }
            BackgroundResult::LoggedOut
        });
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn selected_user(&self) -> Option<&User> {
        self.users.users.get(self.user_selection)
    }

    /// Record a keystroke in the search box; applied after the debounce period.
    pub fn edit_search(&mut self, value: String) {
        self.search_input = value;
        self.search_edited_at = Some(Instant::now());
    }

    /// Apply the search box to the listing now.
    pub fn commit_search(&mut self) {
        self.search_edited_at = None;
        let search = self.search_input.clone();
        self.users.set_search(&search);
    }

    /// Apply the search box once it has been idle for `SEARCH_DEBOUNCE`.
    pub fn apply_debounced_search(&mut self, now: Instant) {
        if let Some(edited) = self.search_edited_at {
            if now.duration_since(edited) >= SEARCH_DEBOUNCE {
                self.commit_search();
            }
        }
    }

    /// Start a listing fetch when the query changed since the last one.
    fn sync_user_listing(&mut self) {
        if self.screen != Screen::Users || !self.api.session_store().has_session() {
            return;
        }
        let Some(query) = self.users.pending_fetch() else {
            return;
        };
        self.users.mark_fetching(&query);
        let api = self.api.clone();
        self.spawn_task(async move {
            let result = api
                .list_users(&query)
                .await
                .map(|page| (page.data, page.pagination))
                .map_err(|e| e.to_string());
            BackgroundResult::Users(query, result)
        });
    }

    pub fn open_create_user(&mut self) {
        self.editor = Some(UserEditorForm::create());
        self.editor_focus = EditorFocus::FirstName;
        self.state = AppState::EditingUser;
    }

    pub fn open_edit_user(&mut self) {
        let Some(editor) = self.selected_user().map(UserEditorForm::edit) else {
            return;
        };
        self.editor = Some(editor);
        self.editor_focus = EditorFocus::FirstName;
        self.state = AppState::EditingUser;
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
        self.state = AppState::Normal;
    }

    pub fn submit_editor(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if editor.status().submitting {
            return;
        }
        let Some(submission) = editor.submit() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_task(async move {
            let result = match submission {
                UserSubmission::Create(req) => api.create_user(&req).await,
                UserSubmission::Update(req) => api.update_user(&req).await,
            };
            BackgroundResult::UserSaved(result)
        });
    }

    pub fn confirm_delete_selected(&mut self) {
        let Some(id) = self.selected_user().map(|u| u.id) else {
            return;
        };
        if self.current_user.as_ref().map(|u| u.id) == Some(id) {
            self.status_message = Some("You cannot delete your own account".to_string());
            return;
        }
        self.state = AppState::ConfirmingDelete(id);
    }

    pub fn delete_user(&mut self, id: i64) {
        self.state = AppState::Normal;
        let api = self.api.clone();
        self.spawn_task(async move { BackgroundResult::UserDeleted(api.delete_user(id).await.map(|_| id)) });
    }

    /// Re-fetch whatever the current screen shows
    pub fn refresh(&mut self) {
        self.users.invalidate();
        self.fetch_health();
        self.status_message = Some("Refreshing...".to_string());
    }

    // =========================================================================
    // Command menu
    // =========================================================================

    pub fn open_command_menu(&mut self) {
        if !self.is_protected_screen() {
            return;
        }
        self.command_filter.clear();
        self.command_selection = 0;
        self.state = AppState::CommandMenu;
    }

    pub fn filtered_commands(&self) -> Vec<Command> {
        let filter = self.command_filter.to_lowercase();
        Command::ALL
            .iter()
            .copied()
            .filter(|c| c.label().to_lowercase().contains(&filter))
            .collect()
    }

    pub fn run_command(&mut self, command: Command) {
        self.state = AppState::Normal;
        match command {
            Command::Dashboard => self.navigate(HOME),
            Command::Users => self.navigate(USERS),
            Command::Refresh => self.refresh(),
            Command::Logout => self.logout(),
        }
    }

    // =========================================================================
    // Background processing
    // =========================================================================

    /// Drain session events and task results, then run the deferred effects
    /// (debounced search, listing fetch).
    pub async fn check_background_tasks(&mut self) {
        let mut expired = false;
        while let Ok(event) = self.session_rx.try_recv() {
            match event {
                SessionEvent::Expired => expired = true,
            }
        }
        if expired {
            self.hard_reset(Some("Session expired - please log in again".to_string()));
            return;
        }

        let mut results = Vec::new();
        while let Ok(result) = self.bg_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_result(result);
        }

        self.apply_debounced_search(Instant::now());
        self.sync_user_listing();
    }

    fn process_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Health(Ok(health)) => {
                self.health_loading = false;
                self.health_failed = false;
                if let Some(target) = guard::setup_redirect(&health, self.guard.path()) {
                    info!("Backend needs first-time setup");
                    self.health = Some(health);
                    self.navigate(target);
                } else {
                    self.health = Some(health);
                }
            }
            BackgroundResult::Health(Err(e)) => {
                warn!(error = %e, "Health check failed");
                self.health_loading = false;
                self.health_failed = true;
            }
            BackgroundResult::Login(Ok(user)) => {
                self.login_form.finish_submit();
                self.login_form.password.value.clear();
                let email = self.login_form.email.value.trim().to_string();
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.current_user = user;
                self.status_message = None;
                info!("Login successful");
                self.navigate(HOME);
            }
            BackgroundResult::Login(Err(e)) => {
                self.login_form.apply_server_error(&e);
            }
            BackgroundResult::Setup { email, result: Ok(()) } => {
                self.setup_form = SetupForm::new();
                if let Some(ref mut health) = self.health {
                    health.is_first_time_setup = false;
                }
                self.login_form = LoginForm::new(Some(&email));
                self.login_focus = LoginFocus::Password;
                self.status_message = Some("Administrator account created - please log in".to_string());
                self.navigate(LOGIN);
            }
            BackgroundResult::Setup { result: Err(e), .. } => {
                self.setup_form.apply_server_error(&e);
            }
            BackgroundResult::CurrentUser(CurrentUserOutcome::Loaded(user)) => {
                self.user_loading = false;
                self.current_user = Some(user);
            }
            BackgroundResult::CurrentUser(CurrentUserOutcome::Invalidated { redirect, error }) => {
                self.user_loading = false;
                self.current_user = None;
                if !matches!(error, ApiError::SessionExpired) {
                    self.status_message = Some(error.to_string());
                }
                self.navigate(redirect);
            }
            BackgroundResult::Users(query, result) => {
                if self.users.apply_result(&query, result) {
                    let len = self.users.users.len();
                    self.user_selection = self.user_selection.min(len.saturating_sub(1));
                    if self.status_message.as_deref() == Some("Refreshing...") {
                        self.status_message = None;
                    }
                }
            }
            BackgroundResult::UserSaved(Ok(user)) => {
                self.status_message = Some(format!("Saved {}", user.display_name()));
                if self.current_user.as_ref().map(|u| u.id) == Some(user.id) {
                    self.current_user = Some(user);
                }
                self.close_editor();
                self.users.invalidate();
            }
            BackgroundResult::UserSaved(Err(e)) => {
                if let Some(ref mut editor) = self.editor {
                    editor.apply_server_error(&e);
                }
            }
            BackgroundResult::UserDeleted(Ok(id)) => {
                debug!(id, "User deleted");
                self.status_message = Some("User deleted".to_string());
                self.users.invalidate();
            }
            BackgroundResult::UserDeleted(Err(e)) => {
                self.status_message = Some(format!("Failed to delete user: {}", e));
            }
            BackgroundResult::LoggedOut => {
                self.hard_reset(Some("Logged out".to_string()));
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character should be accepted into a text field
pub fn can_add_char(current_len: usize, c: char) -> bool {
    current_len < MAX_INPUT_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::test_support::{app_with_session, build_app, Rejecting};
    use super::*;
    use catchook_core::auth::CookieJar;

    #[test]
    fn test_screen_paths() {
        for screen in [Screen::Login, Screen::Setup, Screen::Dashboard, Screen::Users] {
            assert_eq!(Screen::from_path(screen.path()), screen);
        }
        assert_eq!(Screen::from_path("/nowhere"), Screen::Dashboard);
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Email);
        assert_eq!(LoginFocus::Email.prev(), LoginFocus::Button);
        assert_eq!(SetupFocus::Button.next(), SetupFocus::FirstName);
        assert_eq!(SetupFocus::FirstName.prev(), SetupFocus::Button);
        assert_eq!(EditorFocus::LastName.next(true), EditorFocus::Email);
        assert_eq!(EditorFocus::LastName.next(false), EditorFocus::Role);
        assert_eq!(EditorFocus::Role.next(false), EditorFocus::Active);
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char(0, 'a'));
        assert!(can_add_char(127, '!'));
        assert!(!can_add_char(128, 'a'));
        assert!(!can_add_char(0, '\n'));
    }

    #[tokio::test]
    async fn test_start_without_session_lands_on_login() {
        let (_, app) = app_with_session(false);
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.is_protected_screen());
    }

    #[tokio::test]
    async fn test_session_on_login_redirects_home() {
        let (_, mut app) = app_with_session(true);
        assert_eq!(app.screen, Screen::Dashboard);
        app.navigate(LOGIN);
        assert_eq!(app.screen, Screen::Dashboard);
        app.navigate(USERS);
        assert_eq!(app.screen, Screen::Users);
    }

    #[tokio::test]
    async fn test_setup_mismatch_sends_nothing() {
        let (_, mut app) = app_with_session(false);
        app.setup_form.first_name.set_value("Ada");
        app.setup_form.email.set_value("ada@example.com");
        app.setup_form.password.set_value("supersecret");
        app.setup_form.confirm_password.set_value("supersecret!");

        app.submit_setup();

        assert_eq!(app.setup_form.form_error(), Some("Passwords do not match"));
        assert!(!app.setup_form.status().submitting);
        // Nothing was spawned, so nothing comes back
        tokio::task::yield_now().await;
        assert!(app.bg_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_search_is_debounced() {
        let (_, mut app) = app_with_session(true);
        app.navigate(USERS);
        app.edit_search("ann".to_string());
        let edited = app.search_edited_at.unwrap();

        app.apply_debounced_search(edited + Duration::from_millis(100));
        assert_eq!(app.users.filters().search, "");

        app.apply_debounced_search(edited + SEARCH_DEBOUNCE);
        assert_eq!(app.users.filters().search, "ann");
        assert_eq!(app.users.query().page, 1);
    }

    #[tokio::test]
    async fn test_expired_session_resets_state() {
        let (_, mut app) = build_app(Arc::new(Rejecting), true);
        app.navigate(USERS);
        app.search_input = "leftover".to_string();

        let err = app.api.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert!(!app.api.session_store().has_session());

        app.check_background_tasks().await;
        assert_eq!(app.screen, Screen::Login);
        assert!(app.search_input.is_empty());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Session expired - please log in again")
        );
    }

    #[tokio::test]
    async fn test_logout_resets_state() {
        let (jar, mut app) = app_with_session(true);
        app.navigate(USERS);
        app.search_input = "leftover".to_string();

        jar.update(&[], &["session_id", "session_timestamp"]).unwrap();
        app.process_result(BackgroundResult::LoggedOut);

        assert_eq!(app.screen, Screen::Login);
        assert!(app.search_input.is_empty());
        assert!(app.current_user.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Logged out"));
    }

    #[tokio::test]
    async fn test_invalidated_user_goes_to_login() {
        let (jar, mut app) = app_with_session(true);
        jar.update(&[], &["session_id", "session_timestamp"]).unwrap();

        app.process_result(BackgroundResult::CurrentUser(CurrentUserOutcome::Invalidated {
            redirect: LOGIN,
            error: ApiError::Network("down".to_string()),
        }));
        assert_eq!(app.screen, Screen::Login);
    }

    #[tokio::test]
    async fn test_first_time_setup_redirect() {
        let (_, mut app) = app_with_session(false);
        let health: HealthCheckResponse = serde_json::from_str(
            r#"{"status":"ok","version":"1","services":{"database":"up","redis":"up"},"is_first_time_setup":true}"#,
        )
        .unwrap();
        app.process_result(BackgroundResult::Health(Ok(health)));
        assert_eq!(app.screen, Screen::Setup);
        assert_eq!(app.api_status(), ApiStatus::Operational);
    }

    #[tokio::test]
    async fn test_command_menu_only_on_protected_screens() {
        let (_, mut app) = app_with_session(false);
        app.open_command_menu();
        assert_eq!(app.state, AppState::Normal);

        let (_, mut app) = app_with_session(true);
        app.open_command_menu();
        assert_eq!(app.state, AppState::CommandMenu);
        app.command_filter = "user".to_string();
        assert_eq!(app.filtered_commands(), vec![Command::Users]);
        app.run_command(Command::Users);
        assert_eq!(app.screen, Screen::Users);
    }
}
