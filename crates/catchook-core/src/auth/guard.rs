//! Route guard.
//!
//! Routes are classified statically: `/login` and `/setup` are public,
//! everything else requires a session. The guard only looks at the path and
//! whether the session store holds a credential; it never touches the
//! network. Validating the credential is the current-user loader's job.

use tracing::debug;

use crate::models::HealthCheckResponse;

pub const HOME: &str = "/";
pub const USERS: &str = "/users";
pub const LOGIN: &str = "/login";
pub const SETUP: &str = "/setup";

const PUBLIC_ROUTES: [&str; 2] = [LOGIN, SETUP];

pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Redirect(&'static str),
    Ready,
}

/// Decide what to do with a navigation to `path`.
pub fn check(path: &str, has_session: bool) -> GuardDecision {
    match (has_session, is_public(path)) {
        (true, true) => GuardDecision::Redirect(HOME),
        (false, false) => GuardDecision::Redirect(LOGIN),
        _ => GuardDecision::Ready,
    }
}

/// Redirect target once health reports an uninitialized backend.
pub fn setup_redirect(health: &HealthCheckResponse, path: &str) -> Option<&'static str> {
    (health.requires_setup() && path != SETUP).then_some(SETUP)
}

/// Guard state for the current navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    path: String,
    ready: bool,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            path: HOME.to_string(),
            ready: false,
        }
    }

    /// Start a navigation and resolve it. Follows at most one redirect, after
    /// which the route is ready regardless of the session state.
    pub fn navigate(&mut self, path: &str, has_session: bool) -> &str {
        self.path = path.to_string();
        self.ready = false;

        if let GuardDecision::Redirect(target) = self.evaluate(has_session) {
            debug!(from = %path, to = target, "Route guard redirect");
            self.path = target.to_string();
        }
        self.ready = true;
        &self.path
    }

    /// Re-run the guard for the current path. Once the route is ready this
    /// never asks for another redirect.
    pub fn evaluate(&self, has_session: bool) -> GuardDecision {
        if self.ready {
            return GuardDecision::Ready;
        }
        check(&self.path, has_session)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_protected(&self) -> bool {
        !is_public(&self.path)
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceStatus;

    #[test]
    fn test_check_matrix() {
        assert_eq!(check(LOGIN, true), GuardDecision::Redirect(HOME));
        assert_eq!(check(SETUP, true), GuardDecision::Redirect(HOME));
        assert_eq!(check(HOME, false), GuardDecision::Redirect(LOGIN));
        assert_eq!(check(USERS, false), GuardDecision::Redirect(LOGIN));
        assert_eq!(check(HOME, true), GuardDecision::Ready);
        assert_eq!(check(LOGIN, false), GuardDecision::Ready);
    }

    #[test]
    fn test_navigate_with_session_on_login() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.navigate(LOGIN, true), HOME);
        assert!(guard.is_ready());
        assert!(guard.is_protected());
    }

    #[test]
    fn test_navigate_without_session_on_home() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.navigate(HOME, false), LOGIN);
        assert!(!guard.is_protected());
    }

    #[test]
    fn test_ready_route_does_not_redirect_again() {
        let mut guard = RouteGuard::new();
        guard.navigate(USERS, true);
        // Session disappears while the route is showing
        assert_eq!(guard.evaluate(false), GuardDecision::Ready);
        assert_eq!(guard.path(), USERS);

        // A fresh navigation does check again
        assert_eq!(guard.navigate(USERS, false), LOGIN);
    }

    #[test]
    fn test_setup_redirect() {
        let mut health = HealthCheckResponse {
            status: "ok".to_string(),
            version: String::new(),
            message: None,
            services: ServiceStatus::default(),
            is_first_time_setup: true,
        };
        assert_eq!(setup_redirect(&health, LOGIN), Some(SETUP));
        assert_eq!(setup_redirect(&health, SETUP), None);

        health.is_first_time_setup = false;
        assert_eq!(setup_redirect(&health, LOGIN), None);
    }
}
