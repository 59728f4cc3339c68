use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::cookies::CookieJar;
use super::scheme::{self, CredentialScheme};
use crate::config::SchemeKind;

/// How long a session id stays valid after it was issued (24 hours)
const SESSION_DURATION_HOURS: i64 = 24;

/// Refresh this long before the session expires (5 minutes)
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Opaque proof of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    SessionId(String),
    TokenPair { access: String, refresh: String },
}

/// Credential as read back from the jar.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredential {
    pub credential: Credential,
    /// When the credential was obtained or last refreshed. The token-pair
    /// scheme does not track this.
    pub issued_at: Option<DateTime<Utc>>,
}

/// Raised by the gateway when a refresh exchange failed and the stored
/// session was discarded. Front ends answer with a hard redirect to `/login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
}

/// True once the session is within the refresh margin of its expiry.
pub fn is_near_expiry(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let time_until_expiry = issued_at + Duration::hours(SESSION_DURATION_HOURS) - now;
    time_until_expiry <= Duration::minutes(REFRESH_MARGIN_MINUTES)
}

/// Cookie-backed store for the current credential.
/// Clone is cheap and every clone sees the same jar.
#[derive(Clone)]
pub struct SessionStore {
    jar: Arc<dyn CookieJar>,
    scheme: Arc<dyn CredentialScheme>,
}

impl SessionStore {
    pub fn new(jar: Arc<dyn CookieJar>, scheme: Arc<dyn CredentialScheme>) -> Self {
        Self { jar, scheme }
    }

    pub fn for_kind(kind: SchemeKind, jar: Arc<dyn CookieJar>) -> Self {
        Self::new(jar, scheme::for_kind(kind))
    }

    pub fn scheme(&self) -> &dyn CredentialScheme {
        self.scheme.as_ref()
    }

    /// Current credential, if a complete one is stored. Never touches the network.
    pub fn read(&self) -> Option<StoredCredential> {
        self.scheme.decode(&self.jar.read())
    }

    pub fn has_session(&self) -> bool {
        self.read().is_some()
    }

    /// Persist the credential together with its issue time.
    pub fn write(&self, credential: &Credential, issued_at: DateTime<Utc>) -> Result<()> {
        let cookies = self.scheme.encode(credential, issued_at)?;
        self.jar.update(&cookies, &[])?;
        debug!(scheme = ?self.scheme.kind(), "Session written");
        Ok(())
    }

    /// Remove every cookie of the active scheme.
    pub fn clear(&self) -> Result<()> {
        self.jar.update(&[], self.scheme.cookie_names())?;
        debug!(scheme = ?self.scheme.kind(), "Session cleared");
        Ok(())
    }

    pub fn is_near_expiry(&self, stored: &StoredCredential, now: DateTime<Utc>) -> bool {
        self.scheme.is_near_expiry(stored, now)
    }
}
