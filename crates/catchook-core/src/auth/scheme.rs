//! Credential schemes.
//!
//! A deployment speaks exactly one of two schemes:
//!
//! - `SessionIdScheme`: an opaque session id sent verbatim in the
//!   `Authorization` header, valid for 24 hours and refreshed proactively
//!   once it is within five minutes of expiry.
//! - `TokenPairScheme`: a bearer access token plus a refresh token. There is
//!   no proactive check; it is refreshed only after a 401.
//!
//! Everything scheme-specific (cookie layout, header format, refresh request
//! and response shapes) lives behind `CredentialScheme`, so the session store
//! and the gateway client stay scheme-agnostic.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use super::cookies::Cookies;
use super::session::{is_near_expiry, Credential, StoredCredential};
use crate::api::transport::ApiRequest;
use crate::api::ApiError;
use crate::config::SchemeKind;
use crate::models::{AuthResponse, AuthSession, TokenPair};

pub const SESSION_ID_COOKIE: &str = "session_id";
pub const SESSION_TIMESTAMP_COOKIE: &str = "session_timestamp";
pub const AUTH_TOKEN_COOKIE: &str = "authToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Path of the refresh exchange endpoint
pub const REFRESH_PATH: &str = "/auth/refresh";

pub trait CredentialScheme: Send + Sync {
    fn kind(&self) -> SchemeKind;

    /// Every cookie this scheme owns; cleared together
    fn cookie_names(&self) -> &'static [&'static str];

    fn encode(&self, credential: &Credential, issued_at: DateTime<Utc>) -> Result<Vec<(&'static str, String)>>;

    /// Rebuild the credential from the jar. Incomplete cookie sets yield `None`.
    fn decode(&self, cookies: &Cookies) -> Option<StoredCredential>;

    /// Put the credential on the request's authorization channel
    fn attach(&self, request: &mut ApiRequest, credential: &Credential);

    fn is_near_expiry(&self, stored: &StoredCredential, now: DateTime<Utc>) -> bool;

    fn refresh_request(&self, credential: &Credential) -> Result<ApiRequest, ApiError>;

    /// New credential from the `data` member of a refresh response
    fn credential_from_refresh(&self, data: serde_json::Value, previous: &Credential) -> Result<Credential, ApiError>;

    fn credential_from_login(&self, auth: &AuthResponse) -> Result<Credential, ApiError>;
}

pub fn for_kind(kind: SchemeKind) -> Arc<dyn CredentialScheme> {
    match kind {
        SchemeKind::Session => Arc::new(SessionIdScheme),
        SchemeKind::Tokens => Arc::new(TokenPairScheme),
    }
}

fn wrong_kind(expected: SchemeKind) -> anyhow::Error {
    anyhow::anyhow!("Credential does not belong to the {:?} scheme", expected)
}

// ============================================================================
// Session id
// ============================================================================

pub struct SessionIdScheme;

impl CredentialScheme for SessionIdScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Session
    }

    fn cookie_names(&self) -> &'static [&'static str] {
        &[SESSION_ID_COOKIE, SESSION_TIMESTAMP_COOKIE]
    }

    fn encode(&self, credential: &Credential, issued_at: DateTime<Utc>) -> Result<Vec<(&'static str, String)>> {
        match credential {
            Credential::SessionId(id) => Ok(vec![
                (SESSION_ID_COOKIE, id.clone()),
                (SESSION_TIMESTAMP_COOKIE, issued_at.timestamp_millis().to_string()),
            ]),
            _ => Err(wrong_kind(SchemeKind::Session)),
        }
    }

    fn decode(&self, cookies: &Cookies) -> Option<StoredCredential> {
        let id = cookies.get(SESSION_ID_COOKIE).filter(|v| !v.is_empty())?;
        let millis: i64 = cookies.get(SESSION_TIMESTAMP_COOKIE)?.parse().ok()?;
        let issued_at = DateTime::from_timestamp_millis(millis)?;
        Some(StoredCredential {
            credential: Credential::SessionId(id.clone()),
            issued_at: Some(issued_at),
        })
    }

    fn attach(&self, request: &mut ApiRequest, credential: &Credential) {
        match credential {
            Credential::SessionId(id) => request.authorization = Some(id.clone()),
            _ => warn!("Ignoring token credential in session-id scheme"),
        }
    }

    fn is_near_expiry(&self, stored: &StoredCredential, now: DateTime<Utc>) -> bool {
        stored
            .issued_at
            .map(|issued| is_near_expiry(issued, now))
            .unwrap_or(false)
    }

    fn refresh_request(&self, credential: &Credential) -> Result<ApiRequest, ApiError> {
        let mut request = ApiRequest::post(REFRESH_PATH).json(&serde_json::json!({}))?;
        self.attach(&mut request, credential);
        Ok(request)
    }

    fn credential_from_refresh(&self, data: serde_json::Value, _previous: &Credential) -> Result<Credential, ApiError> {
        // Either `{session: {...}}` or the session itself
        let auth: AuthResponse = serde_json::from_value(data.clone())?;
        if auth.session.is_some() {
            return self.credential_from_login(&auth);
        }
        let session: AuthSession = serde_json::from_value(data)
            .map_err(|_| ApiError::InvalidResponse("response carries no session".to_string()))?;
        Ok(Credential::SessionId(session.session_id))
    }

    fn credential_from_login(&self, auth: &AuthResponse) -> Result<Credential, ApiError> {
        auth.session
            .as_ref()
            .map(|s| Credential::SessionId(s.session_id.clone()))
            .ok_or_else(|| ApiError::InvalidResponse("response carries no session".to_string()))
    }
}

// ============================================================================
// Access/refresh token pair
// ============================================================================

pub struct TokenPairScheme;

#[derive(Deserialize)]
struct TokensWrapper {
    tokens: TokenPair,
}

impl TokenPairScheme {
    fn pair_from(tokens: &TokenPair, previous_refresh: Option<&str>) -> Result<Credential, ApiError> {
        let refresh = tokens
            .refresh_token
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| ApiError::InvalidResponse("response carries no refresh token".to_string()))?;
        Ok(Credential::TokenPair {
            access: tokens.access_token.clone(),
            refresh,
        })
    }
}

impl CredentialScheme for TokenPairScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Tokens
    }

    fn cookie_names(&self) -> &'static [&'static str] {
        &[AUTH_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
    }

    fn encode(&self, credential: &Credential, _issued_at: DateTime<Utc>) -> Result<Vec<(&'static str, String)>> {
        match credential {
            Credential::TokenPair { access, refresh } => Ok(vec![
                (AUTH_TOKEN_COOKIE, access.clone()),
                (REFRESH_TOKEN_COOKIE, refresh.clone()),
            ]),
            _ => Err(wrong_kind(SchemeKind::Tokens)),
        }
    }

    fn decode(&self, cookies: &Cookies) -> Option<StoredCredential> {
        let access = cookies.get(AUTH_TOKEN_COOKIE).filter(|v| !v.is_empty())?;
        let refresh = cookies.get(REFRESH_TOKEN_COOKIE).filter(|v| !v.is_empty())?;
        Some(StoredCredential {
            credential: Credential::TokenPair {
                access: access.clone(),
                refresh: refresh.clone(),
            },
            issued_at: None,
        })
    }

    fn attach(&self, request: &mut ApiRequest, credential: &Credential) {
        match credential {
            Credential::TokenPair { access, .. } => {
                request.authorization = Some(format!("Bearer {}", access))
            }
            _ => warn!("Ignoring session id in token-pair scheme"),
        }
    }

    fn is_near_expiry(&self, _stored: &StoredCredential, _now: DateTime<Utc>) -> bool {
        false
    }

    fn refresh_request(&self, credential: &Credential) -> Result<ApiRequest, ApiError> {
        match credential {
            Credential::TokenPair { refresh, .. } => {
                ApiRequest::post(REFRESH_PATH).json(&serde_json::json!({ "refreshToken": refresh }))
            }
            _ => Err(ApiError::InvalidResponse(
                "no refresh token available".to_string(),
            )),
        }
    }

    fn credential_from_refresh(&self, data: serde_json::Value, previous: &Credential) -> Result<Credential, ApiError> {
        let previous_refresh = match previous {
            Credential::TokenPair { refresh, .. } => Some(refresh.as_str()),
            _ => None,
        };
        // Either `{tokens: {...}}` or the pair itself
        let tokens = match serde_json::from_value::<TokensWrapper>(data.clone()) {
            Ok(wrapper) => wrapper.tokens,
            Err(_) => serde_json::from_value::<TokenPair>(data)?,
        };
        Self::pair_from(&tokens, previous_refresh)
    }

    fn credential_from_login(&self, auth: &AuthResponse) -> Result<Credential, ApiError> {
        let tokens = auth
            .tokens
            .as_ref()
            .ok_or_else(|| ApiError::InvalidResponse("response carries no tokens".to_string()))?;
        Self::pair_from(tokens, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn pair(access: &str, refresh: &str) -> Credential {
        Credential::TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }
    }

    #[test]
    fn test_session_attach_is_raw_id() {
        let mut req = ApiRequest::get("/users/me");
        SessionIdScheme.attach(&mut req, &Credential::SessionId("abc".to_string()));
        assert_eq!(req.authorization.as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_attach_is_bearer() {
        let mut req = ApiRequest::get("/users/me");
        TokenPairScheme.attach(&mut req, &pair("acc", "ref"));
        assert_eq!(req.authorization.as_deref(), Some("Bearer acc"));
    }

    #[test]
    fn test_session_refresh_request() {
        let req = SessionIdScheme
            .refresh_request(&Credential::SessionId("abc".to_string()))
            .unwrap();
        assert_eq!(req.path, REFRESH_PATH);
        assert_eq!(req.authorization.as_deref(), Some("abc"));
        assert_eq!(req.body, Some(json!({})));
    }

    #[test]
    fn test_token_refresh_request_carries_refresh_in_body() {
        let req = TokenPairScheme.refresh_request(&pair("acc", "ref")).unwrap();
        assert!(req.authorization.is_none());
        assert_eq!(req.body, Some(json!({"refreshToken": "ref"})));
    }

    #[test]
    fn test_session_credential_from_refresh() {
        let data = json!({"session": {"session_id": "new-id"}});
        let cred = SessionIdScheme
            .credential_from_refresh(data, &Credential::SessionId("old".to_string()))
            .unwrap();
        assert_eq!(cred, Credential::SessionId("new-id".to_string()));

        let bare = SessionIdScheme
            .credential_from_refresh(json!({"session_id": "bare-id"}), &Credential::SessionId("old".to_string()))
            .unwrap();
        assert_eq!(bare, Credential::SessionId("bare-id".to_string()));

        assert!(SessionIdScheme
            .credential_from_refresh(json!({}), &Credential::SessionId("old".to_string()))
            .is_err());
    }

    #[test]
    fn test_token_credential_from_refresh_shapes() {
        let previous = pair("old-acc", "old-ref");

        let wrapped = json!({"tokens": {"access_token": "a1", "refresh_token": "r1"}});
        assert_eq!(
            TokenPairScheme.credential_from_refresh(wrapped, &previous).unwrap(),
            pair("a1", "r1")
        );

        // Bare pair without a new refresh token keeps the old one
        let bare = json!({"access_token": "a2"});
        assert_eq!(
            TokenPairScheme.credential_from_refresh(bare, &previous).unwrap(),
            pair("a2", "old-ref")
        );
    }

    #[test]
    fn test_token_scheme_never_near_expiry() {
        let stored = StoredCredential {
            credential: pair("a", "r"),
            issued_at: Some(Utc::now() - Duration::days(30)),
        };
        assert!(!TokenPairScheme.is_near_expiry(&stored, Utc::now()));
    }

    #[test]
    fn test_token_decode_requires_both_cookies() {
        let mut cookies = Cookies::new();
        cookies.insert(AUTH_TOKEN_COOKIE.to_string(), "a".to_string());
        assert!(TokenPairScheme.decode(&cookies).is_none());
        cookies.insert(REFRESH_TOKEN_COOKIE.to_string(), "r".to_string());
        assert_eq!(
            TokenPairScheme.decode(&cookies).unwrap().credential,
            pair("a", "r")
        );
        // Session-id cookies are invisible to the token scheme
        assert!(SessionIdScheme.decode(&cookies).is_none());
    }

    #[test]
    fn test_session_decode_rejects_bad_timestamp() {
        let mut cookies = Cookies::new();
        cookies.insert(SESSION_ID_COOKIE.to_string(), "abc".to_string());
        cookies.insert(SESSION_TIMESTAMP_COOKIE.to_string(), "yesterday".to_string());
        assert!(SessionIdScheme.decode(&cookies).is_none());
    }
}
