//! Gateway client for the Catchook REST API.
//!
//! Every backend call goes through `ApiClient`. Authenticated requests pass
//! two interceptors:
//!
//! - outbound: attach the stored credential; when the active scheme says the
//!   credential is near expiry, run a refresh exchange first and send with
//!   the new credential.
//! - inbound: on a 401 for a request that has not been retried, run one
//!   refresh exchange and resend once. A 401 on the resend propagates.
//!
//! A failed refresh exchange clears the session store, emits
//! `SessionEvent::Expired` and fails the call with `ApiError::SessionExpired`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::transport::{ApiRequest, HttpTransport, RawResponse, ReqwestTransport};
use super::ApiError;
use crate::auth::{Credential, SessionEvent, SessionStore};
use crate::config::Config;
use crate::models::{
    ApiResponse, AuthResponse, CreateUserRequest, HealthCheckResponse, LoginCredentials,
    PaginatedResponse, SetupAdminUserRequest, UpdateUserRequest, User,
};
use crate::users::UserQuery;

/// Delay before the first health retry; doubles on each attempt
const INITIAL_BACKOFF_MS: u64 = 500;

fn storage_error(e: anyhow::Error) -> ApiError {
    ApiError::Storage(format!("{:#}", e))
}

/// Clone is cheap - the transport and session store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: SessionStore,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl ApiClient {
    /// Create a client talking to the configured base URL
    pub fn new(config: &Config, store: SessionStore) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.api_base_url)?;
        Ok(Self::with_transport(Arc::new(transport), store))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, store: SessionStore) -> Self {
        Self {
            transport,
            store,
            events: None,
        }
    }

    /// Report forced logouts on this channel
    pub fn with_session_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    // ===== Interceptors =====

    /// Outbound interceptor: attach the credential, refreshing it first when
    /// it is about to expire.
    async fn prepare(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        let Some(stored) = self.store.read() else {
            return Ok(());
        };

        let credential = if self.store.is_near_expiry(&stored, Utc::now()) {
            debug!(path = %request.path, "Session near expiry, refreshing before request");
            match self.refresh_exchange(&stored.credential).await {
                Ok(credential) => credential,
                Err(e) => return Err(self.expire_session(e)),
            }
        } else {
            stored.credential
        };

        self.store.scheme().attach(request, &credential);
        Ok(())
    }

    /// Send through both interceptors and return the final raw response.
    async fn send(&self, mut request: ApiRequest) -> Result<RawResponse, ApiError> {
        self.prepare(&mut request).await?;
        let response = self.transport.execute(&request).await?;

        if response.status != StatusCode::UNAUTHORIZED || request.retried {
            return Ok(response);
        }
        // Nothing to refresh with: let the 401 through
        let Some(stored) = self.store.read() else {
            return Ok(response);
        };

        request.retried = true;
        debug!(path = %request.path, "Got 401, refreshing session and retrying once");
        let credential = match self.refresh_exchange(&stored.credential).await {
            Ok(credential) => credential,
            Err(e) => return Err(self.expire_session(e)),
        };
        self.store.scheme().attach(&mut request, &credential);
        self.transport.execute(&request).await
    }

    /// Exchange the current credential for a new one and persist it.
    /// Runs on the bare transport so it never re-enters the interceptors.
    async fn refresh_exchange(&self, previous: &Credential) -> Result<Credential, ApiError> {
        let scheme = self.store.scheme();
        let request = scheme.refresh_request(previous)?;
        let response = self.transport.execute(&request).await?;
        let body = Self::check_response(&request, response)?;

        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(&body)?;
        let credential = scheme.credential_from_refresh(envelope.data, previous)?;
        self.store
            .write(&credential, Utc::now())
            .map_err(storage_error)?;
        info!("Session refreshed");
        Ok(credential)
    }

    /// Drop the stored session and tell the front end to start over at login.
    fn expire_session(&self, cause: ApiError) -> ApiError {
        warn!(error = %cause, "Session refresh failed, logging out");
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear session");
        }
        if let Some(ref events) = self.events {
            // Receiver gone means the front end is shutting down
            let _ = events.send(SessionEvent::Expired);
        }
        ApiError::SessionExpired
    }

    /// Turn a non-success response into an `ApiError`, keeping the status.
    fn check_response(request: &ApiRequest, response: RawResponse) -> Result<String, ApiError> {
        if response.status.is_success() {
            return Ok(response.body);
        }
        let err = ApiError::from_status(response.status, &response.body);
        if response.status.is_server_error() {
            error!(method = %request.method, path = %request.path, status = %response.status, error = %err, "Server error");
        } else {
            debug!(method = %request.method, path = %request.path, status = %response.status, error = %err, "Request rejected");
        }
        Err(err)
    }

    fn parse_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        let envelope: ApiResponse<T> = serde_json::from_str(body)?;
        Ok(envelope.data)
    }

    async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request.clone()).await?;
        let body = Self::check_response(&request, response)?;
        Self::parse_data(&body)
    }

    /// Like `request`, for endpoints whose payload is ignored
    async fn request_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        let response = self.send(request.clone()).await?;
        Self::check_response(&request, response)?;
        Ok(())
    }

    /// Unauthenticated call: no credential, no refresh, no retry
    async fn request_public(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let response = self.transport.execute(request).await?;
        Self::check_response(request, response)
    }

    // ===== Auth =====

    /// Log in and persist the returned credential.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post("/auth/login").json(credentials)?;
        let body = self.request_public(&request).await?;
        let auth: AuthResponse = Self::parse_data(&body)?;

        let credential = self.store.scheme().credential_from_login(&auth)?;
        self.store
            .write(&credential, Utc::now())
            .map_err(storage_error)?;
        info!("Logged in");
        Ok(auth)
    }

    /// Log out. The local session is cleared even when the call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.request_empty(ApiRequest::post("/auth/logout")).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }
        self.store.clear().map_err(storage_error)?;
        info!("Logged out");
        result
    }

    /// Refresh the session on demand.
    pub async fn refresh_session(&self) -> Result<Credential, ApiError> {
        let stored = self
            .store
            .read()
            .ok_or_else(|| ApiError::Unauthorized("No session found".to_string()))?;
        match self.refresh_exchange(&stored.credential).await {
            Ok(credential) => Ok(credential),
            Err(e) => Err(self.expire_session(e)),
        }
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.request(ApiRequest::get("/users/me")).await
    }

    // ===== Users =====

    pub async fn list_users(&self, query: &UserQuery) -> Result<PaginatedResponse<User>, ApiError> {
        let request = ApiRequest::get("/users").query(query.to_params());
        let response = self.send(request.clone()).await?;
        let body = Self::check_response(&request, response)?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.request(ApiRequest::get(format!("/users/{}", id))).await
    }

    pub async fn create_user(&self, user: &CreateUserRequest) -> Result<User, ApiError> {
        let created: User = self.request(ApiRequest::post("/users").json(user)?).await?;
        info!(id = created.id, "User created");
        Ok(created)
    }

    pub async fn update_user(&self, user: &UpdateUserRequest) -> Result<User, ApiError> {
        let request = ApiRequest::put(format!("/users/{}", user.id)).json(user)?;
        let updated: User = self.request(request).await?;
        info!(id = updated.id, "User updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.request_empty(ApiRequest::delete(format!("/users/{}", id)))
            .await?;
        info!(id, "User deleted");
        Ok(())
    }

    // ===== Setup & health =====

    /// Create the first administrator. Only accepted while the backend
    /// reports first-time setup.
    pub async fn setup_admin(&self, admin: &SetupAdminUserRequest) -> Result<(), ApiError> {
        let request = ApiRequest::post("/setup").json(admin)?;
        self.request_public(&request).await?;
        info!("Administrator created");
        Ok(())
    }

    /// Backend health. The body is not wrapped in an envelope.
    pub async fn health(&self) -> Result<HealthCheckResponse, ApiError> {
        let body = self.request_public(&ApiRequest::get("/health")).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `health` with up to `retries` further attempts and exponential backoff.
    pub async fn health_with_retries(&self, retries: u32) -> Result<HealthCheckResponse, ApiError> {
        let mut attempt = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        loop {
            match self.health().await {
                Ok(health) => return Ok(health),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    warn!(error = %e, retry = attempt, backoff_ms, "Health check failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
