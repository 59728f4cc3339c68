use tracing::{error, warn};

use super::guard::LOGIN;
use crate::api::{ApiClient, ApiError};
use crate::models::User;

#[derive(Debug)]
pub enum CurrentUserOutcome {
    Loaded(User),
    /// The credential was rejected; the session is gone and the front end
    /// must navigate to `redirect`.
    Invalidated {
        redirect: &'static str,
        error: ApiError,
    },
}

/// Fetch the user behind the stored credential.
///
/// Called once a protected route is ready. Any failure clears the session
/// store; there is no retry beyond what the gateway client already does.
pub async fn load_current_user(client: &ApiClient) -> CurrentUserOutcome {
    match client.current_user().await {
        Ok(user) => CurrentUserOutcome::Loaded(user),
        Err(e) => {
            warn!(error = %e, "Failed to load current user, dropping session");
            if let Err(clear_err) = client.session_store().clear() {
                error!(error = %clear_err, "Failed to clear session");
            }
            CurrentUserOutcome::Invalidated {
                redirect: LOGIN,
                error: e,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use futures::future::BoxFuture;
    use reqwest::StatusCode;

    use super::*;
    use crate::api::transport::{ApiRequest, HttpTransport, RawResponse};
    use crate::auth::cookies::{CookieJar, MemoryCookieJar};
    use crate::auth::{Credential, SessionStore};
    use crate::config::SchemeKind;

    /// Answers every request with the same response.
    struct FixedTransport {
        status: StatusCode,
        body: String,
        calls: Mutex<u32>,
    }

    impl HttpTransport for FixedTransport {
        fn execute<'a>(&'a self, _request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, ApiError>> {
            Box::pin(async move {
                *self.calls.lock().unwrap() += 1;
                Ok(RawResponse::new(self.status, self.body.clone()))
            })
        }
    }

    fn client_with(status: StatusCode, body: &str) -> (Arc<MemoryCookieJar>, Arc<FixedTransport>, ApiClient) {
        let jar = Arc::new(MemoryCookieJar::new());
        let store = SessionStore::for_kind(SchemeKind::Session, jar.clone());
        store
            .write(&Credential::SessionId("abc".to_string()), Utc::now())
            .unwrap();
        let transport = Arc::new(FixedTransport {
            status,
            body: body.to_string(),
            calls: Mutex::new(0),
        });
        let client = ApiClient::with_transport(transport.clone(), store);
        (jar, transport, client)
    }

    #[tokio::test]
    async fn test_loads_user() {
        let body = r#"{"success":true,"data":{"id":3,"email":"c@d.io","role":"viewer","first_name":"Cy","is_active":true,"created_at":"2025-02-01T00:00:00Z"}}"#;
        let (jar, _, client) = client_with(StatusCode::OK, body);

        match load_current_user(&client).await {
            CurrentUserOutcome::Loaded(user) => assert_eq!(user.id, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!jar.read().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_clears_session() {
        let (jar, transport, client) = client_with(StatusCode::INTERNAL_SERVER_ERROR, "oops");

        match load_current_user(&client).await {
            CurrentUserOutcome::Invalidated { redirect, error } => {
                assert_eq!(redirect, LOGIN);
                assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(jar.read().is_empty());
        // No retry at this layer
        assert_eq!(*transport.calls.lock().unwrap(), 1);
    }
}
