//! HTTP transport seam for the gateway client.
//!
//! `ApiClient` never talks to reqwest directly: it hands an `ApiRequest` to an
//! `HttpTransport` and gets back the raw status and body. Production code
//! uses `ReqwestTransport`; tests script responses in memory.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{header, Client, Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::ApiError;

/// HTTP request timeout in seconds, applied to every call
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
    /// Set once the request has been resent after a refresh exchange
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            authorization: None,
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

pub trait HttpTransport: Send + Sync {
    /// Send the request and return whatever the server answered. Only
    /// connection-level failures are errors; status codes are not inspected.
    fn execute<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, ApiError>>;
}

/// Transport backed by a shared `reqwest::Client`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<RawResponse, ApiError>> {
        Box::pin(async move {
            let url = self.url(&request.path);
            debug!(method = %request.method, url = %url, retried = request.retried, "Sending request");

            let mut builder = self
                .client
                .request(request.method.clone(), &url)
                .header(header::ACCEPT, "application/json");

            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(ref auth) = request.authorization {
                builder = builder.header(header::AUTHORIZATION, auth);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            debug!(url = %url, status = %status, "Response received");
            Ok(RawResponse { status, body })
        })
    }
}
