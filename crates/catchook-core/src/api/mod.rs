//! Backend API access.
//!
//! - `transport`: the HTTP seam and its reqwest implementation
//! - `client`: the gateway client with refresh-and-retry
//! - `error`: the error taxonomy every call returns

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, FieldErrors};
pub use transport::{ApiRequest, HttpTransport, RawResponse, ReqwestTransport};
