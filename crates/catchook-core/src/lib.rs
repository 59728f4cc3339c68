//! Core library for the Catchook dashboard.
//!
//! This crate holds everything that does not depend on a particular front
//! end: the API gateway client, the cookie-backed session store and its two
//! credential schemes, the route guard, form validation and the user
//! listing state machine.

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod models;
pub mod users;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, RouteGuard, SessionEvent, SessionStore};
pub use config::{Config, SchemeKind};
