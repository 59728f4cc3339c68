//! Data models for the Catchook REST API.
//!
//! - `User`, `UserRole` and the create/update request bodies
//! - Response envelopes: `ApiResponse`, `PaginatedResponse`
//! - Auth payloads: `LoginCredentials`, `AuthResponse`, `TokenPair`
//! - `HealthCheckResponse` and the derived `ApiStatus`
//! - `SetupAdminUserRequest` for first-time setup

pub mod auth;
pub mod envelope;
pub mod health;
pub mod setup;
pub mod user;

pub use auth::{AuthResponse, AuthSession, LoginCredentials, TokenPair};
pub use envelope::{ApiResponse, EnvelopeError, PaginatedResponse, Pagination};
pub use health::{ApiStatus, HealthCheckResponse, ServiceStatus};
pub use setup::SetupAdminUserRequest;
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserRole};
