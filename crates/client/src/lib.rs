//! Admin REST API client.
//!
//! Provides the [`DashboardApi`] trait, its HTTP implementation
//! [`AdminApi`], response envelope helpers, and the session-backed
//! [`AuthContext`] that supplies the bearer token.

pub mod api;
pub mod envelope;
pub mod error;
pub mod session;

pub use api::{AdminApi, DashboardApi};
pub use error::ApiError;
pub use session::{AuthContext, SessionStore};
