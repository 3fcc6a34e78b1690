//! WiFiNet management backend: the REST API behind the admin console, the
//! collector app and the customer portal.
//!
//! All records live in the document store behind [`wifinet_store::Repository`];
//! sessions are held in memory.

#![warn(clippy::unwrap_used)]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod portal;
pub mod router;

pub use auth::SessionStore;
pub use error::{ApiError, ApiResult};
pub use handlers::ManagementState;
pub use router::management_router;
