//! HTTP API layer for moodlog.
//!
//! - **Endpoints**: accounts, journal entries, annotations, mood data
//! - **Extractors**: authenticated user
//! - **Middleware**: bearer/cookie token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
