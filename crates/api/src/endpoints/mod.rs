//! API endpoints.

mod auth;
mod journal;
mod user;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/user", user::router())
        .nest("/journal", journal::router())
}
