//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use moodlog_core::{JournalService, UserService};
use tracing::debug;

/// Name of the cookie carrying the access token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub journal_service: JournalService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>`, falling back to the token
/// cookie, into the `user::Model` request extension. Requests without a
/// valid token pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
    });

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Ignoring invalid access token"),
        }
    }

    next.run(req).await
}
