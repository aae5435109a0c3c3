//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use moodlog_common::AppResult;
use moodlog_core::CreateUserInput;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{AppState, TOKEN_COOKIE},
    response::ApiResponse,
};

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Session response for signup and signin.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Signout response.
#[derive(Serialize)]
pub struct SignoutResponse {
    pub ok: bool,
}

fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> AppResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let user = state
        .user_service
        .create(CreateUserInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;
    let token = user.token.unwrap_or_default();

    Ok((
        jar.add(token_cookie(token.clone())),
        ApiResponse::ok(SessionResponse {
            id: user.id,
            email: user.email,
            token,
        }),
    ))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SigninRequest>,
) -> AppResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let (user, token) = state
        .user_service
        .sign_in(&req.email, &req.password)
        .await?;

    Ok((
        jar.add(token_cookie(token.clone())),
        ApiResponse::ok(SessionResponse {
            id: user.id,
            email: user.email,
            token,
        }),
    ))
}

/// Sign out. The current token stops working.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<SignoutResponse>)> {
    state.user_service.regenerate_token(&user.id).await?;

    Ok((
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/")),
        ApiResponse::ok(SignoutResponse { ok: true }),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}
