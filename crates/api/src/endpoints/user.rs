//! User data endpoints.

use axum::{Router, routing::get};
use moodlog_common::AppResult;
use moodlog_core::{MonthlyEmotionCount, mood::decode_counts};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Profile and mood of the signed-in user.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub name: String,
    pub email: String,
    pub emotion_color: String,
    pub emotion_counts: Vec<MonthlyEmotionCount>,
}

async fn data(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserDataResponse>> {
    let emotion_counts = decode_counts(&user.emotion_counts)?;

    Ok(ApiResponse::ok(UserDataResponse {
        name: user.name,
        email: user.email,
        emotion_color: user.emotion_color,
        emotion_counts,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/data", get(data))
}
