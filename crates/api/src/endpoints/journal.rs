//! Journal endpoints.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use moodlog_common::AppResult;
use moodlog_core::{
    Annotation, CreateEntryInput,
    annotation::decode_annotations,
    emotion::{EmotionScore, palette},
};
use moodlog_db::entities::{EmotionLabel, journal_entry};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// A journal entry as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: String,
    /// Canonical day, `YYYY-MM-DD`.
    pub date: String,
    pub title: String,
    pub content: String,
    pub emotion: EmotionLabel,
    pub emotion_color: String,
    pub confidence: f64,
    pub annotations: Vec<Annotation>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl TryFrom<journal_entry::Model> for EntryResponse {
    type Error = moodlog_common::AppError;

    fn try_from(entry: journal_entry::Model) -> AppResult<Self> {
        Ok(Self {
            annotations: decode_annotations(&entry.annotations)?,
            id: entry.id,
            date: entry.entry_date.format("%Y-%m-%d").to_string(),
            title: entry.title,
            content: entry.content,
            emotion: entry.emotion,
            emotion_color: entry.emotion_color,
            confidence: entry.confidence,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }
}

fn to_responses(entries: Vec<journal_entry::Model>) -> AppResult<Vec<EntryResponse>> {
    entries.into_iter().map(EntryResponse::try_from).collect()
}

/// Create entry request.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
}

/// Classification summary for a created entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionResponse {
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub color: String,
    pub all_scores: Vec<EmotionScore>,
    pub errored: bool,
}

/// Create entry response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryResponse {
    pub entry: EntryResponse,
    pub emotion: EmotionResponse,
    /// The owner's mood after this entry. Absent if the mood update failed.
    pub mood_color: Option<String>,
}

async fn create_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> AppResult<ApiResponse<CreateEntryResponse>> {
    let created = state
        .journal_service
        .create_entry(
            &user.email,
            CreateEntryInput {
                title: req.title,
                date: req.date,
                content: req.content,
            },
        )
        .await?;

    let classification = created.classification;
    Ok(ApiResponse::ok(CreateEntryResponse {
        entry: created.entry.try_into()?,
        emotion: EmotionResponse {
            emotion: classification.emotion,
            confidence: classification.confidence,
            color: classification.color,
            all_scores: classification.all_scores,
            errored: classification.errored,
        },
        mood_color: created.mood.map(|m| m.emotion_color),
    }))
}

async fn get_entries(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EntryResponse>>> {
    let entries = state.journal_service.list(&user.email).await?;
    Ok(ApiResponse::ok(to_responses(entries)?))
}

/// Query for a single day.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

/// Entry of a day, if written.
#[derive(Debug, Serialize)]
pub struct EntryByDateResponse {
    pub entry: Option<EntryResponse>,
}

async fn get_entry_by_date(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> AppResult<ApiResponse<EntryByDateResponse>> {
    let entry = state
        .journal_service
        .get_by_date(&user.email, &query.date)
        .await?
        .map(EntryResponse::try_from)
        .transpose()?;

    Ok(ApiResponse::ok(EntryByDateResponse { entry }))
}

/// Query for a calendar month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

async fn get_month(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> AppResult<ApiResponse<Vec<EntryResponse>>> {
    let entries = state
        .journal_service
        .list_month(&user.email, query.year, query.month)
        .await?;
    Ok(ApiResponse::ok(to_responses(entries)?))
}

/// Replace the annotations of a day's entry.
#[derive(Debug, Deserialize)]
pub struct UpdateAnnotationsRequest {
    pub date: String,
    pub annotations: Vec<Annotation>,
}

async fn update_annotations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateAnnotationsRequest>,
) -> AppResult<ApiResponse<EntryResponse>> {
    let updated = state
        .journal_service
        .update_annotations(&user.email, &req.date, req.annotations)
        .await?;
    Ok(ApiResponse::ok(updated.try_into()?))
}

async fn emotion_colors() -> ApiResponse<BTreeMap<&'static str, &'static str>> {
    ApiResponse::ok(palette())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-entry", post(create_entry))
        .route("/get-entries", get(get_entries))
        .route("/get-entry-date", get(get_entry_by_date))
        .route("/get-month", get(get_month))
        .route("/update-annotations", post(update_annotations))
        .route("/emotion-colors", get(emotion_colors))
}
