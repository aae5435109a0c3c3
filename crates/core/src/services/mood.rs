//! Running mood color per user.
//!
//! Each new entry blends its emotion color into the user's mood color by an
//! equal-weight average of the previous mood and the new color. The result
//! is a recency-weighted blend: the latest entry weighs 1/2, the one before
//! 1/4, and so on. It depends on entry order, not just on the set of
//! entries.
//!
//! Alongside the color, a per-month emotion tally is kept on the user.

use std::collections::BTreeMap;

use chrono::Utc;
use moodlog_common::{AppError, AppResult};
use moodlog_db::{
    entities::{EmotionLabel, user},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::color::{ColorError, average_color};
use super::day_key::DateKey;

/// A user's running mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMoodState {
    pub emotion_color: String,
}

impl Default for UserMoodState {
    fn default() -> Self {
        Self {
            emotion_color: user::DEFAULT_MOOD_COLOR.to_string(),
        }
    }
}

impl UserMoodState {
    /// Blend a new entry color into this mood.
    pub fn apply_entry(&self, entry_color: &str) -> Result<Self, ColorError> {
        Ok(Self {
            emotion_color: average_color(&self.emotion_color, entry_color)?,
        })
    }
}

/// Emotion counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyEmotionCount {
    pub year: i32,
    pub month: u32,
    pub emotions: BTreeMap<String, u32>,
}

/// Add one entry of `emotion` on `day` to a monthly tally.
#[must_use]
pub fn tally(
    mut counts: Vec<MonthlyEmotionCount>,
    day: DateKey,
    emotion: EmotionLabel,
) -> Vec<MonthlyEmotionCount> {
    let (year, month) = (day.year(), day.month());

    let bucket = if let Some(pos) = counts
        .iter()
        .position(|c| c.year == year && c.month == month)
    {
        &mut counts[pos]
    } else {
        counts.push(MonthlyEmotionCount {
            year,
            month,
            emotions: BTreeMap::new(),
        });
        let last = counts.len() - 1;
        &mut counts[last]
    };
    *bucket.emotions.entry(emotion.as_str().to_string()).or_insert(0) += 1;

    counts.sort_by_key(|c| (c.year, c.month));
    counts
}

/// Decode the tally column of a user.
pub fn decode_counts(value: &serde_json::Value) -> AppResult<Vec<MonthlyEmotionCount>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Internal(format!("Corrupt emotion counts: {e}")))
}

/// Applies entries to users' moods and persists the result.
#[derive(Clone)]
pub struct MoodAggregator {
    user_repo: UserRepository,
}

impl MoodAggregator {
    /// Create a new mood aggregator.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Blend a newly stored entry into its owner's mood and monthly tally.
    pub async fn record_entry(
        &self,
        owner_email: &str,
        day: DateKey,
        emotion: EmotionLabel,
        entry_color: &str,
    ) -> AppResult<UserMoodState> {
        let user = self.user_repo.get_by_email(owner_email).await?;

        let previous = UserMoodState {
            emotion_color: user.emotion_color.clone(),
        };
        let next = previous.apply_entry(entry_color)?;
        let counts = tally(decode_counts(&user.emotion_counts)?, day, emotion);
        let counts = serde_json::to_value(&counts)
            .map_err(|e| AppError::Internal(format!("Failed to encode emotion counts: {e}")))?;

        let mut active: user::ActiveModel = user.into();
        active.emotion_color = Set(next.emotion_color.clone());
        active.emotion_counts = Set(counts);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        debug!(
            from = %previous.emotion_color,
            to = %next.emotion_color,
            "Updated mood color"
        );
        Ok(next)
    }
}
