//! Journal entry entity.
//!
//! One row per (owner, calendar day). `entry_date` holds the canonical,
//! timezone-free day key; annotations are stored as a JSON array in
//! percentage space.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion labels produced by the text classifier.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[sea_orm(string_value = "anger")]
    Anger,
    #[sea_orm(string_value = "disgust")]
    Disgust,
    #[sea_orm(string_value = "fear")]
    Fear,
    #[sea_orm(string_value = "joy")]
    Joy,
    #[default]
    #[sea_orm(string_value = "neutral")]
    Neutral,
    #[sea_orm(string_value = "sadness")]
    Sadness,
    #[sea_orm(string_value = "surprise")]
    Surprise,
}

impl EmotionLabel {
    /// Every label, in the classifier's alphabetical order.
    pub const ALL: [Self; 7] = [
        Self::Anger,
        Self::Disgust,
        Self::Fear,
        Self::Joy,
        Self::Neutral,
        Self::Sadness,
        Self::Surprise,
    ];

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Joy => "joy",
            Self::Neutral => "neutral",
            Self::Sadness => "sadness",
            Self::Surprise => "surprise",
        }
    }

    /// Parse a label case-insensitively. Returns `None` for anything outside
    /// the closed set.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Email of the owning user (weak reference)
    #[sea_orm(indexed)]
    pub owner_email: String,

    /// Canonical calendar day of the entry
    pub entry_date: Date,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Final emotion after disambiguation
    pub emotion: EmotionLabel,

    /// `#RRGGBB` color of `emotion`, persisted verbatim
    pub emotion_color: String,

    /// Classifier confidence for `emotion`
    #[sea_orm(column_type = "Double")]
    pub confidence: f64,

    /// Sticker annotations in percentage space
    #[sea_orm(column_type = "JsonBinary")]
    pub annotations: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(EmotionLabel::from_label("JOY"), Some(EmotionLabel::Joy));
        assert_eq!(EmotionLabel::from_label(" Sadness "), Some(EmotionLabel::Sadness));
        assert_eq!(EmotionLabel::from_label("boredom"), None);
    }

    #[test]
    fn test_default_is_neutral() {
        assert_eq!(EmotionLabel::default(), EmotionLabel::Neutral);
        assert_eq!(EmotionLabel::Neutral.to_string(), "neutral");
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Surprise).unwrap_or_default();
        assert_eq!(json, "\"surprise\"");
    }
}
