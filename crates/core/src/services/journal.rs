//! Journal entry service.

use chrono::Utc;
use moodlog_common::{AppError, AppResult, IdGenerator};
use moodlog_db::{entities::journal_entry, repositories::JournalEntryRepository};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use super::annotation::{Annotation, encode_annotations, validate_annotations};
use super::day_key::{DateKey, canonical_day_key};
use super::emotion::{Classification, EmotionClassifier};
use super::mood::{MoodAggregator, UserMoodState};

/// Input for creating an entry.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryInput {
    #[validate(length(max = 256))]
    pub title: String,

    /// `YYYY-MM-DD` or an ISO-8601 timestamp.
    #[validate(length(max = 64))]
    pub date: String,

    #[validate(length(max = 100_000))]
    pub content: String,
}

/// Result of creating an entry.
#[derive(Debug, Clone)]
pub struct CreatedEntry {
    pub entry: journal_entry::Model,
    pub classification: Classification,
    /// Owner's mood after this entry; `None` if the mood update failed.
    pub mood: Option<UserMoodState>,
}

/// Journal entry service for business logic.
#[derive(Clone)]
pub struct JournalService {
    entry_repo: JournalEntryRepository,
    mood: MoodAggregator,
    classifier: EmotionClassifier,
    id_gen: IdGenerator,
}

impl JournalService {
    /// Create a new journal service.
    #[must_use]
    pub fn new(
        entry_repo: JournalEntryRepository,
        mood: MoodAggregator,
        classifier: EmotionClassifier,
    ) -> Self {
        Self {
            entry_repo,
            mood,
            classifier,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create the entry for a day.
    ///
    /// At most one entry exists per owner and day. A second attempt fails
    /// with [`AppError::DuplicateEntry`] and leaves the first entry and the
    /// owner's mood unchanged.
    pub async fn create_entry(
        &self,
        owner_email: &str,
        input: CreateEntryInput,
    ) -> AppResult<CreatedEntry> {
        if input.title.trim().is_empty()
            || input.content.trim().is_empty()
            || input.date.trim().is_empty()
        {
            return Err(AppError::Validation("Missing details".to_string()));
        }
        input.validate()?;

        let day = canonical_day_key(input.date.as_str())?;

        if self
            .entry_repo
            .exists_for_date(owner_email, day.date())
            .await?
        {
            return Err(AppError::DuplicateEntry(day.to_string()));
        }

        let classification = self.classifier.classify(&input.content).await;

        let model = journal_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_email: Set(owner_email.to_string()),
            entry_date: Set(day.date()),
            title: Set(input.title.trim().to_string()),
            content: Set(input.content),
            emotion: Set(classification.emotion),
            emotion_color: Set(classification.color.clone()),
            confidence: Set(classification.confidence),
            annotations: Set(json!([])),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        // The unique index settles concurrent creates; only the winner
        // reaches the mood update.
        let entry = self.entry_repo.create(model).await?;

        info!(
            entry_id = %entry.id,
            day = %day,
            emotion = %classification.emotion,
            confidence = classification.confidence,
            "Created journal entry"
        );

        let mood = match self
            .mood
            .record_entry(owner_email, day, classification.emotion, &classification.color)
            .await
        {
            Ok(mood) => Some(mood),
            Err(e) => {
                error!(entry_id = %entry.id, error = %e, "Failed to update mood color");
                None
            }
        };

        Ok(CreatedEntry {
            entry,
            classification,
            mood,
        })
    }

    /// The owner's entry for a day, if any.
    pub async fn get_by_date(
        &self,
        owner_email: &str,
        date: &str,
    ) -> AppResult<Option<journal_entry::Model>> {
        let day = canonical_day_key(date)?;
        self.entry_repo
            .find_by_owner_and_date(owner_email, day.date())
            .await
    }

    /// Every entry of the owner, oldest day first.
    pub async fn list(&self, owner_email: &str) -> AppResult<Vec<journal_entry::Model>> {
        self.entry_repo.find_by_owner(owner_email).await
    }

    /// Entries of the owner in one calendar month.
    pub async fn list_month(
        &self,
        owner_email: &str,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<journal_entry::Model>> {
        let (first, last) = DateKey::month_range(year, month)?;
        self.entry_repo
            .find_by_owner_in_range(owner_email, first.date(), last.date())
            .await
    }

    /// Replace the stored annotations of the owner's entry for a day.
    pub async fn update_annotations(
        &self,
        owner_email: &str,
        date: &str,
        annotations: Vec<Annotation>,
    ) -> AppResult<journal_entry::Model> {
        validate_annotations(&annotations)?;
        let day = canonical_day_key(date)?;

        let entry = self
            .entry_repo
            .find_by_owner_and_date(owner_email, day.date())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry for {day}")))?;

        let count = annotations.len();
        let updated = self
            .entry_repo
            .update_annotations(entry, encode_annotations(&annotations)?)
            .await?;

        info!(entry_id = %updated.id, count, "Saved annotations");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::emotion::{EmotionClassificationService, LabelScore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use moodlog_db::entities::{EmotionLabel, user};
    use moodlog_db::repositories::UserRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmotionClassificationService for CountingProvider {
        async fn classify(&self, _text: &str) -> AppResult<Vec<LabelScore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                LabelScore::new("joy", 0.9),
                LabelScore::new("neutral", 0.1),
            ])
        }
    }

    fn entry(id: &str, date: NaiveDate) -> journal_entry::Model {
        journal_entry::Model {
            id: id.to_string(),
            owner_email: "alice@example.com".to_string(),
            entry_date: date,
            title: "First".to_string(),
            content: "A good day at the beach.".to_string(),
            emotion: EmotionLabel::Joy,
            emotion_color: "#FBBF24".to_string(),
            confidence: 0.9,
            annotations: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn user_model(color: &str) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password: "hash".to_string(),
            token: None,
            emotion_color: color.to_string(),
            emotion_counts: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(
        entry_db: Arc<DatabaseConnection>,
        user_db: Arc<DatabaseConnection>,
        provider: Arc<CountingProvider>,
    ) -> JournalService {
        JournalService::new(
            JournalEntryRepository::new(entry_db),
            MoodAggregator::new(UserRepository::new(user_db)),
            EmotionClassifier::new(provider),
        )
    }

    fn provider() -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        })
    }

    fn input(date: &str) -> CreateEntryInput {
        CreateEntryInput {
            title: "Second".to_string(),
            date: date.to_string(),
            content: "Another entry for the same day.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_entry_for_taken_day_is_rejected() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let entry_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry("e1", day)]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let provider = provider();

        let result = service(entry_db, user_db, provider.clone())
            .create_entry("alice@example.com", input("2024-03-01T23:30:00+05:00"))
            .await;

        match result {
            Err(AppError::DuplicateEntry(day)) => assert_eq!(day, "2024-03-01"),
            other => panic!("Expected DuplicateEntry, got {other:?}"),
        }
        // No classification, no mood update.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_entry_classifies_and_blends_mood() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let created = entry("e2", day);

        let entry_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<journal_entry::Model>::new()])
                .append_query_results([[created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        // white + joy (#FBBF24) -> #FDDF92
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("#FFFFFF")]])
                .append_query_results([[user_model("#FDDF92")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let provider = provider();

        let result = service(entry_db, user_db, provider.clone())
            .create_entry("alice@example.com", input("2024-03-02"))
            .await
            .unwrap();

        assert_eq!(result.entry.entry_date, day);
        assert_eq!(result.classification.emotion, EmotionLabel::Joy);
        assert_eq!(result.classification.color, "#FBBF24");
        assert_eq!(result.mood.unwrap().emotion_color, "#FDDF92");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_entry_requires_all_fields() {
        let entry_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut missing = input("2024-03-01");
        missing.content = "   ".to_string();

        let result = service(entry_db, user_db, provider())
            .create_entry("alice@example.com", missing)
            .await;

        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Missing details"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_entry_rejects_bad_date() {
        let entry_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(entry_db, user_db, provider())
            .create_entry("alice@example.com", input("2024-02-30"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_annotations_missing_entry() {
        let entry_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<journal_entry::Model>::new()])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(entry_db, user_db, provider())
            .update_annotations("alice@example.com", "2024-03-01", Vec::new())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_annotations_rejects_duplicate_ids() {
        let entry_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let sticker = Annotation {
            id: 1,
            asset_ref: "heart.png".to_string(),
            x_percent: 1.0,
            y_percent: 1.0,
            width_percent: 1.0,
            height_percent: 1.0,
            rotation_degrees: 0.0,
            z_order: 1,
        };

        let result = service(entry_db, user_db, provider())
            .update_annotations("alice@example.com", "2024-03-01", vec![sticker.clone(), sticker])
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_month_rejects_invalid_month() {
        let entry_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(entry_db, user_db, provider())
            .list_month("alice@example.com", 2024, 13)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
