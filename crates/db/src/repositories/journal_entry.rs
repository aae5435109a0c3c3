//! Journal entry repository.

use std::sync::Arc;

use crate::entities::{JournalEntry, journal_entry};
use chrono::{NaiveDate, Utc};
use moodlog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

/// Journal entry repository for database operations.
#[derive(Clone)]
pub struct JournalEntryRepository {
    db: Arc<DatabaseConnection>,
}

impl JournalEntryRepository {
    /// Create a new journal entry repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the entry an owner wrote for a canonical day.
    pub async fn find_by_owner_and_date(
        &self,
        owner_email: &str,
        entry_date: NaiveDate,
    ) -> AppResult<Option<journal_entry::Model>> {
        JournalEntry::find()
            .filter(journal_entry::Column::OwnerEmail.eq(owner_email))
            .filter(journal_entry::Column::EntryDate.eq(entry_date))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether the (owner, day) key is already occupied.
    pub async fn exists_for_date(&self, owner_email: &str, entry_date: NaiveDate) -> AppResult<bool> {
        Ok(self
            .find_by_owner_and_date(owner_email, entry_date)
            .await?
            .is_some())
    }

    /// All entries of an owner, oldest day first.
    pub async fn find_by_owner(&self, owner_email: &str) -> AppResult<Vec<journal_entry::Model>> {
        JournalEntry::find()
            .filter(journal_entry::Column::OwnerEmail.eq(owner_email))
            .order_by_asc(journal_entry::Column::EntryDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries of an owner whose day falls in `[start, end]` (inclusive).
    pub async fn find_by_owner_in_range(
        &self,
        owner_email: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<journal_entry::Model>> {
        JournalEntry::find()
            .filter(journal_entry::Column::OwnerEmail.eq(owner_email))
            .filter(journal_entry::Column::EntryDate.between(start, end))
            .order_by_asc(journal_entry::Column::EntryDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new entry.
    ///
    /// The unique index on `(owner_email, entry_date)` is the final word on
    /// duplicates; a violation is reported as [`AppError::DuplicateEntry`].
    pub async fn create(
        &self,
        model: journal_entry::ActiveModel,
    ) -> AppResult<journal_entry::Model> {
        let entry_date = model.entry_date.clone().take();

        model.insert(self.db.as_ref()).await.map_err(|e| {
            map_insert_error(
                e.sql_err(),
                &e,
                entry_date.map_or_else(|| "this date".to_string(), |d| d.to_string()),
            )
        })
    }

    /// Replace the annotation list of an entry.
    pub async fn update_annotations(
        &self,
        entry: journal_entry::Model,
        annotations: serde_json::Value,
    ) -> AppResult<journal_entry::Model> {
        let mut active: journal_entry::ActiveModel = entry.into();
        active.annotations = Set(annotations);
        active.updated_at = Set(Some(Utc::now().into()));
        self.update(active).await
    }

    /// Update an entry.
    pub async fn update(
        &self,
        model: journal_entry::ActiveModel,
    ) -> AppResult<journal_entry::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn map_insert_error(sql_err: Option<SqlErr>, err: &DbErr, entry_date: String) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateEntry(entry_date),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::EmotionLabel;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_entry(id: &str, owner: &str, date: NaiveDate) -> journal_entry::Model {
        journal_entry::Model {
            id: id.to_string(),
            owner_email: owner.to_string(),
            entry_date: date,
            title: "A day".to_string(),
            content: "Went for a long walk.".to_string(),
            emotion: EmotionLabel::Joy,
            emotion_color: "#FBBF24".to_string(),
            confidence: 0.91,
            annotations: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_find_by_owner_and_date_found() {
        let entry = create_test_entry("e1", "alice@example.com", day(2024, 3, 1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = JournalEntryRepository::new(db);
        let result = repo
            .find_by_owner_and_date("alice@example.com", day(2024, 3, 1))
            .await
            .unwrap();

        let found = result.unwrap();
        assert_eq!(found.id, "e1");
        assert_eq!(found.emotion, EmotionLabel::Joy);
    }

    #[tokio::test]
    async fn test_exists_for_date_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<journal_entry::Model>::new()])
                .into_connection(),
        );

        let repo = JournalEntryRepository::new(db);
        let result = repo
            .exists_for_date("alice@example.com", day(2024, 3, 2))
            .await
            .unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_find_by_owner_in_range() {
        let e1 = create_test_entry("e1", "alice@example.com", day(2024, 3, 1));
        let e2 = create_test_entry("e2", "alice@example.com", day(2024, 3, 31));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = JournalEntryRepository::new(db);
        let result = repo
            .find_by_owner_in_range("alice@example.com", day(2024, 3, 1), day(2024, 3, 31))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_create_entry() {
        let entry = create_test_entry("e1", "alice@example.com", day(2024, 3, 1));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = JournalEntryRepository::new(db);
        let active = journal_entry::ActiveModel {
            id: Set("e1".to_string()),
            owner_email: Set("alice@example.com".to_string()),
            entry_date: Set(day(2024, 3, 1)),
            ..Default::default()
        };

        let created = repo.create(active).await.unwrap();
        assert_eq!(created.entry_date, day(2024, 3, 1));
    }

    #[tokio::test]
    async fn test_update_annotations() {
        let entry = create_test_entry("e1", "alice@example.com", day(2024, 3, 1));
        let stickers = json!([{"id": 1, "assetRef": "heart.png", "xPercent": 10.0,
            "yPercent": 20.0, "widthPercent": 5.0, "heightPercent": 5.0}]);
        let updated = journal_entry::Model {
            annotations: stickers.clone(),
            ..entry.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = JournalEntryRepository::new(db);
        let result = repo.update_annotations(entry, stickers).await.unwrap();
        assert_eq!(result.annotations[0]["assetRef"], "heart.png");
    }

    #[test]
    fn test_unique_violation_is_duplicate_entry() {
        let err = DbErr::Custom("duplicate key value".to_string());
        let sql_err = SqlErr::UniqueConstraintViolation(
            "duplicate key value violates unique constraint \"idx_journal_entry_owner_date\""
                .to_string(),
        );

        match map_insert_error(Some(sql_err), &err, "2024-03-01".to_string()) {
            AppError::DuplicateEntry(day) => assert_eq!(day, "2024-03-01"),
            other => panic!("Expected DuplicateEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_key_violation_is_database_error() {
        let err = DbErr::Custom("violates foreign key constraint".to_string());
        let sql_err = SqlErr::ForeignKeyConstraintViolation("fk".to_string());

        assert!(matches!(
            map_insert_error(Some(sql_err), &err, "2024-03-01".to_string()),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_unrelated_insert_error_is_database_error() {
        let err = DbErr::Custom("connection closed".to_string());
        match map_insert_error(err.sql_err(), &err, "2024-03-01".to_string()) {
            AppError::Database(msg) => assert!(msg.contains("connection closed")),
            other => panic!("Expected Database error, got {other:?}"),
        }
    }
}
