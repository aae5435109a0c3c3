//! Create journal entry table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JournalEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntry::OwnerEmail)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntry::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntry::Title).string_len(256).not_null())
                    .col(ColumnDef::new(JournalEntry::Content).text().not_null())
                    .col(
                        ColumnDef::new(JournalEntry::Emotion)
                            .string_len(16)
                            .not_null()
                            .default("neutral"),
                    )
                    .col(
                        ColumnDef::new(JournalEntry::EmotionColor)
                            .string_len(7)
                            .not_null()
                            .default("#FFFFFF"),
                    )
                    .col(
                        ColumnDef::new(JournalEntry::Confidence)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(JournalEntry::Annotations)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(JournalEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JournalEntry::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: (owner_email, entry_date), one entry per user per day
        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entry_owner_date")
                    .table(JournalEntry::Table)
                    .col(JournalEntry::OwnerEmail)
                    .col(JournalEntry::EntryDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: owner_email (for listing a user's entries)
        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entry_owner_email")
                    .table(JournalEntry::Table)
                    .col(JournalEntry::OwnerEmail)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum JournalEntry {
    Table,
    Id,
    OwnerEmail,
    EntryDate,
    Title,
    Content,
    Emotion,
    EmotionColor,
    Confidence,
    Annotations,
    CreatedAt,
    UpdatedAt,
}
