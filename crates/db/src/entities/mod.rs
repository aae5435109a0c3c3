//! Database entities.

#![allow(missing_docs)]

pub mod journal_entry;
pub mod user;

pub use journal_entry::{EmotionLabel, Entity as JournalEntry};
pub use user::Entity as User;
