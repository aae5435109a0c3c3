//! Repositories wrapping database access for each entity.

mod journal_entry;
mod user;

pub use journal_entry::JournalEntryRepository;
pub use user::UserRepository;
