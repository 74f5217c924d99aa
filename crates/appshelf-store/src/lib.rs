//! AppShelf Store — SQLite persistence for the document library and settings.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
