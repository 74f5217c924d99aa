//! AppShelf Core — errors, configuration, settings, app registry.

pub mod apps;
pub mod config;
pub mod error;
pub mod settings;

pub use apps::{AppEntry, SpecEntry, APPS, SPECS};
pub use config::{AppShelfConfig, DataPaths};
pub use error::{Error, ErrorKind, Result};
pub use settings::{KeyValueStore, Settings, Theme, Typography};

/// Milliseconds since the Unix epoch, UTC.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
