//! Shared application state.

use std::sync::Arc;

use appshelf_core::{AppShelfConfig, Result, Settings};
use appshelf_research::ResearchService;
use appshelf_store::SqliteStore;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppShelfConfig,
    pub store: Arc<SqliteStore>,
    /// In-memory copy of the persisted settings; writes go through to the store.
    pub settings: RwLock<Settings>,
    pub research: ResearchService,
    /// Cancelled on shutdown; request-scoped tokens are children of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppShelfConfig, store: Arc<SqliteStore>) -> Result<Self> {
        let settings = Settings::load(store.as_ref())?;
        info!("Theme: {}", settings.theme);
        let research = ResearchService::from_config(&config, store.clone())?;
        Ok(Self {
            config,
            store,
            settings: RwLock::new(settings),
            research,
            shutdown: CancellationToken::new(),
        })
    }
}
