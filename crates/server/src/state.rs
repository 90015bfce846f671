use indexhub_core::{Config, IndexerManager, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    manager: Arc<IndexerManager>,
}

impl AppState {
    pub fn new(config: Config, manager: Arc<IndexerManager>) -> Self {
        Self { config, manager }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn manager(&self) -> &IndexerManager {
        self.manager.as_ref()
    }
}
