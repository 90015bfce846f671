//! In-memory config store for testing.

use std::sync::Mutex;

use crate::indexer::IndexerConfig;
use crate::store::{IndexerConfigStore, StoreError};

/// `IndexerConfigStore` backed by a `Vec`, counting writes.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: Mutex<Vec<IndexerConfig>>,
    saves: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `configs`.
    pub fn with_configs(configs: Vec<IndexerConfig>) -> Self {
        Self {
            configs: Mutex::new(configs),
            saves: Mutex::new(0),
        }
    }

    /// Current contents, in insertion order.
    pub fn snapshot(&self) -> Vec<IndexerConfig> {
        self.configs.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How many times `save_all` ran.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("store lock poisoned".into())
}

impl IndexerConfigStore for MemoryConfigStore {
    fn fetch_all(&self) -> Result<Vec<IndexerConfig>, StoreError> {
        let mut configs = self.configs.lock().map_err(poisoned)?.clone();
        configs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(configs)
    }

    fn save_all(&self, configs: &[IndexerConfig]) -> Result<(), StoreError> {
        *self.configs.lock().map_err(poisoned)? = configs.to_vec();
        *self.saves.lock().map_err(poisoned)? += 1;
        Ok(())
    }
}
