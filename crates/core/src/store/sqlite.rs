//! SQLite-backed indexer config store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::{IndexerConfigStore, StoreError};
use crate::indexer::{ApiKeyTransport, IndexerConfig, IndexerType};

/// SQLite-backed config store.
pub struct SqliteIndexerStore {
    conn: Mutex<Connection>,
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteIndexerStore {
    /// Open (or create) the database file and its table.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS indexer_configs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                indexer_type TEXT NOT NULL,
                base_url TEXT,
                api_key TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                priority INTEGER NOT NULL DEFAULT 0,
                provider_subtype TEXT,
                endpoint_path TEXT,
                category_filter TEXT,
                api_key_transport TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_indexer_configs_priority ON indexer_configs(priority);
            "#,
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }
}

/// Columns as stored; nullable type-derived fields are filled on decode.
struct StoredRow {
    id: String,
    name: String,
    indexer_type: String,
    base_url: Option<String>,
    api_key: Option<String>,
    is_active: bool,
    priority: i64,
    provider_subtype: Option<String>,
    endpoint_path: Option<String>,
    category_filter: Option<String>,
    api_key_transport: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            indexer_type: row.get(2)?,
            base_url: row.get(3)?,
            api_key: row.get(4)?,
            is_active: row.get(5)?,
            priority: row.get(6)?,
            provider_subtype: row.get(7)?,
            endpoint_path: row.get(8)?,
            category_filter: row.get(9)?,
            api_key_transport: row.get(10)?,
        })
    }

    fn into_config(self) -> Result<IndexerConfig, StoreError> {
        let kind: IndexerType = self
            .indexer_type
            .parse()
            .map_err(StoreError::Serialization)?;
        let mut config = IndexerConfig::new(self.id, self.name, kind);
        config.base_url = self.base_url;
        config.api_key = self.api_key;
        config.is_active = self.is_active;
        config.priority = u32::try_from(self.priority.max(0)).unwrap_or(u32::MAX);
        config.category_filter = self.category_filter;
        if let Some(subtype) = self.provider_subtype.filter(|s| !s.is_empty()) {
            config.provider_subtype = subtype;
        }
        if let Some(path) = self.endpoint_path.filter(|s| !s.is_empty()) {
            config.endpoint_path = path;
        }
        if let Some(transport) = self.api_key_transport {
            config.api_key_transport = transport
                .parse::<ApiKeyTransport>()
                .map_err(StoreError::Serialization)?;
        }
        Ok(config)
    }
}

impl IndexerConfigStore for SqliteIndexerStore {
    fn fetch_all(&self) -> Result<Vec<IndexerConfig>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, indexer_type, base_url, api_key, is_active, priority,
                        provider_subtype, endpoint_path, category_filter, api_key_transport
                 FROM indexer_configs ORDER BY priority ASC, id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map([], StoredRow::from_row).map_err(db_err)?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row.map_err(db_err)?.into_config()?);
        }
        Ok(configs)
    }

    fn save_all(&self, configs: &[IndexerConfig]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        tx.execute("DELETE FROM indexer_configs", [])
            .map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO indexer_configs
                     (id, name, indexer_type, base_url, api_key, is_active, priority,
                      provider_subtype, endpoint_path, category_filter, api_key_transport,
                      updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .map_err(db_err)?;
            for config in configs {
                stmt.execute(params![
                    config.id,
                    config.name,
                    config.indexer_type.as_str(),
                    config.base_url,
                    config.api_key,
                    config.is_active,
                    config.priority,
                    config.provider_subtype,
                    config.endpoint_path,
                    config.category_filter,
                    config.api_key_transport.as_str(),
                    now,
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::default_configs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store() {
        let store = SqliteIndexerStore::in_memory().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_fetch_ordered_by_priority() {
        let store = SqliteIndexerStore::in_memory().unwrap();
        let mut configs = default_configs();
        configs.reverse();
        store.save_all(&configs).unwrap();

        let fetched = store.fetch_all().unwrap();
        assert_eq!(fetched, default_configs());
    }

    #[test]
    fn test_save_replaces_contents() {
        let store = SqliteIndexerStore::in_memory().unwrap();
        store.save_all(&default_configs()).unwrap();

        let kept = vec![default_configs()[2].clone().with_priority(0)];
        store.save_all(&kept).unwrap();
        assert_eq!(store.fetch_all().unwrap(), kept);
    }

    #[test]
    fn test_optional_fields_roundtrip() {
        let store = SqliteIndexerStore::in_memory().unwrap();
        let config = IndexerConfig::new("p", "Prowlarr", IndexerType::Prowlarr)
            .with_base_url("http://prowlarr:9696")
            .with_api_key("secret")
            .with_category_filter("2000")
            .with_active(false);
        store.save_all(std::slice::from_ref(&config)).unwrap();
        assert_eq!(store.fetch_all().unwrap(), vec![config]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("indexhub.db");
        {
            let store = SqliteIndexerStore::new(&path).unwrap();
            store.save_all(&default_configs()).unwrap();
        }
        let store = SqliteIndexerStore::new(&path).unwrap();
        assert_eq!(store.fetch_all().unwrap().len(), default_configs().len());
    }

    #[test]
    fn test_unknown_type_is_a_serialization_error() {
        let store = SqliteIndexerStore::in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO indexer_configs (id, name, indexer_type, updated_at)
                 VALUES ('x', 'x', 'gopher', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        }
        assert!(matches!(
            store.fetch_all(),
            Err(StoreError::Serialization(_))
        ));
    }
}
