//! SQLite storage adapter: one row per slot in a `slots` table.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use crate::ports::storage_port::StoragePort;
use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("storage", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "storage".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("storage", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| JournalError::Database {
                    reason: e.to_string(),
                })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })
    }
}

impl StoragePort for SqliteAdapter {
    fn read(&self, key: &str) -> Result<Option<String>, JournalError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT payload FROM slots WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), JournalError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO slots (key, payload, updated_at) VALUES (?1, ?2, ?3)",
            params![key, payload, Utc::now().to_rfc3339()],
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use tempfile::TempDir;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(JournalError::ConfigMissing { section, key }) => {
                assert_eq!(section, "storage");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn unwritten_slot_reads_none() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        assert_eq!(adapter.read("trades").unwrap(), None);
    }

    #[test]
    fn write_replaces_slot() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.write("trades", "[1]").unwrap();
        adapter.write("trades", "[1,2]").unwrap();
        adapter.write("strategies", "[]").unwrap();

        assert_eq!(adapter.read("trades").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(adapter.read("strategies").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let ini = format!(
            "[storage]\nbackend = sqlite\npath = {}\n",
            dir.path().join("journal.db").display()
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();

        {
            let adapter = SqliteAdapter::from_config(&config).unwrap();
            adapter.write("trades", "[]").unwrap();
        }

        let reopened = SqliteAdapter::from_config(&config).unwrap();
        assert_eq!(reopened.read("trades").unwrap().as_deref(), Some("[]"));
    }
}
