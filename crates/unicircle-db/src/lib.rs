pub mod migration;
pub mod ops;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use unicircle_core::error::UniCircleError;
use unicircle_storage::KeyValueStore;

/// Open (or create) the UniCircle database at the given path and run migrations.
pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    migration::run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database for testing.
pub fn open_memory_db() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migration::run_migrations(&conn)?;
    Ok(conn)
}

fn storage_err(e: anyhow::Error) -> UniCircleError {
    UniCircleError::Storage(format!("{e:#}"))
}

/// Key-value store persisted in SQLite; the durable stand-in for browser
/// local storage.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, UniCircleError> {
        let conn = open_db(path).map_err(storage_err)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, UniCircleError> {
        Ok(Self::from_connection(open_memory_db().map_err(storage_err)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn keys(&self) -> Result<Vec<String>, UniCircleError> {
        ops::list_keys(&self.conn()).map_err(storage_err)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, UniCircleError> {
        ops::get_value(&self.conn(), key).map_err(storage_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), UniCircleError> {
        ops::set_value(&self.conn(), key, value).map_err(storage_err)
    }

    fn remove(&self, key: &str) -> Result<(), UniCircleError> {
        ops::delete_value(&self.conn(), key).map_err(storage_err)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), UniCircleError> {
        ops::set_values(&mut self.conn(), entries).map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("unicircle.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .set_many(&[
                    ("unicircle_collections", "[]".to_string()),
                    ("unicircle_collection_items", "[]".to_string()),
                ])
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec!["unicircle_collection_items", "unicircle_collections"]
        );
        store.remove("unicircle_collections").unwrap();
        assert!(store.get("unicircle_collections").unwrap().is_none());
    }
}
