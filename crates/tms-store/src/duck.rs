//! DuckDB-backed key-value store.

use std::path::Path;

use duckdb::{Connection, params};
use tracing::{info, warn};

use crate::StoreError;
use crate::kv::{KvStore, parse_counter};

/// Key-value store in a single DuckDB table `kv(key, value)`.
///
/// Counter increments run inside a transaction, so the read and the write
/// are one step even when several connections share the database file.
///
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened duckdb store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (key VARCHAR PRIMARY KEY, value VARCHAR NOT NULL)",
        )?;
        Ok(Self { conn })
    }

    fn increment_in_tx(&self, key: &str) -> Result<u64, StoreError> {
        let next = parse_counter(key, self.get(key)?)? + 1;
        self.set(key, &next.to_string())?;
        Ok(next)
    }
}

impl KvStore for DuckStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .execute("INSERT OR REPLACE INTO kv VALUES (?, ?)", params![key, value])?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }

    fn increment(&self, key: &str) -> Result<u64, StoreError> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match self.increment_in_tx(key) {
            Ok(next) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(next)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(key, error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE starts_with(key, ?) ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory() {
        let store = DuckStore::open().unwrap();
        assert_eq!(store.get("contracts_v1").unwrap(), None);
    }

    #[test]
    fn set_replaces_value() {
        let store = DuckStore::open().unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn increment_is_sequential() {
        let store = DuckStore::open().unwrap();
        assert_eq!(store.increment("receipt_counter_202511").unwrap(), 1);
        assert_eq!(store.increment("receipt_counter_202511").unwrap(), 2);
        assert_eq!(store.increment("receipt_counter_202512").unwrap(), 1);
    }

    #[test]
    fn failed_increment_rolls_back() {
        let store = DuckStore::open().unwrap();
        store.set("n", "not-a-number").unwrap();
        assert!(store.increment("n").is_err());
        assert_eq!(store.get("n").unwrap().as_deref(), Some("not-a-number"));
        // Connection is usable after the rollback.
        assert_eq!(store.increment("m").unwrap(), 1);
    }

    #[test]
    fn keys_with_prefix_sorted() {
        let store = DuckStore::open().unwrap();
        store.set("receipt_counter_202512", "1").unwrap();
        store.set("receipt_counter_202511", "1").unwrap();
        store.set("assets_v1", "[]").unwrap();
        assert_eq!(
            store.keys_with_prefix("receipt_counter_").unwrap(),
            vec!["receipt_counter_202511", "receipt_counter_202512"]
        );
    }

    #[test]
    fn persistent_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("tms.duckdb");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        store.increment("receipt_counter_202511").unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert_eq!(store.increment("receipt_counter_202511").unwrap(), 2);
    }
}
