use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::StoreError;

/// A string-keyed, string-valued document store.
///
/// Keys are short ASCII identifiers (`contracts_v1`,
/// `receipt_counter_202511`); values are JSON documents or decimal integers.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Add one to the integer under `key` (absent counts as 0) and return the
    /// new value. The read and the write form one step: no two calls on the
    /// same store ever return the same value for the same key.
    fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// All keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Parse a stored counter value. Absent means 0.
pub(crate) fn parse_counter(key: &str, value: Option<String>) -> Result<u64, StoreError> {
    match value {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|_| StoreError::BadCounter {
            key: key.to_string(),
            value: v,
        }),
    }
}

/// Ephemeral store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries()?;
        let next = parse_counter(key, entries.get(key).cloned())? + 1;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
