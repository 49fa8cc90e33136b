//! Store doubles for failure-path tests.

use tms_store::{KvStore, MemoryStore, StoreError};

/// A [`MemoryStore`] whose `set` fails for one key.
#[derive(Debug, Default)]
pub(crate) struct ReadOnlyKey {
    pub inner: MemoryStore,
    pub key: &'static str,
}

impl ReadOnlyKey {
    pub fn new(key: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            key,
        }
    }
}

impl KvStore for ReadOnlyKey {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.key {
            return Err(StoreError::Other(format!("{key} is read-only")));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn increment(&self, key: &str) -> Result<u64, StoreError> {
        self.inner.increment(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys_with_prefix(prefix)
    }
}
