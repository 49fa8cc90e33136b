//! Storage layer: key-value backends (memory, files, DuckDB) under a typed repository.

mod error;
pub use error::StoreError;

mod kv;
pub use kv::{KvStore, MemoryStore};

mod file;
pub use file::FileStore;

mod repo;
pub use repo::{
    ASSETS_KEY, CALL_LOG_KEY, CONTRACTS_KEY, Repository, STATUS_CHANGE_LOG_KEY,
};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
