use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt document under {key}: {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },

    #[error("counter {key} holds a non-integer value: {value:?}")]
    BadCounter { key: String, value: String },

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
