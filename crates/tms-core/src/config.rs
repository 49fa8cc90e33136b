//! Shared configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use ring::digest::{SHA256, digest};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings shared by the engine and the CLI.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```json
/// { "receipt_prefix": "AMC", "approver_password": "1234", "max_attempts": 3 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmsConfig {
    /// Organisation code at the front of every receipt number.
    pub receipt_prefix: String,
    /// Password a non-admin must supply to approve a status change.
    pub approver_password: String,
    /// Password attempts the CLI allows before abandoning an approval.
    pub max_attempts: u32,
}

impl Default for TmsConfig {
    fn default() -> Self {
        Self {
            receipt_prefix: "AMC".to_string(),
            approver_password: "1234".to_string(),
            max_attempts: 3,
        }
    }
}

impl TmsConfig {
    /// Load from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), prefix = %config.receipt_prefix, "loaded config");
        Ok(config)
    }

    pub fn approver_secret(&self) -> ApproverSecret {
        ApproverSecret::from_password(&self.approver_password)
    }
}

/// SHA-256 digest of the approver password.
///
/// The plaintext is not retained once the secret is built.
#[derive(Clone, PartialEq, Eq)]
pub struct ApproverSecret {
    digest: Vec<u8>,
}

impl ApproverSecret {
    pub fn from_password(password: &str) -> Self {
        Self {
            digest: digest(&SHA256, password.as_bytes()).as_ref().to_vec(),
        }
    }

    pub fn verify(&self, proof: &str) -> bool {
        digest(&SHA256, proof.as_bytes()).as_ref() == self.digest.as_slice()
    }
}

impl fmt::Debug for ApproverSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApproverSecret(<redacted>)")
    }
}
