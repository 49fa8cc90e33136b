//! Attaching uploaded files to contracts.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tms_core::Attachment;
use tms_store::{KvStore, Repository};
use tracing::info;

use crate::EngineError;

/// A file accepted by the upload service, as listed in its response.
///
/// Extra fields in the response (such as `type`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    /// Where the upload service serves the file, e.g. `/uploads/<generated-name>`.
    pub url: String,
    pub size: u64,
}

/// Append `file` to the contract's attachments.
///
/// A missing contract is an error and nothing is written.
pub fn attach<S: KvStore>(
    repo: &Repository<S>,
    contract_id: &str,
    file: UploadedFile,
    now: DateTime<Utc>,
) -> Result<Attachment, EngineError> {
    let attachment = Attachment {
        name: file.name,
        url: file.url,
        size: file.size,
        time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    let stored = attachment.clone();
    let count = repo
        .update_contract(contract_id, move |c| {
            c.attachments.push(stored);
            c.attachments.len()
        })?
        .ok_or_else(|| EngineError::ContractNotFound(contract_id.to_string()))?;
    info!(contract = %contract_id, name = %attachment.name, count, "attachment added");
    Ok(attachment)
}
