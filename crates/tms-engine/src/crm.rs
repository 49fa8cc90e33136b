//! CRM call logging.

use chrono::{DateTime, Utc};
use tms_core::CallLogEntry;
use tms_store::{KvStore, Repository};
use tracing::info;

use crate::EngineError;

/// Log an outbound call to the customer of `contract_id`.
pub fn record_call<S: KvStore>(
    repo: &Repository<S>,
    contract_id: &str,
    now: DateTime<Utc>,
) -> Result<CallLogEntry, EngineError> {
    let contract = repo
        .find_contract(contract_id)?
        .ok_or_else(|| EngineError::ContractNotFound(contract_id.to_string()))?;
    let entry = CallLogEntry {
        contract_id: contract.id,
        customer: contract.name,
        phone: contract.phone,
        called_at: now,
    };
    repo.append_call(entry.clone())?;
    info!(contract = %contract_id, phone = %entry.phone, "call logged");
    Ok(entry)
}
