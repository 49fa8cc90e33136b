//! Append-only log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ContractStatus;

/// How a status change was authorised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    /// The actor held admin rights; no prompt was shown.
    Admin,
    /// A non-admin actor supplied the approver password.
    Password,
}

/// Immutable record of one applied status change.
///
/// Stored in `status_change_log_v1`. Rejected or abandoned attempts never
/// produce an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeLogEntry {
    pub contract_id: String,
    pub old_status: ContractStatus,
    pub new_status: ContractStatus,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
    pub authorization: Authorization,
}

/// One outbound CRM call, stored in `call_log_v1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub contract_id: String,
    pub customer: String,
    pub phone: String,
    pub called_at: DateTime<Utc>,
}
