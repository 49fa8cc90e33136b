use thiserror::Error;
use tms_core::{ContractStatus, ParseStatusError};
use tms_store::StoreError;

use crate::ApprovalState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("contract not found: {0}")]
    ContractNotFound(String),

    #[error("invalid status transition: {0}")]
    InvalidStatus(#[from] ParseStatusError),

    #[error("invalid payment amount: {0}")]
    InvalidAmount(f64),

    #[error("wrong approver password")]
    WrongPassword,

    #[error("contract {contract_id} is now {found}, not {expected}; request dropped")]
    StatusMoved {
        contract_id: String,
        expected: ContractStatus,
        found: ContractStatus,
    },

    #[error("cannot number receipts in year {0}")]
    UnsupportedYear(i32),

    #[error("approval request for {contract_id} is {state}, not pending")]
    NotPending {
        contract_id: String,
        state: ApprovalState,
    },
}
