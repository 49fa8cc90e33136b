pub mod audit;
pub mod config;
pub mod contract;
pub mod receipt;

pub use audit::{Authorization, CallLogEntry, StatusChangeLogEntry};
pub use config::{ApproverSecret, ConfigError, TmsConfig};
pub use contract::{Asset, Attachment, Contract, ContractStatus, ParseStatusError, Payment};
pub use receipt::{ReceiptKey, ReceiptNumber};
