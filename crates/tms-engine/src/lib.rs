//! Business operations over the TMS repository: receipts, status approval,
//! payments, attachments, and CRM call logging.

mod error;
pub use error::EngineError;

pub mod attachment;
pub mod crm;
pub mod effects;
pub mod guard;
pub mod payment;
pub mod receipt;
pub mod seed;

#[cfg(test)]
mod testing;

pub use attachment::{UploadedFile, attach};
pub use crm::record_call;
pub use effects::{SIDE_EFFECTS, SideEffect, TransitionEffect};
pub use guard::{
    Actor, ApprovalState, PendingApproval, Role, StatusChange, StatusGuard, StatusRequest,
};
pub use payment::{PaymentDesk, PaymentRequest};
pub use receipt::ReceiptSequencer;
pub use seed::seed;
