//! Recording payments against contracts.

use chrono::{DateTime, TimeZone};
use tms_core::Payment;
use tms_store::{KvStore, Repository};
use tracing::info;

use crate::{EngineError, ReceiptSequencer};

/// A payment as submitted by an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: f64,
    /// Category tag, e.g. `bill`.
    pub kind: String,
    pub request_receipt: bool,
}

/// Records payments, issuing receipts on request.
pub struct PaymentDesk<'a, S> {
    repo: &'a Repository<S>,
    sequencer: ReceiptSequencer<'a, S>,
}

impl<'a, S: KvStore> PaymentDesk<'a, S> {
    pub fn new(repo: &'a Repository<S>, receipt_prefix: impl Into<String>) -> Self {
        Self {
            repo,
            sequencer: ReceiptSequencer::new(repo, receipt_prefix),
        }
    }

    /// Record `request` against `contract_id` at time `now`.
    ///
    /// The contract and amount are checked before a receipt number is taken,
    /// so a rejected submission never consumes one. The payment goes to the
    /// front of the contract's list and its amount is added to `paid`.
    ///
    /// The counter and the contract live under different keys. If saving the
    /// contract fails after the receipt was issued, that number stays used
    /// and the month's run has a gap; numbers are never handed out twice.
    pub fn submit<Tz: TimeZone>(
        &self,
        contract_id: &str,
        request: &PaymentRequest,
        now: &DateTime<Tz>,
    ) -> Result<Payment, EngineError> {
        if !request.amount.is_finite() || request.amount < 0.0 {
            return Err(EngineError::InvalidAmount(request.amount));
        }
        if self.repo.find_contract(contract_id)?.is_none() {
            return Err(EngineError::ContractNotFound(contract_id.to_string()));
        }

        let receipt = if request.request_receipt {
            Some(self.sequencer.issue(now)?.to_string())
        } else {
            None
        };
        let payment = Payment {
            date: now.date_naive().format("%Y-%m-%d").to_string(),
            kind: request.kind.clone(),
            amount: request.amount,
            receipt,
        };

        let recorded = payment.clone();
        self.repo
            .update_contract(contract_id, move |c| {
                c.paid += recorded.amount;
                c.payments.insert(0, recorded);
            })?
            .ok_or_else(|| EngineError::ContractNotFound(contract_id.to_string()))?;

        info!(
            contract = %contract_id,
            amount = payment.amount,
            kind = %payment.kind,
            receipt = payment.receipt.as_deref().unwrap_or("-"),
            "payment recorded"
        );
        Ok(payment)
    }
}
