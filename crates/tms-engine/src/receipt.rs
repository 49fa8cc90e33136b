//! Month-scoped receipt issuance.

use chrono::{DateTime, Datelike, TimeZone};
use tms_core::{ReceiptKey, ReceiptNumber};
use tms_store::{KvStore, Repository};
use tracing::info;

use crate::EngineError;

/// Issues receipt numbers `PREFIX-YYYYMM-NNNN` from per-month counters.
///
/// The current time is always supplied by the caller; the sequencer never
/// reads a clock.
pub struct ReceiptSequencer<'a, S> {
    repo: &'a Repository<S>,
    prefix: String,
}

impl<'a, S: KvStore> ReceiptSequencer<'a, S> {
    pub fn new(repo: &'a Repository<S>, prefix: impl Into<String>) -> Self {
        Self {
            repo,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Take the next number in the month of `now`.
    ///
    /// The counter is persisted before the number is returned. A store
    /// failure is returned as an error; no number is produced without a
    /// successful write.
    pub fn issue<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<ReceiptNumber, EngineError> {
        let key = ReceiptKey::from_datetime(now)
            .ok_or_else(|| EngineError::UnsupportedYear(now.year()))?;
        let run = self.repo.increment_counter(key)?;
        let number = ReceiptNumber {
            prefix: self.prefix.clone(),
            key,
            run,
        };
        info!(receipt = %number, "receipt issued");
        Ok(number)
    }
}
