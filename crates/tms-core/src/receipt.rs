//! Month-scoped receipt numbers.
//!
//! A receipt number has the shape `PREFIX-YYYYMM-NNNN`:
//!
//! - `PREFIX` is the organisation code (e.g. `AMC`)
//! - `YYYYMM` is the [`ReceiptKey`] of the month the receipt was issued in
//! - `NNNN` is the run within that month, starting at `0001`
//!
//! Every month has its own persisted counter under
//! `receipt_counter_<YYYYMM>`, so a new month starts a fresh run without
//! touching earlier counters.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone};

/// Store key prefix of the per-month counters.
pub const COUNTER_KEY_PREFIX: &str = "receipt_counter_";

/// Year-month bucket a receipt belongs to (`year * 100 + month`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiptKey {
    year: i32,
    month: u32,
}

impl ReceiptKey {
    /// `None` unless `year` has at most four digits and `month` is 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((0..=9999).contains(&year) && (1..=12).contains(&month)).then_some(Self { year, month })
    }

    /// Bucket of `now`, using the calendar fields of its own time zone.
    ///
    /// `None` for years outside `0..=9999`, which have no six-digit key.
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<Self> {
        Self::new(now.year(), now.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Numeric form, e.g. `202511`.
    pub fn value(&self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }

    /// Store key of this month's counter, e.g. `receipt_counter_202511`.
    pub fn counter_key(&self) -> String {
        format!("{COUNTER_KEY_PREFIX}{self}")
    }
}

impl fmt::Display for ReceiptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// An issued receipt number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptNumber {
    pub prefix: String,
    pub key: ReceiptKey,
    pub run: u64,
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", self.prefix, self.key, self.run)
    }
}
