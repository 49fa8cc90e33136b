//! Typed access to the TMS documents held in a [`KvStore`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tms_core::receipt::COUNTER_KEY_PREFIX;
use tms_core::{Asset, CallLogEntry, Contract, ReceiptKey, StatusChangeLogEntry};
use tracing::{debug, warn};

use crate::{KvStore, StoreError};

pub const CONTRACTS_KEY: &str = "contracts_v1";
pub const STATUS_CHANGE_LOG_KEY: &str = "status_change_log_v1";
pub const ASSETS_KEY: &str = "assets_v1";
pub const CALL_LOG_KEY: &str = "call_log_v1";

/// Typed reads and writes over a key-value store.
///
/// Each document is a JSON array stored under its own key; receipt counters
/// are plain integers under `receipt_counter_<YYYYMM>`.
pub struct Repository<S> {
    store: S,
}

impl<S: KvStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.store.get(key)? {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text).map_err(|source| StoreError::Json {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let text = serde_json::to_string(items).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &text)?;
        debug!(key, count = items.len(), "wrote document");
        Ok(())
    }

    fn append<T>(&self, key: &str, item: T) -> Result<usize, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self.read_list(key)?;
        items.push(item);
        self.write_list(key, &items)?;
        Ok(items.len())
    }

    // ── Contracts ──

    /// Whether the contract document has ever been written.
    pub fn has_contracts(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(CONTRACTS_KEY)?.is_some())
    }

    pub fn contracts(&self) -> Result<Vec<Contract>, StoreError> {
        self.read_list(CONTRACTS_KEY)
    }

    pub fn save_contracts(&self, contracts: &[Contract]) -> Result<(), StoreError> {
        self.write_list(CONTRACTS_KEY, contracts)
    }

    pub fn find_contract(&self, id: &str) -> Result<Option<Contract>, StoreError> {
        Ok(self.contracts()?.into_iter().find(|c| c.id == id))
    }

    /// Apply `f` to the contract with `id` and persist the result.
    ///
    /// Returns `None` without writing anything when no such contract exists.
    pub fn update_contract<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Contract) -> T,
    ) -> Result<Option<T>, StoreError> {
        let mut contracts = self.contracts()?;
        let Some(contract) = contracts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let out = f(contract);
        self.save_contracts(&contracts)?;
        Ok(Some(out))
    }

    // ── Receipt counters ──

    /// Receipts issued so far in the month of `key`.
    pub fn counter(&self, key: ReceiptKey) -> Result<u64, StoreError> {
        let counter_key = key.counter_key();
        crate::kv::parse_counter(&counter_key, self.store.get(&counter_key)?)
    }

    /// Atomically bump the month's counter and return the new value.
    pub fn increment_counter(&self, key: ReceiptKey) -> Result<u64, StoreError> {
        self.store.increment(&key.counter_key())
    }

    /// Every month with a counter, oldest first.
    pub fn counters(&self) -> Result<Vec<(ReceiptKey, u64)>, StoreError> {
        let mut out = Vec::new();
        for counter_key in self.store.keys_with_prefix(COUNTER_KEY_PREFIX)? {
            let Some(key) = parse_counter_key(&counter_key) else {
                warn!(key = %counter_key, "skipping malformed counter key");
                continue;
            };
            out.push((key, self.counter(key)?));
        }
        out.sort_by_key(|(key, _)| *key);
        Ok(out)
    }

    // ── Logs and assets ──

    pub fn status_log(&self) -> Result<Vec<StatusChangeLogEntry>, StoreError> {
        self.read_list(STATUS_CHANGE_LOG_KEY)
    }

    /// Append one entry; returns the new log length.
    pub fn append_log_entry(&self, entry: StatusChangeLogEntry) -> Result<usize, StoreError> {
        self.append(STATUS_CHANGE_LOG_KEY, entry)
    }

    /// Replace the whole log. Only for writing back a log read with
    /// [`Repository::status_log`] and extended in memory.
    pub fn save_status_log(&self, entries: &[StatusChangeLogEntry]) -> Result<(), StoreError> {
        self.write_list(STATUS_CHANGE_LOG_KEY, entries)
    }

    pub fn assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.read_list(ASSETS_KEY)
    }

    pub fn append_asset(&self, asset: Asset) -> Result<usize, StoreError> {
        self.append(ASSETS_KEY, asset)
    }

    pub fn save_assets(&self, assets: &[Asset]) -> Result<(), StoreError> {
        self.write_list(ASSETS_KEY, assets)
    }

    pub fn call_log(&self) -> Result<Vec<CallLogEntry>, StoreError> {
        self.read_list(CALL_LOG_KEY)
    }

    pub fn append_call(&self, entry: CallLogEntry) -> Result<usize, StoreError> {
        self.append(CALL_LOG_KEY, entry)
    }
}

/// `receipt_counter_202511` → `ReceiptKey(2025, 11)`.
fn parse_counter_key(counter_key: &str) -> Option<ReceiptKey> {
    let digits = counter_key.strip_prefix(COUNTER_KEY_PREFIX)?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    ReceiptKey::new((value / 100) as i32, value % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::{TimeZone, Utc};
    use tms_core::{Authorization, ContractStatus};

    fn repo() -> Repository<MemoryStore> {
        Repository::new(MemoryStore::new())
    }

    #[test]
    fn empty_store_reads_empty_lists() {
        let repo = repo();
        assert!(!repo.has_contracts().unwrap());
        assert!(repo.contracts().unwrap().is_empty());
        assert!(repo.status_log().unwrap().is_empty());
        assert!(repo.assets().unwrap().is_empty());
        assert!(repo.call_log().unwrap().is_empty());
    }

    #[test]
    fn contracts_roundtrip_through_store() {
        let repo = repo();
        repo.save_contracts(&[Contract::new("C001", "Somchai"), Contract::new("C002", "Malee")])
            .unwrap();
        assert!(repo.has_contracts().unwrap());
        let found = repo.find_contract("C002").unwrap().unwrap();
        assert_eq!(found.name, "Malee");
        assert!(repo.find_contract("C999").unwrap().is_none());
    }

    #[test]
    fn update_missing_contract_writes_nothing() {
        let repo = repo();
        let out = repo.update_contract("C404", |c| c.paid += 1.0).unwrap();
        assert!(out.is_none());
        assert!(!repo.has_contracts().unwrap());
    }

    #[test]
    fn update_contract_persists() {
        let repo = repo();
        repo.save_contracts(&[Contract::new("C001", "Somchai")]).unwrap();
        let paid = repo
            .update_contract("C001", |c| {
                c.paid += 250.0;
                c.paid
            })
            .unwrap();
        assert_eq!(paid, Some(250.0));
        assert_eq!(repo.find_contract("C001").unwrap().unwrap().paid, 250.0);
    }

    #[test]
    fn counters_are_per_month() {
        let repo = repo();
        let nov = ReceiptKey::new(2025, 11).unwrap();
        let dec = ReceiptKey::new(2025, 12).unwrap();
        assert_eq!(repo.counter(nov).unwrap(), 0);
        assert_eq!(repo.increment_counter(nov).unwrap(), 1);
        assert_eq!(repo.increment_counter(nov).unwrap(), 2);
        assert_eq!(repo.increment_counter(dec).unwrap(), 1);
        assert_eq!(repo.counter(nov).unwrap(), 2);
        assert_eq!(repo.counters().unwrap(), vec![(nov, 2), (dec, 1)]);
    }

    #[test]
    fn counters_skip_malformed_keys() {
        let repo = repo();
        repo.store().set("receipt_counter_2025", "3").unwrap();
        repo.store().set("receipt_counter_202513", "3").unwrap();
        assert!(repo.counters().unwrap().is_empty());
    }

    #[test]
    fn log_appends_in_order() {
        let repo = repo();
        let at = Utc.with_ymd_and_hms(2025, 11, 20, 10, 0, 0).unwrap();
        let entry = |new_status| StatusChangeLogEntry {
            contract_id: "C001".into(),
            old_status: ContractStatus::Active,
            new_status,
            changed_at: at,
            actor: "operator".into(),
            authorization: Authorization::Admin,
        };
        assert_eq!(repo.append_log_entry(entry(ContractStatus::Closed)).unwrap(), 1);
        assert_eq!(repo.append_log_entry(entry(ContractStatus::Overdue)).unwrap(), 2);
        let log = repo.status_log().unwrap();
        assert_eq!(log[0].new_status, ContractStatus::Closed);
        assert_eq!(log[1].new_status, ContractStatus::Overdue);
    }

    #[test]
    fn corrupt_document_names_key() {
        let repo = repo();
        repo.store().set(CONTRACTS_KEY, "{oops").unwrap();
        match repo.contracts() {
            Err(StoreError::Json { key, .. }) => assert_eq!(key, CONTRACTS_KEY),
            other => panic!("expected Json error, got {other:?}"),
        }
    }
}
