//! In-memory `StateStore`.
//!
//! Records live in a `BTreeMap` keyed by `(account, region, service, operation)`
//! behind an `RwLock`. Writers to distinct keys never observe each other's
//! partial state; global reads walk the map in key order, so the same store
//! always yields the same sequence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use stratus_core::errors::StorageError;
use stratus_core::types::scan::{ScanKey, ScanRecord};
use stratus_core::StateStore;

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<BTreeMap<ScanKey, Vec<ScanRecord>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all keys.
    pub fn record_count(&self) -> Result<usize, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "count" })?;
        Ok(records.values().map(Vec::len).sum())
    }

    /// Number of distinct keys written.
    pub fn key_count(&self) -> Result<usize, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "count" })?;
        Ok(records.len())
    }

    /// Dump every record as a JSON object keyed by `ScanKey` display form.
    pub fn snapshot(&self) -> Result<serde_json::Value, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "snapshot" })?;
        let mut out = serde_json::Map::new();
        for (key, seq) in records.iter() {
            out.insert(key.to_string(), serde_json::to_value(seq)?);
        }
        Ok(serde_json::Value::Object(out))
    }
}

impl StateStore for MemoryStateStore {
    fn write(&self, key: &ScanKey, records: Vec<ScanRecord>) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut map = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned { operation: "write" })?;
        tracing::trace!(key = %key, count = records.len(), "appending records");
        map.entry(key.clone()).or_default().extend(records);
        Ok(())
    }

    fn read_scoped(
        &self,
        account: &str,
        region: &str,
        service: &str,
        operation: &str,
    ) -> Result<Vec<ScanRecord>, StorageError> {
        let map = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "read_scoped" })?;
        let key = ScanKey::new(account, region, service, operation);
        Ok(map.get(&key).cloned().unwrap_or_default())
    }

    fn read_global(&self, service: &str, operation: &str) -> Result<Vec<ScanRecord>, StorageError> {
        let map = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "read_global" })?;
        Ok(map
            .iter()
            .filter(|(k, _)| k.service == service && k.operation == operation)
            .flat_map(|(_, seq)| seq.iter().cloned())
            .collect())
    }

    fn scopes(&self) -> Result<Vec<(String, String)>, StorageError> {
        let map = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned { operation: "scopes" })?;
        let mut scopes: Vec<(String, String)> = map
            .keys()
            .map(|k| (k.account.clone(), k.region.clone()))
            .collect();
        scopes.dedup();
        Ok(scopes)
    }
}
