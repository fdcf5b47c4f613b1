//! `StateStore` trait: the read/write contract every scan record backend satisfies.
//!
//! Writers append per `(account, region, service, operation)` key; readers
//! never write. The in-memory implementation lives in `stratus-storage`.
//! The trait is object-safe, `Send + Sync`, and has a blanket `Arc<T>` impl.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::types::scan::{ScanKey, ScanRecord};

pub trait StateStore: Send + Sync {
    /// Append records to the sequence at `key`.
    fn write(&self, key: &ScanKey, records: Vec<ScanRecord>) -> Result<(), StorageError>;

    /// Records for one (account, region, service, operation). Empty if none.
    fn read_scoped(
        &self,
        account: &str,
        region: &str,
        service: &str,
        operation: &str,
    ) -> Result<Vec<ScanRecord>, StorageError>;

    /// Records for (service, operation) across every account and region
    /// written so far, in a stable order.
    fn read_global(&self, service: &str, operation: &str) -> Result<Vec<ScanRecord>, StorageError>;

    /// Every (account, region) pair that has at least one key written.
    fn scopes(&self) -> Result<Vec<(String, String)>, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn write(&self, key: &ScanKey, records: Vec<ScanRecord>) -> Result<(), StorageError> {
        (**self).write(key, records)
    }
    fn read_scoped(
        &self,
        account: &str,
        region: &str,
        service: &str,
        operation: &str,
    ) -> Result<Vec<ScanRecord>, StorageError> {
        (**self).read_scoped(account, region, service, operation)
    }
    fn read_global(&self, service: &str, operation: &str) -> Result<Vec<ScanRecord>, StorageError> {
        (**self).read_global(service, operation)
    }
    fn scopes(&self) -> Result<Vec<(String, String)>, StorageError> {
        (**self).scopes()
    }
}
