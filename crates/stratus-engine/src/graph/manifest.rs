//! Which accounts and regions a graph build covers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratus_core::errors::StorageError;
use stratus_core::StateStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountScope {
    pub account_id: String,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanManifest {
    pub accounts: Vec<AccountScope>,
    /// Region global services were scanned in.
    pub default_region: String,
}

impl ScanManifest {
    pub fn new(default_region: impl Into<String>) -> Self {
        Self {
            accounts: Vec::new(),
            default_region: default_region.into(),
        }
    }

    pub fn with_account<I, S>(mut self, account_id: impl Into<String>, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts.push(AccountScope {
            account_id: account_id.into(),
            regions: regions.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Every (account, region) the store holds records for, sorted.
    pub fn from_store(
        store: &dyn StateStore,
        default_region: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (account, region) in store.scopes()? {
            let regions = grouped.entry(account).or_default();
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        let accounts = grouped
            .into_iter()
            .map(|(account_id, mut regions)| {
                regions.sort();
                AccountScope {
                    account_id,
                    regions,
                }
            })
            .collect();
        Ok(Self {
            accounts,
            default_region: default_region.into(),
        })
    }
}
