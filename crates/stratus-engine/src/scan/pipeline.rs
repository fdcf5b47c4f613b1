//! ScanPipeline: runs registered operation scanners for an account and
//! persists one ScanRecord per page or per parameter object.
//!
//! Plan levels run in order; within a level, every (operation, region) pair
//! is independent and runs in parallel via rayon when enabled. Each pair
//! writes its own key exactly once, so no two tasks write the same key.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Map;
use stratus_core::config::ScanConfig;
use stratus_core::errors::{ScanError, StorageError};
use stratus_core::types::scan::ParameterObject;
use stratus_core::{FxHashMap, RecordMetadata, ScanKey, ScanRecord, ScanScope, StateStore};

use super::plan::{PlannedOperation, ScanPlan};
use super::provider::{ErrorClass, ErrorClassifier, IdentityResolver, OperationScanner, ScanContext};
use super::retry::{with_retry, RetryPolicy};
use crate::params::resolve_parameters;
use crate::selector::SelectorEngine;
use crate::services::ServiceCatalog;

/// Counters for one account scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub account: String,
    pub calls: usize,
    pub records_written: usize,
    pub ignored: usize,
    pub failed: usize,
    pub retried: usize,
    /// Dependent operations skipped because their producer returned nothing.
    pub skipped: usize,
    /// Records written per `region/Service|Operation`.
    pub per_scope: BTreeMap<String, usize>,
}

impl ScanSummary {
    fn absorb(&mut self, outcome: OperationOutcome) {
        self.calls += outcome.calls;
        self.records_written += outcome.records;
        self.ignored += outcome.ignored;
        self.failed += outcome.failed;
        self.retried += outcome.retried;
        self.skipped += usize::from(outcome.skipped);
        if outcome.records > 0 {
            *self.per_scope.entry(outcome.label).or_default() += outcome.records;
        }
    }
}

#[derive(Debug, Default)]
struct OperationOutcome {
    label: String,
    calls: usize,
    records: usize,
    ignored: usize,
    failed: usize,
    retried: usize,
    skipped: bool,
}

pub struct ScanPipeline<'a> {
    store: &'a dyn StateStore,
    catalog: &'a ServiceCatalog,
    identity: Arc<dyn IdentityResolver>,
    scanners: FxHashMap<(String, String), Arc<dyn OperationScanner>>,
    config: ScanConfig,
    classifier: ErrorClassifier,
    retry: RetryPolicy,
}

impl<'a> ScanPipeline<'a> {
    pub fn new(
        store: &'a dyn StateStore,
        catalog: &'a ServiceCatalog,
        identity: Arc<dyn IdentityResolver>,
        config: ScanConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            identity,
            scanners: FxHashMap::default(),
            classifier: ErrorClassifier::from_config(&config),
            retry: RetryPolicy::from_config(&config.retry),
            config,
        }
    }

    /// Register a scanner; a later registration for the same operation replaces it.
    pub fn register(&mut self, scanner: Arc<dyn OperationScanner>) {
        let key = (scanner.service().to_string(), scanner.operation().to_string());
        self.scanners.insert(key, scanner);
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn OperationScanner>) -> Self {
        self.register(scanner);
        self
    }

    /// Plan over the operations that have a registered scanner.
    pub fn plan(&self) -> Result<ScanPlan, ScanError> {
        Ok(ScanPlan::build(self.catalog, |service, operation| {
            self.scanners
                .contains_key(&(service.to_string(), operation.to_string()))
        })?)
    }

    /// Scan every profile. An identity failure aborts only that profile.
    pub fn scan_accounts(&self, profiles: &[&str]) -> Vec<(String, Result<ScanSummary, ScanError>)> {
        profiles
            .iter()
            .map(|profile| (profile.to_string(), self.scan_account(profile)))
            .collect()
    }

    /// Scan one account: global services once in the default region,
    /// regional services in every configured region.
    pub fn scan_account(&self, profile: &str) -> Result<ScanSummary, ScanError> {
        let account = self
            .identity
            .account_id(profile)
            .map_err(|e| ScanError::IdentityResolution {
                profile: profile.to_string(),
                message: e.to_string(),
            })?;
        let plan = self.plan()?;
        let regions = self.config.effective_regions();
        let default_region = self.config.effective_default_region().to_string();

        tracing::info!(
            account = %account,
            regions = regions.len(),
            operations = plan.operation_count(),
            "scan started"
        );

        let mut summary = ScanSummary {
            account: account.clone(),
            ..ScanSummary::default()
        };
        for level in plan.levels() {
            let mut tasks: Vec<(&PlannedOperation, &str)> = Vec::new();
            for op in level {
                if op.global {
                    tasks.push((op, default_region.as_str()));
                } else {
                    tasks.extend(regions.iter().map(|r| (op, r.as_str())));
                }
            }

            let outcomes: Vec<Result<OperationOutcome, StorageError>> = if self.config.effective_parallel() {
                tasks
                    .par_iter()
                    .map(|(op, region)| self.run_operation(&account, region, op))
                    .collect()
            } else {
                tasks
                    .iter()
                    .map(|(op, region)| self.run_operation(&account, region, op))
                    .collect()
            };
            for outcome in outcomes {
                summary.absorb(outcome?);
            }
        }

        tracing::info!(
            account = %account,
            records = summary.records_written,
            failed = summary.failed,
            ignored = summary.ignored,
            "scan finished"
        );
        Ok(summary)
    }

    fn run_operation(
        &self,
        account: &str,
        region: &str,
        op: &PlannedOperation,
    ) -> Result<OperationOutcome, StorageError> {
        let mut outcome = OperationOutcome {
            label: format!("{region}/{}", op.label()),
            ..OperationOutcome::default()
        };
        let Some(scanner) = self
            .scanners
            .get(&(op.service.clone(), op.operation.clone()))
        else {
            return Ok(outcome);
        };

        let parameter_sets: Vec<Option<ParameterObject>> = if op.parameters.is_empty() {
            vec![None]
        } else {
            let engine = SelectorEngine::new(self.store);
            let scope = ScanScope::scoped(account, region);
            match resolve_parameters(&engine, &scope, &op.parameters) {
                Ok(resolved) => resolved.into_iter().map(Some).collect(),
                Err(e) => {
                    tracing::warn!(operation = %op.label(), region, error = %e, "parameter resolution failed");
                    Vec::new()
                }
            }
        };
        if parameter_sets.is_empty() {
            tracing::debug!(operation = %op.label(), region, "no dependency data; skipping");
            outcome.skipped = true;
            return Ok(outcome);
        }

        let ctx = ScanContext {
            account: account.to_string(),
            region: region.to_string(),
            service: op.service.clone(),
            operation: op.operation.clone(),
        };
        let mut records = Vec::new();
        for parameters in &parameter_sets {
            outcome.calls += 1;
            let attempted = with_retry(&self.retry, &self.classifier, || {
                scanner.scan(&ctx, parameters.as_ref())
            });
            outcome.retried += attempted.retries as usize;
            match attempted.result {
                Ok(pages) => {
                    let params = parameters.clone().unwrap_or_else(Map::new);
                    records.extend(pages.into_iter().map(|page| {
                        ScanRecord::new(RecordMetadata::now(account, region), params.clone(), page)
                    }));
                }
                Err((ErrorClass::Ignorable, e)) => {
                    tracing::debug!(operation = %op.label(), region, code = %e.code, "ignorable provider error");
                    outcome.ignored += 1;
                }
                Err((_, e)) => {
                    tracing::warn!(operation = %op.label(), region, error = %e, "provider call failed");
                    outcome.failed += 1;
                }
            }
        }

        outcome.records = records.len();
        if !records.is_empty() {
            let key = ScanKey::new(account, region, &op.service, &op.operation);
            self.store.write(&key, records)?;
        }
        Ok(outcome)
    }
}
