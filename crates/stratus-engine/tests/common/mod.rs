//! Shared fixtures for stratus-engine integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use stratus_core::config::{GraphConfig, ScanConfig};
use stratus_core::types::scan::ParameterObject;
use stratus_core::{RecordMetadata, ScanKey, ScanRecord, StateStore};
use stratus_engine::graph::AssemblyStats;
use stratus_engine::scan::{IdentityResolver, OperationScanner, ProviderError, ScanContext};
use stratus_engine::{Graph, GraphAssembler, ScanManifest, ServiceCatalog};
use stratus_storage::MemoryStateStore;

pub const ACCOUNT: &str = "111111111111";
pub const REGION: &str = "us-east-1";

fn metadata(account: &str, region: &str) -> RecordMetadata {
    RecordMetadata {
        account: account.into(),
        region: region.into(),
        timestamp: 0,
    }
}

/// Write one record per result page, with no parameters.
pub fn put(
    store: &MemoryStateStore,
    account: &str,
    region: &str,
    service: &str,
    operation: &str,
    pages: Vec<Value>,
) {
    let records = pages
        .into_iter()
        .map(|page| ScanRecord::new(metadata(account, region), Map::new(), page))
        .collect();
    store
        .write(&ScanKey::new(account, region, service, operation), records)
        .unwrap();
}

/// Write records that carry the parameters they were called with.
pub fn put_with_params(
    store: &MemoryStateStore,
    account: &str,
    region: &str,
    service: &str,
    operation: &str,
    calls: Vec<(Value, Value)>,
) {
    let records = calls
        .into_iter()
        .map(|(params, result)| {
            let params = params.as_object().cloned().unwrap_or_default();
            ScanRecord::new(metadata(account, region), params, result)
        })
        .collect();
    store
        .write(&ScanKey::new(account, region, service, operation), records)
        .unwrap();
}

pub fn builtin_catalog() -> ServiceCatalog {
    ServiceCatalog::with_builtins().unwrap()
}

/// Assemble the whole store, sequentially for stable test output.
pub fn assemble(store: &MemoryStateStore, catalog: &ServiceCatalog) -> (Graph, AssemblyStats) {
    let manifest = ScanManifest::from_store(store, REGION).unwrap();
    GraphAssembler::new(store, catalog, &GraphConfig::default())
        .unwrap()
        .with_parallel(false)
        .assemble(&manifest)
}

/// An IAM role record in the raw `ListRoles` shape with inline policies.
pub fn role(arn: &str, policies: Value) -> Value {
    serde_json::json!({
        "Arn": arn,
        "RoleName": arn.rsplit('/').next().unwrap(),
        "RolePolicyList": policies,
    })
}

// ---- Fake provider ----

type Respond = dyn Fn(&ScanContext, Option<&ParameterObject>, usize) -> Result<Vec<Value>, ProviderError>
    + Send
    + Sync;

/// Scanner driven by a closure receiving the context, parameters, and the
/// 0-based call count for this scanner.
pub struct FakeScanner {
    service: String,
    operation: String,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Option<ParameterObject>)>>,
    respond: Box<Respond>,
}

impl FakeScanner {
    pub fn new(
        service: &str,
        operation: &str,
        respond: impl Fn(&ScanContext, Option<&ParameterObject>, usize) -> Result<Vec<Value>, ProviderError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            service: service.into(),
            operation: operation.into(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    /// Always returns the same pages.
    pub fn pages(service: &str, operation: &str, pages: Vec<Value>) -> Arc<Self> {
        Self::new(service, operation, move |_, _, _| Ok(pages.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(region, parameters)` per call, in call order.
    pub fn seen(&self) -> Vec<(String, Option<ParameterObject>)> {
        self.seen.lock().unwrap().clone()
    }
}

impl OperationScanner for FakeScanner {
    fn service(&self) -> &str {
        &self.service
    }

    fn operation(&self) -> &str {
        &self.operation
    }

    fn scan(&self, ctx: &ScanContext, parameters: Option<&ParameterObject>) -> Result<Vec<Value>, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((ctx.region.clone(), parameters.cloned()));
        (self.respond)(ctx, parameters, n)
    }
}

/// Profile `broken` has no credentials; every other profile maps to `ACCOUNT`,
/// except `other`, which maps to `222222222222`.
pub struct StaticIdentity;

impl IdentityResolver for StaticIdentity {
    fn account_id(&self, profile: &str) -> Result<String, ProviderError> {
        match profile {
            "broken" => Err(ProviderError::new("ExpiredToken", "the security token has expired")),
            "other" => Ok("222222222222".into()),
            _ => Ok(ACCOUNT.into()),
        }
    }
}

/// Sequential, no retry delay, the given regions.
pub fn scan_config(regions: &[&str]) -> ScanConfig {
    let mut config = ScanConfig {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        parallel: Some(false),
        ..ScanConfig::default()
    };
    config.retry.base_delay_ms = Some(0);
    config.retry.max_delay_ms = Some(0);
    config
}
