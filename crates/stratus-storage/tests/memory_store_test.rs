//! MemoryStateStore contract tests.

use std::sync::Arc;

use rayon::prelude::*;
use serde_json::{json, Map};
use stratus_core::types::scan::{RecordMetadata, ScanKey, ScanRecord};
use stratus_core::StateStore;
use stratus_storage::MemoryStateStore;

fn record(account: &str, region: &str, result: serde_json::Value) -> ScanRecord {
    ScanRecord::new(
        RecordMetadata {
            account: account.into(),
            region: region.into(),
            timestamp: 1,
        },
        Map::new(),
        result,
    )
}

#[test]
fn empty_store_reads_are_empty_not_errors() {
    let store = MemoryStateStore::new();
    assert!(store.read_scoped("1", "us-east-1", "S3", "ListBuckets").unwrap().is_empty());
    assert!(store.read_global("S3", "ListBuckets").unwrap().is_empty());
    assert!(store.scopes().unwrap().is_empty());
}

#[test]
fn writes_append_in_order() {
    let store = MemoryStateStore::new();
    let key = ScanKey::new("1", "us-east-1", "Lambda", "ListFunctions");
    store.write(&key, vec![record("1", "us-east-1", json!({"page": 1}))]).unwrap();
    store.write(&key, vec![record("1", "us-east-1", json!({"page": 2}))]).unwrap();

    let seq = store.read_scoped("1", "us-east-1", "Lambda", "ListFunctions").unwrap();
    assert_eq!(seq.len(), 2);
    assert_eq!(seq[0].result["page"], 1);
    assert_eq!(seq[1].result["page"], 2);
}

#[test]
fn global_read_aggregates_across_scopes_in_key_order() {
    let store = MemoryStateStore::new();
    for (account, region) in [("2", "us-east-1"), ("1", "eu-west-1"), ("1", "us-east-1")] {
        let key = ScanKey::new(account, region, "SNS", "ListTopics");
        store
            .write(&key, vec![record(account, region, json!({"a": account, "r": region}))])
            .unwrap();
    }
    store
        .write(
            &ScanKey::new("1", "us-east-1", "SQS", "ListQueues"),
            vec![record("1", "us-east-1", json!({}))],
        )
        .unwrap();

    let global = store.read_global("SNS", "ListTopics").unwrap();
    let order: Vec<(String, String)> = global
        .iter()
        .map(|r| (r.metadata.account.clone(), r.metadata.region.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("1".to_string(), "eu-west-1".to_string()),
            ("1".to_string(), "us-east-1".to_string()),
            ("2".to_string(), "us-east-1".to_string()),
        ]
    );
    assert_eq!(
        store.scopes().unwrap(),
        vec![
            ("1".to_string(), "eu-west-1".to_string()),
            ("1".to_string(), "us-east-1".to_string()),
            ("2".to_string(), "us-east-1".to_string()),
        ]
    );
}

#[test]
fn concurrent_writers_to_distinct_keys() {
    let store = Arc::new(MemoryStateStore::new());
    (0..64).into_par_iter().for_each(|i| {
        let key = ScanKey::new("1", format!("region-{}", i % 8), "EC2", format!("Op{i}"));
        store.write(&key, vec![record("1", "r", json!(i))]).unwrap();
    });
    assert_eq!(store.record_count().unwrap(), 64);
    assert_eq!(store.key_count().unwrap(), 64);
    assert_eq!(store.scopes().unwrap().len(), 8);
}

#[test]
fn empty_write_creates_no_key() {
    let store = MemoryStateStore::new();
    store.write(&ScanKey::new("1", "r", "S", "O"), Vec::new()).unwrap();
    assert_eq!(store.key_count().unwrap(), 0);
}

#[test]
fn arc_store_is_a_store() {
    fn assert_store<T: StateStore>(_: &T) {}
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    assert_store(&store);
}
