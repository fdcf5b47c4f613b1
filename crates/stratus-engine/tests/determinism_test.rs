//! Same state in, same graph out: repeated, sequential and parallel
//! assembly agree, and so do sequential and parallel scans.

mod common;

use std::sync::Arc;

use common::{builtin_catalog, put, role, scan_config, FakeScanner, StaticIdentity, ACCOUNT, REGION};
use serde_json::{json, Value};
use stratus_core::config::GraphConfig;
use stratus_core::StateStore;
use stratus_engine::{GraphAssembler, ScanManifest, ScanPipeline};
use stratus_storage::MemoryStateStore;

fn populated_store() -> MemoryStateStore {
    let store = MemoryStateStore::new();
    for (account, region) in [(ACCOUNT, REGION), (ACCOUNT, "eu-west-1"), ("222222222222", REGION)] {
        let function = format!("arn:aws:lambda:{region}:{account}:function:worker");
        let queue = format!("arn:aws:sqs:{region}:{account}:jobs");
        let topic = format!("arn:aws:sns:{region}:{account}:events");
        let role_arn = format!("arn:aws:iam::{account}:role/worker");
        put(
            &store,
            account,
            region,
            "Lambda",
            "ListFunctions",
            vec![json!({"Functions": [{"FunctionArn": function, "FunctionName": "worker", "Role": role_arn}]})],
        );
        put(&store, account, region, "SQS", "GetQueueAttributes", vec![json!({"Attributes": {"QueueArn": queue}})]);
        put(&store, account, region, "SNS", "ListTopics", vec![json!({"Topics": [{"TopicArn": topic}]})]);
        put(
            &store,
            account,
            region,
            "SNS",
            "ListSubscriptions",
            vec![json!({"Subscriptions": [{"TopicArn": topic, "Endpoint": queue}]})],
        );
        if region == REGION {
            put(
                &store,
                account,
                region,
                "IAM",
                "ListRoles",
                vec![json!({"Roles": [role(
                    &role_arn,
                    json!([{"PolicyName": "queues", "PolicyDocument": {"Statement": [
                        {"Effect": "Allow", "Action": "sqs:*", "Resource": format!("arn:aws:sqs:*:{account}:*")}
                    ]}}]),
                )]})],
            );
            put(
                &store,
                account,
                region,
                "S3",
                "ListBuckets",
                vec![json!({"Buckets": [{"Name": format!("data-{account}")}]})],
            );
        }
    }
    store
}

fn assembled_json(store: &MemoryStateStore, parallel: bool) -> Value {
    let catalog = builtin_catalog();
    let manifest = ScanManifest::from_store(store, REGION).unwrap();
    let (graph, _) = GraphAssembler::new(store, &catalog, &GraphConfig::default())
        .unwrap()
        .with_parallel(parallel)
        .assemble(&manifest);
    graph.to_json().unwrap()
}

#[test]
fn repeated_assembly_is_identical() {
    let store = populated_store();
    let first = assembled_json(&store, true);
    for _ in 0..5 {
        assert_eq!(assembled_json(&store, true), first);
    }
}

#[test]
fn parallel_and_sequential_assembly_agree() {
    let store = populated_store();
    assert_eq!(assembled_json(&store, true), assembled_json(&store, false));
}

#[test]
fn role_edges_cover_every_region_of_the_account() {
    let store = populated_store();
    let catalog = builtin_catalog();
    let manifest = ScanManifest::from_store(&store, REGION).unwrap();
    let (graph, _) = GraphAssembler::new(&store, &catalog, &GraphConfig::default())
        .unwrap()
        .assemble(&manifest);

    let worker = format!("arn:aws:lambda:{REGION}:{ACCOUNT}:function:worker");
    let mut targets: Vec<&str> = graph.edges_from(&worker).map(|e| e.target.as_str()).collect();
    targets.sort();
    let expected = vec![
        format!("arn:aws:sqs:eu-west-1:{ACCOUNT}:jobs"),
        format!("arn:aws:sqs:{REGION}:{ACCOUNT}:jobs"),
    ];
    assert_eq!(targets, expected);
}

fn scan_into(store: &MemoryStateStore, parallel: bool) {
    let catalog = builtin_catalog();
    let mut config = scan_config(&[REGION, "eu-west-1"]);
    config.parallel = Some(parallel);
    ScanPipeline::new(store, &catalog, Arc::new(StaticIdentity), config)
        .with_scanner(FakeScanner::new("ECS", "ListClusters", |ctx, _, _| {
            Ok(vec![json!({"clusterArns": [format!("{}-a", ctx.region), format!("{}-b", ctx.region)]})])
        }))
        .with_scanner(FakeScanner::new("ECS", "ListServices", |_, params, _| {
            let cluster = params.and_then(|p| p.get("cluster")).cloned().unwrap_or_default();
            Ok(vec![json!({"serviceArns": [format!("{}/svc", cluster.as_str().unwrap_or_default())]})])
        }))
        .with_scanner(FakeScanner::pages("S3", "ListBuckets", vec![json!({"Buckets": [{"Name": "b"}]})]))
        .scan_account("default")
        .unwrap();
}

/// Record contents without capture timestamps.
fn contents(store: &MemoryStateStore) -> Vec<(String, String, Value, Value)> {
    let mut out = Vec::new();
    for (service, operation) in [("ECS", "ListClusters"), ("ECS", "ListServices"), ("S3", "ListBuckets")] {
        for record in store.read_global(service, operation).unwrap() {
            out.push((
                record.metadata.region,
                format!("{service}|{operation}"),
                Value::Object(record.parameters),
                record.result,
            ));
        }
    }
    out
}

#[test]
fn parallel_and_sequential_scans_store_the_same_records() {
    let sequential = MemoryStateStore::new();
    scan_into(&sequential, false);
    let parallel = MemoryStateStore::new();
    scan_into(&parallel, true);

    assert_eq!(sequential.key_count().unwrap(), 5);
    assert_eq!(contents(&sequential), contents(&parallel));
}
