//! Scan pipeline: dependency ordering, fan-out, retries, error classes.

mod common;

use std::sync::Arc;

use common::{assemble, builtin_catalog, scan_config, FakeScanner, StaticIdentity, ACCOUNT, REGION};
use serde_json::json;
use stratus_core::errors::{ScanError, StratusErrorCode};
use stratus_core::StateStore;
use stratus_engine::scan::ProviderError;
use stratus_engine::ScanPipeline;
use stratus_storage::MemoryStateStore;

const ECS_DEPENDENTS: [&str; 6] = [
    "DescribeClusters",
    "ListServices",
    "DescribeServices",
    "ListTasks",
    "DescribeTasks",
    "DescribeTaskDefinition",
];

#[test]
fn empty_dependency_skips_every_dependent() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let list = FakeScanner::pages("ECS", "ListClusters", vec![json!({"clusterArns": []})]);
    let dependents: Vec<Arc<FakeScanner>> = ECS_DEPENDENTS
        .iter()
        .map(|op| FakeScanner::pages("ECS", op, vec![json!({"unexpected": true})]))
        .collect();

    let mut pipeline = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]));
    pipeline.register(list.clone());
    for scanner in &dependents {
        pipeline.register(scanner.clone());
    }

    let summary = pipeline.scan_account("default").unwrap();
    assert_eq!(list.calls(), 1);
    assert!(dependents.iter().all(|s| s.calls() == 0));
    assert_eq!(summary.calls, 1);
    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.skipped, ECS_DEPENDENTS.len());
    assert_eq!(summary.failed, 0);

    for op in ECS_DEPENDENTS {
        assert!(store.read_scoped(ACCOUNT, REGION, "ECS", op).unwrap().is_empty());
    }

    let (graph, _) = assemble(&store, &catalog);
    assert!(graph.nodes().iter().all(|n| n.node_type == "account" || n.node_type == "region"));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn dependent_operation_fans_out_per_cluster() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let list = FakeScanner::pages("ECS", "ListClusters", vec![json!({"clusterArns": ["C1", "C2"]})]);
    let describe = FakeScanner::new("ECS", "DescribeClusters", |_, params, _| {
        let arn = params.and_then(|p| p.get("clusters")).cloned().unwrap_or_default();
        Ok(vec![json!({"clusters": [{"clusterArn": arn, "clusterName": "n"}]})])
    });

    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(list)
        .with_scanner(describe.clone())
        .scan_account("default")
        .unwrap();

    assert_eq!(describe.calls(), 2);
    let params: Vec<serde_json::Value> = describe
        .seen()
        .into_iter()
        .map(|(_, p)| serde_json::Value::Object(p.unwrap()))
        .collect();
    assert_eq!(
        params,
        vec![
            json!({"clusters": "C1", "include": ["TAGS"]}),
            json!({"clusters": "C2", "include": ["TAGS"]}),
        ]
    );

    let records = store.read_scoped(ACCOUNT, REGION, "ECS", "DescribeClusters").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].parameters["clusters"], json!("C2"));
    assert_eq!(records[1].metadata.account, ACCOUNT);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.per_scope[&format!("{REGION}/ECS|DescribeClusters")], 2);

    let (graph, _) = assemble(&store, &catalog);
    assert!(graph.find_node("C1").is_some());
    assert!(graph.find_node("C2").is_some());
}

#[test]
fn every_page_is_one_record() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let pages = vec![
        json!({"Functions": [{"FunctionArn": "f1"}]}),
        json!({"Functions": [{"FunctionArn": "f2"}]}),
        json!({"Functions": []}),
    ];
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(FakeScanner::pages("Lambda", "ListFunctions", pages))
        .scan_account("default")
        .unwrap();
    assert_eq!(summary.records_written, 3);
    assert_eq!(store.read_scoped(ACCOUNT, REGION, "Lambda", "ListFunctions").unwrap().len(), 3);
}

#[test]
fn global_services_scan_once_in_default_region() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let buckets = FakeScanner::pages("S3", "ListBuckets", vec![json!({"Buckets": [{"Name": "a"}]})]);
    let functions = FakeScanner::pages("Lambda", "ListFunctions", vec![json!({"Functions": []})]);

    ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[REGION, "eu-west-1"]))
        .with_scanner(buckets.clone())
        .with_scanner(functions.clone())
        .scan_account("default")
        .unwrap();

    assert_eq!(buckets.calls(), 1);
    assert_eq!(buckets.seen()[0].0, REGION);
    assert_eq!(functions.calls(), 2);
    let mut regions: Vec<String> = functions.seen().into_iter().map(|(r, _)| r).collect();
    regions.sort();
    assert_eq!(regions, vec!["eu-west-1".to_string(), REGION.to_string()]);
}

#[test]
fn retryable_errors_are_retried() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let flaky = FakeScanner::new("Lambda", "ListFunctions", |_, _, n| {
        if n < 2 {
            Err(ProviderError::new("ThrottlingException", "rate exceeded"))
        } else {
            Ok(vec![json!({"Functions": []})])
        }
    });
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(flaky.clone())
        .scan_account("default")
        .unwrap();
    assert_eq!(flaky.calls(), 3);
    assert_eq!(summary.retried, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.records_written, 1);
}

#[test]
fn exhausted_retries_count_as_failure() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let throttled = FakeScanner::new("Lambda", "ListFunctions", |_, _, _| {
        Err(ProviderError::new("Throttling", "rate exceeded"))
    });
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(throttled.clone())
        .scan_account("default")
        .unwrap();
    assert_eq!(throttled.calls(), 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.records_written, 0);
}

#[test]
fn ignorable_errors_record_absence() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let buckets = FakeScanner::pages(
        "S3",
        "ListBuckets",
        vec![json!({"Buckets": [{"Name": "plain"}, {"Name": "site"}]})],
    );
    let website = FakeScanner::new("S3", "GetBucketWebsite", |_, params, _| {
        match params.and_then(|p| p.get("Bucket")).and_then(|b| b.as_str()) {
            Some("site") => Ok(vec![json!({"IndexDocument": {"Suffix": "index.html"}})]),
            _ => Err(ProviderError::new("NoSuchWebsiteConfiguration", "no website")),
        }
    });
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(buckets)
        .with_scanner(website.clone())
        .scan_account("default")
        .unwrap();

    assert_eq!(website.calls(), 2);
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.failed, 0);
    let records = store.read_scoped(ACCOUNT, REGION, "S3", "GetBucketWebsite").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].parameters["Bucket"], json!("site"));
}

#[test]
fn configured_codes_extend_classification() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let mut config = scan_config(&[]);
    config.ignorable_error_codes.push("OptInRequired".into());
    let scanner = FakeScanner::new("Lambda", "ListFunctions", |_, _, _| {
        Err(ProviderError::new("OptInRequired", "region not enabled"))
    });
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), config)
        .with_scanner(scanner)
        .scan_account("default")
        .unwrap();
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn fatal_error_in_one_region_does_not_stop_others() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let scanner = FakeScanner::new("Lambda", "ListFunctions", |ctx, _, _| {
        if ctx.region == "eu-west-1" {
            Err(ProviderError::new("AccessDenied", "not authorized"))
        } else {
            Ok(vec![json!({"Functions": []})])
        }
    });
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[REGION, "eu-west-1"]))
        .with_scanner(scanner)
        .scan_account("default")
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.records_written, 1);
    assert!(store.read_scoped(ACCOUNT, "eu-west-1", "Lambda", "ListFunctions").unwrap().is_empty());
}

#[test]
fn identity_failure_aborts_only_that_account() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let pipeline = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(FakeScanner::pages("Lambda", "ListFunctions", vec![json!({"Functions": []})]));

    let results = pipeline.scan_accounts(&["default", "broken", "other"]);
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    let err = results[1].1.as_ref().unwrap_err();
    assert!(matches!(err, ScanError::IdentityResolution { profile, .. } if profile == "broken"));
    assert_eq!(err.error_code(), "IDENTITY_RESOLUTION");
    assert_eq!(results[2].1.as_ref().unwrap().account, "222222222222");

    assert_eq!(store.scopes().unwrap().len(), 2);
}

#[test]
fn plan_covers_registered_operations_only() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let pipeline = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), scan_config(&[]))
        .with_scanner(FakeScanner::pages("ECS", "ListClusters", vec![]))
        .with_scanner(FakeScanner::pages("ECS", "ListServices", vec![]))
        .with_scanner(FakeScanner::pages("ECS", "DescribeServices", vec![]));
    let plan = pipeline.plan().unwrap();
    assert_eq!(plan.operation_count(), 3);
    assert_eq!(plan.level_of("ECS", "ListClusters"), Some(0));
    assert_eq!(plan.level_of("ECS", "ListServices"), Some(1));
    assert_eq!(plan.level_of("ECS", "DescribeServices"), Some(2));
    assert_eq!(plan.level_of("ECS", "DescribeClusters"), None);
}

#[test]
fn parallel_scan_writes_each_key_once() {
    let store = MemoryStateStore::new();
    let catalog = builtin_catalog();
    let mut config = scan_config(&[REGION, "eu-west-1", "ap-south-1"]);
    config.parallel = Some(true);
    let summary = ScanPipeline::new(&store, &catalog, Arc::new(StaticIdentity), config)
        .with_scanner(FakeScanner::pages("Lambda", "ListFunctions", vec![json!({"Functions": []}), json!({"Functions": []})]))
        .with_scanner(FakeScanner::pages("SQS", "ListQueues", vec![json!({"QueueUrls": []})]))
        .with_scanner(FakeScanner::pages("S3", "ListBuckets", vec![json!({"Buckets": []})]))
        .scan_account("default")
        .unwrap();
    // 3 regions × (2 Lambda pages + 1 SQS page) + 1 global S3 page.
    assert_eq!(summary.records_written, 10);
    assert_eq!(store.record_count().unwrap(), 10);
    assert_eq!(store.key_count().unwrap(), 7);
    for region in [REGION, "eu-west-1", "ap-south-1"] {
        assert_eq!(store.read_scoped(ACCOUNT, region, "Lambda", "ListFunctions").unwrap().len(), 2);
    }
}
