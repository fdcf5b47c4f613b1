//! Role statements resolved into executor → resource edges.

mod common;

use common::{assemble, builtin_catalog, put, role, ACCOUNT, REGION};
use serde_json::json;
use stratus_engine::{PolicyEdgeResolver, ResourceResolver, RoleRecord, RoleStore, ServiceNodeIndex};
use stratus_storage::MemoryStateStore;

const ROLE: &str = "arn:aws:iam::111111111111:role/app";
const FUNCTION: &str = "arn:aws:lambda:us-east-1:111111111111:function:worker";

fn index() -> ServiceNodeIndex {
    let mut index = ServiceNodeIndex::new();
    index.insert("s3", "bucket-prefix-A");
    index.insert("s3", "other-bucket");
    index.insert("dynamodb", "arn:aws:dynamodb:us-east-1:111111111111:table/app-users");
    index.insert("dynamodb", "arn:aws:dynamodb:us-east-1:111111111111:table/app-orders");
    index.insert("dynamodb", "arn:aws:dynamodb:us-east-1:111111111111:table/web-sessions");
    index.insert("sqs", "arn:aws:sqs:us-east-1:111111111111:jobs");
    index
}

fn roles(statements: serde_json::Value) -> RoleStore {
    let mut store = RoleStore::new();
    store.insert(
        RoleRecord::from_value(&role(ROLE, json!([{"PolicyName": "app-access", "PolicyDocument": {"Statement": statements}}])))
            .unwrap(),
    );
    store
}

#[test]
fn bucket_prefix_glob_yields_exactly_one_edge() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = roles(json!([{"Effect": "Allow", "Action": "s3:*", "Resource": "arn:aws:s3:::bucket-prefix-*"}]));
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));

    let edges = resolver.edges_for_role(ROLE, FUNCTION);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, FUNCTION);
    assert_eq!(edges[0].target, "bucket-prefix-A");
    assert_eq!(edges[0].name, "app-access");
    assert_eq!(edges[0].metadata["label"], json!("app-access"));
    assert_eq!(edges[0].metadata["roleArn"], json!(ROLE));
    assert_eq!(edges[0].metadata["effect"], json!("Allow"));
}

#[test]
fn multi_statement_policy_contributes_every_statement() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = roles(json!([
        {"Effect": "Allow", "Action": ["s3:GetObject", "s3:PutObject"], "Resource": ["arn:aws:s3:::bucket-prefix-*", "arn:aws:s3:::other-bucket/*"]},
        {"Effect": "Allow", "Action": "sqs:SendMessage", "Resource": "arn:aws:sqs:us-east-1:111111111111:jobs"},
        {"Effect": "Allow", "Action": "dynamodb:Query", "Resource": "*arn:aws:dynamodb:*:table/web-*"},
    ]));
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));

    let mut targets: Vec<String> = resolver
        .edges_for_role(ROLE, FUNCTION)
        .into_iter()
        .map(|e| e.target)
        .collect();
    targets.sort();
    assert_eq!(
        targets,
        vec![
            "arn:aws:dynamodb:us-east-1:111111111111:table/web-sessions".to_string(),
            "arn:aws:sqs:us-east-1:111111111111:jobs".to_string(),
            "bucket-prefix-A".to_string(),
            "other-bucket".to_string(),
        ]
    );
}

#[test]
fn object_path_resource_resolves_to_bucket() {
    let catalog = builtin_catalog();
    let index = index();
    let resolver = ResourceResolver::new(&catalog, &index, "aws");
    assert_eq!(resolver.resolve("arn:aws:s3:::other-bucket/*"), vec!["other-bucket".to_string()]);
    assert_eq!(resolver.resolve("arn:aws:s3:::other-bucket"), vec!["other-bucket".to_string()]);
}

#[test]
fn wildcard_matches_anywhere_in_the_id() {
    let catalog = builtin_catalog();
    let index = index();
    let resolver = ResourceResolver::new(&catalog, &index, "aws");
    let tables = resolver.resolve("arn:aws:dynamodb:us-east-1:111111111111:table/app-*");
    assert_eq!(
        tables,
        vec![
            "arn:aws:dynamodb:us-east-1:111111111111:table/app-orders".to_string(),
            "arn:aws:dynamodb:us-east-1:111111111111:table/app-users".to_string(),
        ]
    );
}

#[test]
fn exact_resource_requires_exact_match() {
    let catalog = builtin_catalog();
    let index = index();
    let resolver = ResourceResolver::new(&catalog, &index, "aws");
    assert_eq!(
        resolver.resolve("arn:aws:sqs:us-east-1:111111111111:jobs"),
        vec!["arn:aws:sqs:us-east-1:111111111111:jobs".to_string()]
    );
    assert!(resolver.resolve("arn:aws:sqs:us-east-1:111111111111:job").is_empty());
}

#[test]
fn bare_star_resolves_to_nothing() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = roles(json!([{"Effect": "Allow", "Action": "*", "Resource": "*"}]));
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));
    assert!(resolver.edges_for_role(ROLE, FUNCTION).is_empty());
}

#[test]
fn unsupported_service_is_skipped() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = roles(json!([
        {"Effect": "Allow", "Action": "kms:Decrypt", "Resource": "arn:aws:kms:us-east-1:111111111111:key/*"},
        {"Effect": "Allow", "Action": "sqs:SendMessage", "Resource": "arn:aws:sqs:us-east-1:111111111111:jobs"},
    ]));
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));
    let edges = resolver.edges_for_role(ROLE, FUNCTION);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target, "arn:aws:sqs:us-east-1:111111111111:jobs");
}

#[test]
fn unknown_role_yields_no_edges() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = RoleStore::new();
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));
    assert!(resolver.edges_for_role(ROLE, FUNCTION).is_empty());
}

#[test]
fn deny_statements_still_produce_edges() {
    let catalog = builtin_catalog();
    let index = index();
    let roles = roles(json!([{"Effect": "Deny", "Action": "sqs:*", "Resource": "arn:aws:sqs:us-east-1:111111111111:jobs"}]));
    let resolver = PolicyEdgeResolver::new(&roles, ResourceResolver::new(&catalog, &index, "aws"));
    let edges = resolver.edges_for_role(ROLE, FUNCTION);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].metadata["effect"], json!("Deny"));
}

#[test]
fn url_encoded_documents_are_decoded() {
    let document = urlencoding::encode(
        r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"s3:GetObject","Resource":["arn:aws:s3:::other-bucket/*"]}]}"#,
    )
    .into_owned();
    let mut store = RoleStore::new();
    store.insert(
        RoleRecord::from_value(&role(ROLE, json!([{"PolicyName": "encoded", "PolicyDocument": document}]))).unwrap(),
    );
    let catalog = builtin_catalog();
    let index = index();
    let resolver = PolicyEdgeResolver::new(&store, ResourceResolver::new(&catalog, &index, "aws"));
    let edges = resolver.edges_for_role(ROLE, FUNCTION);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target, "other-bucket");
}

#[test]
fn lambda_role_edges_end_to_end() {
    let store = MemoryStateStore::new();
    put(
        &store,
        ACCOUNT,
        REGION,
        "Lambda",
        "ListFunctions",
        vec![json!({"Functions": [{"FunctionArn": FUNCTION, "FunctionName": "worker", "Role": ROLE}]})],
    );
    put(
        &store,
        ACCOUNT,
        REGION,
        "S3",
        "ListBuckets",
        vec![json!({"Buckets": [{"Name": "bucket-prefix-A"}, {"Name": "unrelated"}]})],
    );
    put(
        &store,
        ACCOUNT,
        REGION,
        "IAM",
        "ListRoles",
        vec![json!({"Roles": [role(
            ROLE,
            json!([{"PolicyName": "app-access", "PolicyDocument": {"Statement": [
                {"Effect": "Allow", "Action": "s3:*", "Resource": "arn:aws:s3:::bucket-prefix-*"}
            ]}}]),
        )]})],
    );

    let catalog = builtin_catalog();
    let (graph, stats) = assemble(&store, &catalog);
    assert_eq!(stats.roles, 1);

    let edge = graph.find_edge(FUNCTION, "bucket-prefix-A").expect("policy edge");
    assert_eq!(edge.name, "app-access");
    assert!(graph.find_edge(FUNCTION, "unrelated").is_none());
    assert_eq!(graph.edges_from(FUNCTION).count(), 1);
}
