use fleet_gateway::handlers::service_logs::LOGS_NOT_FOUND;
use fleet_gateway::handlers::{apply_service, cluster_status, service_logs};
use fleet_gateway::k8s::upsert_service;
use fleet_gateway::service::{ServiceLabels, ServiceName, ServiceRecord};
use fleet_telemetry::init_test_tracing;
use serde_json::{Value, json};
use std::sync::atomic::Ordering;

mod support;

use support::mock::MockServiceApi;

fn apply_payload(name: &str, replicas: i32) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "service": {
            "name": name,
            "labels": {"app": name.to_lowercase()},
            "replicas": replicas,
            "flavor": "small",
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn apply_on_a_fresh_name_takes_the_create_path() {
    init_test_tracing();
    let mock = MockServiceApi::new();

    let response = apply_service::run(&mock, &apply_payload("Web", 2))
        .await
        .unwrap();
    let stored: Value = serde_json::from_str(&response).unwrap();

    assert_eq!(stored["metadata"]["name"], "web");
    assert_eq!(stored["metadata"]["resourceVersion"], "1");
    assert_eq!(stored["spec"]["replicas"], 2);
    assert_eq!(mock.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.replace_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn applying_twice_updates_instead_of_duplicating() {
    init_test_tracing();
    let mock = MockServiceApi::new();

    let first: Value = serde_json::from_str(
        &apply_service::run(&mock, &apply_payload("Web", 2))
            .await
            .unwrap(),
    )
    .unwrap();
    let second: Value = serde_json::from_str(
        &apply_service::run(&mock, &apply_payload("Web", 4))
            .await
            .unwrap(),
    )
    .unwrap();

    // Same resource, advanced concurrency token, updated spec.
    assert_eq!(second["metadata"]["name"], first["metadata"]["name"]);
    assert_eq!(first["metadata"]["resourceVersion"], "1");
    assert_eq!(second["metadata"]["resourceVersion"], "2");
    assert_eq!(second["spec"]["replicas"], 4);

    assert_eq!(mock.create_calls.load(Ordering::SeqCst), 2);
    assert_eq!(mock.replace_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.services.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn upsert_carries_the_token_fetched_before_the_replace() {
    init_test_tracing();
    let mock = MockServiceApi::new();

    let record = ServiceRecord {
        name: "web".to_owned(),
        labels: ServiceLabels {
            app: "web".to_owned(),
        },
        replicas: 1,
        flavor: "small".to_owned(),
        version: String::new(),
        tags: vec![],
        env: vec![],
    };
    let name = ServiceName::parse(&record.name).unwrap();

    upsert_service(&mock, record.to_resource(&name)).await.unwrap();
    // The second candidate has no token of its own; the mock refuses any
    // replace without the current one, so success proves it was fetched.
    let stored = upsert_service(&mock, record.to_resource(&name)).await.unwrap();

    assert_eq!(stored.metadata.resource_version.as_deref(), Some("2"));
}

#[tokio::test]
async fn logs_pick_the_first_pod_matching_the_service_prefix() {
    init_test_tracing();
    let mock = MockServiceApi::with_pods(&[("svca-7f9", "log of svca"), ("svcb-1", "log of svcb")]);

    let payload = serde_json::to_vec(&json!({"serviceName": "svcA"})).unwrap();
    let response = service_logs::run(&mock, &payload).await.unwrap();

    assert_eq!(response, "log of svca");
}

#[tokio::test]
async fn logs_answer_with_a_sentinel_when_no_pod_matches() {
    init_test_tracing();
    let mock = MockServiceApi::with_pods(&[("svcb-1", "log of svcb")]);

    let payload = serde_json::to_vec(&json!({"serviceName": "svcA"})).unwrap();
    let response = service_logs::run(&mock, &payload).await.unwrap();

    assert_eq!(response, LOGS_NOT_FOUND);
}

#[tokio::test]
async fn status_reports_the_node_list() {
    init_test_tracing();
    let mock = MockServiceApi {
        nodes: vec!["node-1".to_owned(), "node-2".to_owned()],
        ..MockServiceApi::new()
    };

    let response = cluster_status::run(&mock, b"").await.unwrap();
    let parsed: Value = serde_json::from_str(&response).unwrap();

    let items = parsed["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["metadata"]["name"], "node-1");
}
