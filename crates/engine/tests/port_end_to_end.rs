use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use portflow_api::{Credentials, PortClient};
use portflow_engine::{OutcomeStatus, PortResourceApi, run_workflow};
use serde_json::{Map, Value, json};

#[derive(Clone, Default)]
struct MockPort {
    patches: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn issue_token(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["clientId"] == "id" && body["clientSecret"] == "secret" {
        (StatusCode::OK, Json(json!({"accessToken": "token"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"ok": false})))
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) == Some("Bearer token")
}

async fn blueprint(Path(id): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"ok": false})));
    }
    if id != "service" {
        return (StatusCode::NOT_FOUND, Json(json!({"ok": false, "error": "not_found"})));
    }
    (StatusCode::OK, Json(json!({"ok": true, "blueprint": {"identifier": "service", "title": "Service"}})))
}

async fn patch_blueprint(
    State(state): State<MockPort>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"ok": false})));
    }
    if body["schema"]["properties"].get("invalid").is_some() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"ok": false, "error": "invalid_property"})));
    }
    state.patches.lock().expect("patch log").push((id.clone(), body.clone()));
    (StatusCode::OK, Json(json!({"ok": true, "blueprint": {"identifier": id}})))
}

async fn spawn_mock_port(state: MockPort) -> SocketAddr {
    let router = Router::new()
        .route("/v1/auth/access_token", post(issue_token))
        .route("/v1/blueprints/{id}", get(blueprint).patch(patch_blueprint))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
    let address = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    address
}

const WORKFLOW: &str = r#"
title: Service tier
steps:
  - action: load_resource
    name: load service
    resource_type: blueprint
    resource_id: "{{ inputs.service }}"
  - action: add_properties_to_blueprint
    name: addprops
    blueprint_data: "{{ steps.load service.result }}"
    properties:
      - identifier: "{{ inputs.property }}"
        name: Tier
        type: string
"#;

async fn run_against(address: SocketAddr, inputs: Value) -> portflow_engine::ExecutionReport {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp_dir.path().join("tier.yaml"), WORKFLOW).expect("write workflow");
    let client = PortClient::new(format!("http://{address}/v1"), Some(Credentials::new("id", "secret"))).expect("client");
    let api = PortResourceApi::new(client);
    let inputs: Map<String, Value> = inputs.as_object().cloned().unwrap_or_default();

    tokio::task::spawn_blocking(move || run_workflow(temp_dir.path(), "tier.yaml", &inputs, &api))
        .await
        .expect("blocking task")
        .expect("run workflow")
}

#[tokio::test(flavor = "multi_thread")]
async fn loads_blueprint_and_patches_properties() {
    let state = MockPort::default();
    let address = spawn_mock_port(state.clone()).await;

    let report = run_against(address, json!({"service": "service", "property": "tier"})).await;

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
    assert_eq!(report.outcomes[0].get("data").map(|data| data["blueprint"]["title"].clone()), Some(json!("Service")));
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
    let patches = state.patches.lock().expect("patch log");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, "service");
    assert_eq!(patches[0].1["schema"]["properties"]["tier"], json!({"title": "Tier", "type": "string"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_failures_are_recorded_per_step() {
    let state = MockPort::default();
    let address = spawn_mock_port(state.clone()).await;

    let report = run_against(address, json!({"service": "service", "property": "invalid"})).await;

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
    let rejected = &report.outcomes[1];
    assert_eq!(rejected.status, OutcomeStatus::Error);
    assert_eq!(rejected.get("details"), Some(&json!({"ok": false, "error": "invalid_property"})));
    assert!(state.patches.lock().expect("patch log").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_blueprint_is_an_error_outcome() {
    let address = spawn_mock_port(MockPort::default()).await;

    let report = run_against(address, json!({"service": "ghost", "property": "tier"})).await;

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Error);
    assert_eq!(report.outcomes[0].get("details"), Some(&json!({"ok": false, "error": "not_found"})));
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
}
