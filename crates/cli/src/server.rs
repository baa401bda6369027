//! HTTP front end: workflow listing and execution.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use portflow_engine::{DocumentError, ResourceApi, list_workflows, run_workflow};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

/// Shared state of the HTTP front end.
#[derive(Clone)]
pub struct AppState {
    workflows_dir: Arc<PathBuf>,
    api: Arc<dyn ResourceApi + Send + Sync>,
}

impl AppState {
    pub fn new(workflows_dir: PathBuf, api: Arc<dyn ResourceApi + Send + Sync>) -> Self {
        Self {
            workflows_dir: Arc::new(workflows_dir),
            api,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    inputs: Map<String, Value>,
}

#[derive(Debug)]
enum ServerError {
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound => (StatusCode::NOT_FOUND, "Workflow file not found".to_string()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

impl From<DocumentError> for ServerError {
    fn from(error: DocumentError) -> Self {
        if error.is_not_found() {
            return Self::NotFound;
        }
        match error {
            DocumentError::InvalidName(_) => Self::BadRequest(error.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/workflows", get(list_handler))
        .route("/execute_steps", post(execute_handler))
        .with_state(state)
}

async fn list_handler(State(state): State<AppState>) -> Result<Json<Value>, ServerError> {
    let directory = Arc::clone(&state.workflows_dir);
    let workflows = tokio::task::spawn_blocking(move || list_workflows(&directory))
        .await
        .map_err(|join_error| ServerError::Internal(join_error.to_string()))??;
    Ok(Json(json!({"workflows": workflows})))
}

async fn execute_handler(State(state): State<AppState>, Json(request): Json<ExecuteRequest>) -> Result<Json<Value>, ServerError> {
    let filename = request
        .filename
        .filter(|filename| !filename.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("filename is required".to_string()))?;

    info!(workflow = %filename, inputs = request.inputs.len(), "execution requested");
    let directory = Arc::clone(&state.workflows_dir);
    let api = Arc::clone(&state.api);
    let inputs = request.inputs;
    let report = tokio::task::spawn_blocking(move || run_workflow(&directory, &filename, &inputs, api.as_ref()))
        .await
        .map_err(|join_error| ServerError::Internal(join_error.to_string()))?
        .inspect_err(|load_error| error!(error = %load_error, "workflow could not be loaded"))?;

    Ok(Json(json!({"execution_results": report.summaries()})))
}

/// Serve the front end on `bind_address` until Ctrl-C.
pub async fn serve(bind_address: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %listener.local_addr()?, "portflow server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server terminated unexpectedly")
}
