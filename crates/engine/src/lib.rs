//! # Portflow Engine
//!
//! The engine turns declarative onboarding workflows into remote changes on a
//! Port organization. A workflow is a YAML document listing steps; each step
//! names an action (`load_resource`, `add_properties_to_blueprint`, ...) and
//! the fields that action needs.
//!
//! ## Key Features
//!
//! - **Plan building**: document steps become an ordered [`ExecutionPlan`] with
//!   placeholders kept verbatim
//! - **Late resolution**: `{{ inputs.<key> }}` and `{{ steps.<name>.result }}`
//!   are resolved right before each step runs, so later steps can use earlier results
//! - **Best-effort execution**: every step runs, failures are recorded as outcomes
//!
//! ## Usage
//!
//! ```rust
//! use portflow_engine::{build_plan, execute_plan, parse_document, BlueprintUpdate, ResourceApi};
//! use portflow_api::ApiError;
//! use serde_json::{Map, Value};
//!
//! struct Offline;
//!
//! impl ResourceApi for Offline {
//!     fn fetch_blueprint(&self, id: &str) -> Result<Value, ApiError> {
//!         Ok(serde_json::json!({"blueprint": {"identifier": id}}))
//!     }
//!     fn fetch_integration(&self, id: &str) -> Result<Value, ApiError> {
//!         Ok(serde_json::json!({"integration": {"installationId": id}}))
//!     }
//!     fn update_blueprint(&self, _id: &str, payload: &Value) -> BlueprintUpdate {
//!         BlueprintUpdate::Success { data: payload.clone() }
//!     }
//! }
//!
//! let document = parse_document(
//!     "steps:\n  - action: load_resource\n    resource_type: blueprint\n    resource_id: service\n",
//!     "inline.yaml",
//! )?;
//! let report = execute_plan(build_plan(&document), &Map::new(), &Offline);
//! assert_eq!(report.outcomes[0].status.as_str(), "success");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`workflow`**: document loading and directory discovery
//! - **`model`**: [`Step`] and [`ExecutionPlan`]
//! - **`resolve`**: placeholder substitution against a [`RunContext`]
//! - **`actions`**: the closed action set and its handlers
//! - **`resource`**: the [`ResourceApi`] capability and its Port-backed adapter
//! - **`executor`**: plan building and the sequential step loop

use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

pub mod actions;
pub mod executor;
pub mod model;
pub mod resolve;
pub mod resource;
pub mod templates;
pub mod workflow;

pub use actions::{ActionKind, HandlerOutcome};
pub use executor::{ExecutionReport, OutcomeStatus, OutcomeSummary, StepOutcome, build_plan, execute_plan};
pub use model::{ExecutionPlan, Step};
pub use resolve::{RunContext, resolve_step, resolve_text, resolve_value};
pub use resource::{BlueprintUpdate, PortResourceApi, ResourceApi};
pub use workflow::{DocumentError, list_workflows, load_document, parse_document};

/// Load `filename` from `directory`, build its plan and execute it.
///
/// Only document loading can fail; step failures are reported in the report's outcomes.
pub fn run_workflow(
    directory: &Path,
    filename: &str,
    inputs: &Map<String, Value>,
    api: &dyn ResourceApi,
) -> Result<ExecutionReport, DocumentError> {
    let document = load_document(directory, filename)?;

    let missing = document.missing_inputs(inputs);
    if !missing.is_empty() {
        warn!(workflow = filename, missing = ?missing, "declared inputs were not supplied");
    }

    Ok(execute_plan(build_plan(&document), inputs, api))
}
