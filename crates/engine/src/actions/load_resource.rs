use serde_json::Value;
use tracing::debug;

use super::HandlerOutcome;
use crate::executor::OutcomeStatus;
use crate::model::Step;
use crate::resource::ResourceApi;

/// Fetch the blueprint or integration named by the step's targeting fields.
pub(super) fn run(step: &Step, api: &dyn ResourceApi) -> HandlerOutcome {
    let resource_type = step.resource_type_text();
    let kind = match resource_type.as_deref() {
        Some(kind @ ("blueprint" | "integration")) => kind,
        other => {
            let shown = other.map(str::to_string).unwrap_or_else(|| display_raw(step.resource_type.as_ref()));
            return HandlerOutcome::new(OutcomeStatus::Error).with("message", format!("Unsupported resource type: {shown}"));
        }
    };

    let Some(resource_id) = step.resource_id_text() else {
        return HandlerOutcome::new(OutcomeStatus::Failed)
            .with("message", "resource_id is required to load a resource")
            .with("resource_type", kind);
    };

    debug!(step = step.step_number, resource_type = kind, resource_id = %resource_id, "loading resource");
    let fetched = if kind == "blueprint" {
        api.fetch_blueprint(&resource_id)
    } else {
        api.fetch_integration(&resource_id)
    };

    match fetched {
        Ok(data) => HandlerOutcome::new(OutcomeStatus::Success)
            .with("resource_type", kind)
            .with("resource_id", resource_id)
            .with("data", data),
        Err(error) => HandlerOutcome::new(OutcomeStatus::Error)
            .with("resource_type", kind)
            .with("resource_id", resource_id)
            .with("error", error.to_string())
            .with("details", error.details()),
    }
}

fn display_raw(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "none".to_string(),
        Some(other) => other.to_string(),
    }
}
