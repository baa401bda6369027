//! Workflow document to execution plan.

use portflow_types::WorkflowDocument;
use serde_json::{Map, Value};

use crate::model::{ExecutionPlan, Step, scalar_text};

/// Keys lifted out of a step entry into dedicated [`Step`] fields.
const RESERVED_KEYS: [&str; 4] = ["action", "name", "resource_type", "resource_id"];

/// Build an ordered plan from the document's step entries.
///
/// Placeholders are kept verbatim; they are resolved only when each step runs.
/// Actions are not checked here, unknown ones surface during execution.
pub fn build_plan(document: &WorkflowDocument) -> ExecutionPlan {
    let steps = document
        .steps
        .iter()
        .enumerate()
        .map(|(index, entry)| build_step(index + 1, entry))
        .collect();

    ExecutionPlan {
        title: document.title.clone(),
        steps,
    }
}

fn build_step(step_number: usize, entry: &Map<String, Value>) -> Step {
    let details = entry
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Step {
        step_number,
        step_name: entry.get("name").and_then(scalar_text),
        action: entry.get("action").and_then(Value::as_str).unwrap_or_default().to_string(),
        resource_type: present(entry.get("resource_type")),
        resource_id: present(entry.get("resource_id")),
        details,
        result: None,
    }
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|value| !value.is_null()).cloned()
}
