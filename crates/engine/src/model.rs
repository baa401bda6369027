//! # Execution Plan Model
//!
//! A plan is the ordered list of [`Step`]s built from one workflow document.
//! Steps keep their authored text verbatim, placeholders included; the
//! executor resolves a copy of each step immediately before it runs and writes
//! the handler's outcome back into [`Step::result`].
//!
//! ```rust
//! use portflow_engine::model::{ExecutionPlan, Step};
//! use serde_json::json;
//!
//! let plan = ExecutionPlan {
//!     title: Some("Service onboarding".into()),
//!     steps: vec![Step {
//!         step_number: 1,
//!         step_name: Some("load service".into()),
//!         action: "load_resource".into(),
//!         resource_type: Some(json!("blueprint")),
//!         resource_id: Some(json!("{{ inputs.service }}")),
//!         details: Default::default(),
//!         result: None,
//!     }],
//! };
//! assert_eq!(plan.steps[0].resource_type_text().as_deref(), Some("blueprint"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One declarative instruction of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// 1-based position in the document, assigned when the plan is built.
    pub step_number: usize,
    /// Optional label from the document's `name` field.
    ///
    /// Names are the join key for `{{ steps.<name>.result }}` placeholders.
    /// They are not required to be unique; lookups return the first match.
    #[serde(default)]
    pub step_name: Option<String>,
    /// Action name as authored. Kept as text so unknown actions survive until execution.
    pub action: String,
    /// Kind of remote resource the step targets (for example `blueprint`).
    #[serde(default)]
    pub resource_type: Option<Value>,
    /// Identifier of the targeted resource.
    #[serde(default)]
    pub resource_id: Option<Value>,
    /// Every other declared field (property lists, scorecards, serialized data, ...).
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Stamped outcome of the step's handler; unset until the handler has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Step {
    /// `resource_type` rendered as text, when it is a scalar.
    pub fn resource_type_text(&self) -> Option<String> {
        self.resource_type.as_ref().and_then(scalar_text)
    }

    /// `resource_id` rendered as text, when it is a scalar.
    pub fn resource_id_text(&self) -> Option<String> {
        self.resource_id.as_ref().and_then(scalar_text)
    }

    /// Looks up a field in `details`.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Ordered steps built from one document; consumed by a single execution run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlan {
    /// Title of the source document, carried for reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub steps: Vec<Step>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Renders strings verbatim and numbers/booleans via `Display`; composites and null yield `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step_with_targets(resource_type: Value, resource_id: Value) -> Step {
        Step {
            step_number: 1,
            step_name: None,
            action: "load_resource".into(),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
            details: Map::new(),
            result: None,
        }
    }

    #[test]
    fn numeric_identifiers_render_as_text() {
        let step = step_with_targets(json!("integration"), json!(53367788));
        assert_eq!(step.resource_id_text().as_deref(), Some("53367788"));
    }

    #[test]
    fn composite_targets_are_not_text() {
        let step = step_with_targets(json!({"kind": "blueprint"}), Value::Null);
        assert_eq!(step.resource_type_text(), None);
        assert_eq!(step.resource_id_text(), None);
    }

    #[test]
    fn unset_result_is_not_serialized() {
        let step = step_with_targets(json!("blueprint"), json!("service"));
        let rendered = serde_json::to_value(&step).expect("serialize step");
        assert!(rendered.get("result").is_none());
        assert_eq!(rendered["step_number"], 1);
    }
}
