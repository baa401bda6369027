//! Placeholder resolution against workflow inputs and prior step results.
//!
//! Two grammars are recognized, applied in fixed order:
//!
//! 1. `{{ inputs.<key> }}` where `<key>` is word characters and spaces.
//! 2. `{{ steps.<name>.result }}` where `<name>` is ASCII letters, digits, `_` and spaces.
//!
//! Resolution is textual. Resolved values are rendered as strings (composite
//! values as compact JSON) and placeholders that cannot be satisfied are left
//! byte-for-byte unchanged so they stay visible downstream.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::model::Step;

static INPUT_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*inputs\.\s*([\w\s]+)\}\}").expect("input placeholder pattern"));

static STEP_RESULT_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*steps\.([A-Za-z0-9_ ]+)\.result\s*\}\}").expect("step result placeholder pattern"));

/// Borrowed view of one run's state used while resolving a step.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    /// Caller-supplied workflow inputs.
    pub inputs: &'a Map<String, Value>,
    /// The plan's steps as they stand, earlier results included.
    pub steps: &'a [Step],
}

impl<'a> RunContext<'a> {
    pub fn new(inputs: &'a Map<String, Value>, steps: &'a [Step]) -> Self {
        Self { inputs, steps }
    }

    /// First step whose name equals `name`.
    pub fn find_step(&self, name: &str) -> Option<&'a Step> {
        self.steps.iter().find(|step| step.step_name.as_deref() == Some(name))
    }

    fn input_text(&self, key: &str) -> Option<String> {
        match self.inputs.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_text(value)),
        }
    }

    fn step_result_text(&self, name: &str) -> Option<String> {
        let result = self.find_step(name)?.result.as_ref()?;
        if is_empty_result(result) {
            return None;
        }
        Some(value_text(result))
    }
}

/// Resolve both placeholder grammars in `text`, inputs first.
pub fn resolve_text(text: &str, context: &RunContext<'_>) -> String {
    if text.is_empty() || !text.contains("{{") {
        return text.to_string();
    }

    let with_inputs = INPUT_PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        let key = caps[1].trim();
        context.input_text(key).unwrap_or_else(|| caps[0].to_string())
    });

    STEP_RESULT_PLACEHOLDER
        .replace_all(&with_inputs, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            context.step_result_text(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Resolve every string inside `value`, descending into arrays and objects.
///
/// Non-string scalars are returned unchanged.
pub fn resolve_value(value: &Value, context: &RunContext<'_>) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_text(text, context)),
        Value::Array(items) => Value::Array(items.iter().map(|item| resolve_value(item, context)).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(key, item)| (key.clone(), resolve_value(item, context))).collect()),
        other => other.clone(),
    }
}

/// Produce a resolved copy of `step`; the original is left untouched.
///
/// `resource_type`, `resource_id` and all `details` values are resolved.
/// `step_name`, `action` and `result` are copied as-is.
pub fn resolve_step(step: &Step, context: &RunContext<'_>) -> Step {
    Step {
        step_number: step.step_number,
        step_name: step.step_name.clone(),
        action: step.action.clone(),
        resource_type: step.resource_type.as_ref().map(|value| resolve_value(value, context)),
        resource_id: step.resource_id.as_ref().map(|value| resolve_value(value, context)),
        details: step
            .details
            .iter()
            .map(|(key, value)| (key.clone(), resolve_value(value, context)))
            .collect(),
        result: step.result.clone(),
    }
}

/// Strings verbatim, everything else as compact JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
