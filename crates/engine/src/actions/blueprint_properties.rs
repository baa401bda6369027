//! `add_properties_to_blueprint`: one PATCH adding schema and aggregation properties.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use super::HandlerOutcome;
use crate::executor::OutcomeStatus;
use crate::model::Step;
use crate::resource::{BlueprintUpdate, ResourceApi};

/// Locations of the blueprint identifier inside `blueprint_data`, tried in order.
const IDENTIFIER_POINTERS: [&str; 4] = ["/data/blueprint/identifier", "/blueprint/identifier", "/data/identifier", "/identifier"];

#[derive(Debug, Error)]
enum PayloadError {
    #[error("blueprint_data is missing")]
    MissingBlueprintData,

    #[error("blueprint_data is not valid JSON: {0}")]
    MalformedBlueprintData(#[source] serde_json::Error),

    #[error("blueprint_data must be a JSON object or a serialized JSON object, got {0}")]
    UnexpectedBlueprintData(&'static str),

    #[error("no blueprint identifier found in blueprint_data")]
    MissingIdentifier,

    #[error("'{field}' must be a list")]
    NotAList { field: &'static str },

    #[error("invalid entry {index} in '{field}': {source}")]
    InvalidEntry {
        field: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("calculationSpec of aggregation property '{identifier}' is not valid JSON: {source}")]
    MalformedCalculationSpec {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no properties or aggregationProperties to add")]
    NothingToAdd,
}

impl PayloadError {
    fn message(&self) -> &'static str {
        match self {
            Self::MissingBlueprintData | Self::MalformedBlueprintData(_) | Self::UnexpectedBlueprintData(_) => {
                "Invalid blueprint data"
            }
            Self::MissingIdentifier => "Blueprint identifier not found",
            Self::NotAList { .. } | Self::InvalidEntry { .. } | Self::MalformedCalculationSpec { .. } => "Invalid property definitions",
            Self::NothingToAdd => "Nothing to add",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    identifier: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    property_type: String,
}

#[derive(Debug, Deserialize)]
struct AggregationEntry {
    identifier: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "type")]
    property_type: String,
    target: Value,
    #[serde(rename = "calculationSpec")]
    calculation_spec: Value,
}

/// Identifier plus PATCH body for one blueprint.
#[derive(Debug)]
struct BlueprintPatch {
    identifier: String,
    properties_added: Vec<String>,
    aggregations_added: Vec<String>,
    payload: Value,
}

pub(super) fn run(step: &Step, api: &dyn ResourceApi) -> HandlerOutcome {
    let patch = match build_patch(step) {
        Ok(patch) => patch,
        Err(error) => {
            return HandlerOutcome::new(OutcomeStatus::Failed)
                .with("message", error.message())
                .with("error", error.to_string());
        }
    };

    debug!(
        step = step.step_number,
        blueprint = %patch.identifier,
        properties = patch.properties_added.len(),
        aggregations = patch.aggregations_added.len(),
        "updating blueprint"
    );
    match api.update_blueprint(&patch.identifier, &patch.payload) {
        BlueprintUpdate::Success { data } => HandlerOutcome::new(OutcomeStatus::Success)
            .with("blueprint", patch.identifier)
            .with("properties_added", patch.properties_added)
            .with("aggregations_added", patch.aggregations_added)
            .with("data", data),
        BlueprintUpdate::Error { error, details } => HandlerOutcome::new(OutcomeStatus::Error)
            .with("error", error)
            .with("details", details),
    }
}

fn build_patch(step: &Step) -> Result<BlueprintPatch, PayloadError> {
    let blueprint_data = parse_blueprint_data(step.detail("blueprint_data"))?;
    let identifier = IDENTIFIER_POINTERS
        .iter()
        .find_map(|pointer| {
            blueprint_data
                .pointer(pointer)
                .and_then(Value::as_str)
                .filter(|identifier| !identifier.is_empty())
        })
        .ok_or(PayloadError::MissingIdentifier)?
        .to_string();

    let mut properties = Map::new();
    for (index, entry) in entry_list(step, "properties")?.iter().enumerate() {
        let entry: PropertyEntry = parse_entry("properties", index, entry)?;
        let title = entry.name.unwrap_or_else(|| entry.identifier.clone());
        properties.insert(entry.identifier, json!({"title": title, "type": entry.property_type}));
    }

    let mut aggregations = Map::new();
    for (index, entry) in entry_list(step, "aggregationProperties")?.iter().enumerate() {
        let entry: AggregationEntry = parse_entry("aggregationProperties", index, entry)?;
        let calculation_spec = parse_calculation_spec(&entry.identifier, entry.calculation_spec)?;
        let title = entry.title.unwrap_or_else(|| entry.identifier.clone());
        aggregations.insert(
            entry.identifier,
            json!({
                "title": title,
                "type": entry.property_type,
                "target": entry.target,
                "calculationSpec": calculation_spec,
            }),
        );
    }

    if properties.is_empty() && aggregations.is_empty() {
        return Err(PayloadError::NothingToAdd);
    }

    let properties_added = properties.keys().cloned().collect();
    let aggregations_added = aggregations.keys().cloned().collect();
    let payload = json!({
        "identifier": identifier,
        "schema": {"properties": properties},
        "aggregationProperties": aggregations,
    });

    Ok(BlueprintPatch {
        identifier,
        properties_added,
        aggregations_added,
        payload,
    })
}

fn parse_blueprint_data(raw: Option<&Value>) -> Result<Value, PayloadError> {
    match raw {
        None | Some(Value::Null) => Err(PayloadError::MissingBlueprintData),
        Some(Value::String(text)) if text.trim().is_empty() => Err(PayloadError::MissingBlueprintData),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text).map_err(PayloadError::MalformedBlueprintData)? {
            parsed @ Value::Object(_) => Ok(parsed),
            other => Err(PayloadError::UnexpectedBlueprintData(json_kind(&other))),
        },
        Some(object @ Value::Object(_)) => Ok(object.clone()),
        Some(other) => Err(PayloadError::UnexpectedBlueprintData(json_kind(other))),
    }
}

fn entry_list<'a>(step: &'a Step, field: &'static str) -> Result<&'a [Value], PayloadError> {
    match step.detail(field) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(entries)) => Ok(entries.as_slice()),
        Some(_) => Err(PayloadError::NotAList { field }),
    }
}

fn parse_entry<T: for<'de> Deserialize<'de>>(field: &'static str, index: usize, entry: &Value) -> Result<T, PayloadError> {
    serde_json::from_value(entry.clone()).map_err(|source| PayloadError::InvalidEntry { field, index, source })
}

fn parse_calculation_spec(identifier: &str, raw: Value) -> Result<Value, PayloadError> {
    match raw {
        Value::String(text) => serde_json::from_str(&text).map_err(|source| PayloadError::MalformedCalculationSpec {
            identifier: identifier.to_string(),
            source,
        }),
        other => Ok(other),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
