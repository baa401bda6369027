//! Workflow document schema shared across the engine, CLI, and HTTP front end.
//!
//! A workflow document is authored in YAML. Step entries are kept as raw JSON
//! maps because every action declares its own fields; the engine promotes the
//! targeting fields when it builds a plan. Input declarations preserve authoring
//! order (via `IndexMap`) so listings render them in the sequence they were written.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Input type reported when a declaration omits `type`.
pub const DEFAULT_INPUT_TYPE: &str = "text";

/// A declarative onboarding workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDocument {
    /// Optional human-readable title for listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional descriptive copy for listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inputs the operator is expected to supply, keyed by input name.
    #[serde(default, deserialize_with = "deserialize_inputs", skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, InputDeclaration>,
    /// Ordered step entries. Each entry is a mapping recognizing `action`, `name`,
    /// `resource_type`, `resource_id`, plus action-specific fields.
    #[serde(default)]
    pub steps: Vec<Map<String, Value>>,
}

/// Declares a single operator-supplied input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputDeclaration {
    /// Primitive input type used by front ends to pick a widget.
    #[serde(default = "default_input_type", rename = "type")]
    pub r#type: String,
    /// Descriptive text explaining the purpose of the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for InputDeclaration {
    fn default() -> Self {
        Self {
            r#type: default_input_type(),
            description: None,
        }
    }
}

/// Display metadata extracted from a workflow file during discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowSummary {
    pub title: String,
    pub description: String,
    /// File name relative to the workflow directory; the handle used to run it.
    pub filename: String,
    pub inputs: Vec<InputSummary>,
}

/// Name and type of a declared input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputSummary {
    pub name: String,
    pub r#type: String,
}

impl WorkflowDocument {
    /// Builds the listing summary for this document, applying the
    /// `No Title` / `No Description` defaults.
    pub fn summary(&self, filename: impl Into<String>) -> WorkflowSummary {
        WorkflowSummary {
            title: self.title.clone().unwrap_or_else(|| "No Title".to_string()),
            description: self.description.clone().unwrap_or_else(|| "No Description".to_string()),
            filename: filename.into(),
            inputs: self
                .inputs
                .iter()
                .map(|(name, declaration)| InputSummary {
                    name: name.clone(),
                    r#type: declaration.r#type.clone(),
                })
                .collect(),
        }
    }

    /// Returns the declared input names that are absent from `supplied`.
    pub fn missing_inputs<'a>(&'a self, supplied: &Map<String, Value>) -> Vec<&'a str> {
        self.inputs
            .keys()
            .filter(|name| !supplied.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

fn default_input_type() -> String {
    DEFAULT_INPUT_TYPE.to_string()
}

/// Accepts `name:` entries with no body (`null`) as default declarations.
fn deserialize_inputs<'de, D>(deserializer: D) -> Result<IndexMap<String, InputDeclaration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, Option<InputDeclaration>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, declaration)| (name, declaration.unwrap_or_default()))
        .collect())
}
