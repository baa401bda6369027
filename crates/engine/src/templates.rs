//! Diagnostics for placeholders that survive resolution.

use serde_json::Value;

use crate::model::Step;

/// A `{{ ... }}` expression still present in a resolved step.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnresolvedPlaceholder {
    /// Field path where the placeholder was found, e.g. `details.properties[0].name`.
    pub source_path: String,
    /// Expression without delimiters, trimmed.
    pub expression: String,
}

/// Extracts placeholder expressions from a string value.
///
/// Returned expressions do not include `{{` or `}}` delimiters.
pub fn extract_placeholder_expressions(value: &str) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut remainder = value;

    while let Some(start) = remainder.find("{{") {
        let after_start = &remainder[start + 2..];
        let Some(end) = after_start.find("}}") else {
            break;
        };
        let expression = after_start[..end].trim();
        if !expression.is_empty() {
            expressions.push(expression.to_string());
        }
        remainder = &after_start[end + 2..];
    }

    expressions
}

/// Collects every placeholder left in the targeting fields and details of `step`.
pub fn collect_unresolved_placeholders(step: &Step) -> Vec<UnresolvedPlaceholder> {
    let mut unresolved = Vec::new();
    if let Some(resource_type) = &step.resource_type {
        collect_from_value(resource_type, "resource_type", &mut unresolved);
    }
    if let Some(resource_id) = &step.resource_id {
        collect_from_value(resource_id, "resource_id", &mut unresolved);
    }
    for (key, value) in &step.details {
        collect_from_value(value, &format!("details.{key}"), &mut unresolved);
    }
    unresolved
}

fn collect_from_value(value: &Value, source_path: &str, unresolved: &mut Vec<UnresolvedPlaceholder>) {
    match value {
        Value::String(text) => {
            unresolved.extend(extract_placeholder_expressions(text).into_iter().map(|expression| UnresolvedPlaceholder {
                source_path: source_path.to_string(),
                expression,
            }));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_from_value(item, &format!("{source_path}[{index}]"), unresolved);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                collect_from_value(item, &format!("{source_path}.{key}"), unresolved);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn extracts_trimmed_expressions() {
        assert_eq!(
            extract_placeholder_expressions("{{ inputs.service }}-{{steps.load.result}} {{ }}"),
            vec!["inputs.service".to_string(), "steps.load.result".to_string()]
        );
        assert!(extract_placeholder_expressions("{{ unterminated").is_empty());
    }

    #[test]
    fn reports_source_paths_for_nested_details() {
        let mut details = Map::new();
        details.insert(
            "properties".into(),
            json!([{"identifier": "tier", "name": "{{ inputs.label }}"}, {"identifier": "owner", "name": "Owner"}]),
        );
        let step = Step {
            step_number: 2,
            step_name: Some("addprops".into()),
            action: "add_properties_to_blueprint".into(),
            resource_type: Some(json!("blueprint")),
            resource_id: Some(json!("{{ inputs.service }}")),
            details,
            result: None,
        };

        let unresolved = collect_unresolved_placeholders(&step);

        assert_eq!(
            unresolved,
            vec![
                UnresolvedPlaceholder {
                    source_path: "resource_id".into(),
                    expression: "inputs.service".into(),
                },
                UnresolvedPlaceholder {
                    source_path: "details.properties[0].name".into(),
                    expression: "inputs.label".into(),
                },
            ]
        );
    }
}
