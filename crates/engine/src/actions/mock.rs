//! Actions whose remote effect is not implemented yet.
//!
//! They still return a well-formed outcome echoing what would have been sent.

use serde_json::Value;

use super::HandlerOutcome;
use crate::executor::OutcomeStatus;
use crate::model::Step;

pub(super) fn add_scorecards(step: &Step) -> HandlerOutcome {
    HandlerOutcome::new(OutcomeStatus::Mocked)
        .with("scorecards", detail_or(step, "scorecards", Value::Array(Vec::new())))
        .with("context", detail_or(step, "blueprint_data", Value::Null))
}

pub(super) fn upsert_integration(step: &Step) -> HandlerOutcome {
    HandlerOutcome::new(OutcomeStatus::Mocked).with("integration_data", detail_or(step, "data", Value::Null))
}

fn detail_or(step: &Step, key: &str, fallback: Value) -> Value {
    step.detail(key).cloned().unwrap_or(fallback)
}
