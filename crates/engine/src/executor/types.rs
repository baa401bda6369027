//! Core executor data types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::HandlerOutcome;
use crate::model::Step;

/// Outcome kind of one executed step.
///
/// Wire strings are the ones existing consumers of the execution results
/// already match on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeStatus {
    /// The handler performed its remote effect.
    #[serde(rename = "success")]
    Success,
    /// The step payload was malformed; nothing was sent.
    #[serde(rename = "failed")]
    Failed,
    /// Unsupported resource type or a remote/transport failure.
    #[serde(rename = "error")]
    Error,
    /// The remote effect is intentionally not implemented.
    #[serde(rename = "mock_done_nothing")]
    Mocked,
    /// No handler exists for the step's action.
    #[serde(rename = "unknown action")]
    UnknownAction,
}

impl OutcomeStatus {
    pub const ALL: [OutcomeStatus; 5] = [Self::Success, Self::Failed, Self::Error, Self::Mocked, Self::UnknownAction];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Mocked => "mock_done_nothing",
            Self::UnknownAction => "unknown action",
        }
    }

    /// True for outcomes an operator should look at.
    pub fn needs_attention(self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::UnknownAction)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded outcome of one step, stamped with the step's identity.
///
/// Serializes as one flat mapping: the stamped fields plus the handler's
/// action-specific payload (`message`, `error`, `data`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    pub step_number: usize,
    pub step_name: Option<String>,
    pub action: String,
    pub status: OutcomeStatus,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

const STAMPED_KEYS: [&str; 4] = ["step_number", "step_name", "action", "status"];

impl StepOutcome {
    /// Stamp a handler outcome with the identity of `step`.
    ///
    /// Payload keys that collide with stamped fields are dropped so the
    /// step's own number, name and action always win.
    pub fn stamp(step: &Step, outcome: HandlerOutcome) -> Self {
        let HandlerOutcome { status, mut payload } = outcome;
        for key in STAMPED_KEYS {
            payload.remove(key);
        }
        Self {
            step_number: step.step_number,
            step_name: step.step_name.clone(),
            action: step.action.clone(),
            status,
            payload,
        }
    }

    /// Outcome for a step whose action has no handler.
    pub fn unknown_action(step: &Step) -> Self {
        Self {
            step_number: step.step_number,
            step_name: step.step_name.clone(),
            action: step.action.clone(),
            status: OutcomeStatus::UnknownAction,
            payload: Map::new(),
        }
    }

    /// Payload field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Flat JSON mapping of this outcome, as stored in `Step::result`.
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        map.insert("step_number".into(), Value::from(self.step_number));
        map.insert("step_name".into(), self.step_name.clone().map_or(Value::Null, Value::String));
        map.insert("action".into(), Value::String(self.action.clone()));
        map.insert("status".into(), Value::String(self.status.as_str().to_string()));
        Value::Object(map)
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            step_number: self.step_number,
            step_name: self.step_name.clone(),
            action: self.action.clone(),
            status: self.status,
        }
    }
}

/// Identity and status of one step, without its payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub step_number: usize,
    pub step_name: Option<String>,
    pub action: String,
    pub status: OutcomeStatus,
}
