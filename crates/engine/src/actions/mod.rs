//! Action registry: the closed set of step actions and their handlers.
//!
//! Every handler receives one resolved [`Step`] and the [`ResourceApi`]
//! capability and returns a [`HandlerOutcome`]. Handlers never fail: remote
//! and payload problems are reported through the outcome's status.

mod blueprint_properties;
mod load_resource;
mod mock;

use std::fmt;

use serde_json::{Map, Value};

use crate::executor::OutcomeStatus;
use crate::model::Step;
use crate::resource::ResourceApi;

/// Actions a workflow step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    LoadResource,
    AddPropertiesToBlueprint,
    AddScorecardsToBlueprint,
    UpsertIntegration,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        Self::LoadResource,
        Self::AddPropertiesToBlueprint,
        Self::AddScorecardsToBlueprint,
        Self::UpsertIntegration,
    ];

    /// Parse an action name exactly as written in a workflow document.
    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == action)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadResource => "load_resource",
            Self::AddPropertiesToBlueprint => "add_properties_to_blueprint",
            Self::AddScorecardsToBlueprint => "add_scorecards_to_blueprint",
            Self::UpsertIntegration => "upsert_integration",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus action-specific payload produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub status: OutcomeStatus,
    pub payload: Map<String, Value>,
}

impl HandlerOutcome {
    pub fn new(status: OutcomeStatus) -> Self {
        Self {
            status,
            payload: Map::new(),
        }
    }

    /// Adds one payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Merges `payload` into the outcome's payload.
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload.extend(payload);
        self
    }
}

/// Run the handler for `kind` against a resolved step.
pub fn dispatch(kind: ActionKind, step: &Step, api: &dyn ResourceApi) -> HandlerOutcome {
    match kind {
        ActionKind::LoadResource => load_resource::run(step, api),
        ActionKind::AddPropertiesToBlueprint => blueprint_properties::run(step, api),
        ActionKind::AddScorecardsToBlueprint => mock::add_scorecards(step),
        ActionKind::UpsertIntegration => mock::upsert_integration(step),
    }
}
