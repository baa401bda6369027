//! Execution engine: runs a plan's steps strictly in order and records each
//! outcome back into the plan.
//!
//! - `planning::build_plan` turns a workflow document into an [`ExecutionPlan`]
//! - `step_once::run_step` resolves one step and dispatches it to its handler
//! - [`execute_plan`] drives the loop, never stopping on a failed step

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::model::ExecutionPlan;
use crate::resolve::RunContext;
use crate::resource::ResourceApi;

pub mod planning;
pub mod step_once;
mod types;

pub use planning::build_plan;
pub use step_once::run_step;
pub use types::{OutcomeStatus, OutcomeSummary, StepOutcome};

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Title of the executed workflow, when it declares one.
    pub title: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One outcome per step, in execution order.
    pub outcomes: Vec<StepOutcome>,
    /// The completed plan. Steps keep their unresolved text; known actions carry their `result`.
    pub plan: ExecutionPlan,
}

impl ExecutionReport {
    /// `{step_number, step_name, action, status}` for every outcome.
    pub fn summaries(&self) -> Vec<OutcomeSummary> {
        self.outcomes.iter().map(StepOutcome::summary).collect()
    }

    /// Number of outcomes per status.
    pub fn counts(&self) -> BTreeMap<OutcomeStatus, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.status).or_insert(0) += 1;
        }
        counts
    }

    /// Outcome recorded for `step_number`.
    pub fn outcome(&self, step_number: usize) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|outcome| outcome.step_number == step_number)
    }
}

/// Execute every step of `plan` in `step_number` order.
///
/// Each step is resolved against `inputs` and the results recorded so far,
/// then dispatched. Failures never stop the run; they are reported in that
/// step's outcome. Outcomes of known actions are stored as the step's `result`
/// so later `{{ steps.<name>.result }}` placeholders can use them.
pub fn execute_plan(mut plan: ExecutionPlan, inputs: &Map<String, Value>, api: &dyn ResourceApi) -> ExecutionReport {
    let started_at = Utc::now();
    let title = plan.title.clone();
    plan.steps.sort_by_key(|step| step.step_number);

    info!(
        workflow = title.as_deref().unwrap_or("untitled"),
        step_count = plan.len(),
        "workflow execution started"
    );

    let mut outcomes = Vec::with_capacity(plan.len());
    for index in 0..plan.steps.len() {
        let outcome = {
            let run_context = RunContext::new(inputs, &plan.steps);
            run_step(&plan.steps[index], &run_context, api)
        };

        if outcome.status.needs_attention() {
            warn!(
                step = outcome.step_number,
                name = outcome.step_name.as_deref().unwrap_or(""),
                action = %outcome.action,
                status = %outcome.status,
                "step did not succeed"
            );
        } else {
            info!(
                step = outcome.step_number,
                name = outcome.step_name.as_deref().unwrap_or(""),
                action = %outcome.action,
                status = %outcome.status,
                "step finished"
            );
        }

        if outcome.status != OutcomeStatus::UnknownAction {
            plan.steps[index].result = Some(outcome.to_value());
        }
        outcomes.push(outcome);
    }

    let report = ExecutionReport {
        title,
        started_at,
        finished_at: Utc::now(),
        outcomes,
        plan,
    };

    let counts = report.counts();
    let count_of = |status: OutcomeStatus| counts.get(&status).copied().unwrap_or(0);
    info!(
        workflow = report.title.as_deref().unwrap_or("untitled"),
        step_count = report.outcomes.len(),
        succeeded = count_of(OutcomeStatus::Success),
        mocked = count_of(OutcomeStatus::Mocked),
        failed = count_of(OutcomeStatus::Failed),
        errored = count_of(OutcomeStatus::Error),
        unknown = count_of(OutcomeStatus::UnknownAction),
        "workflow execution finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Step;
    use crate::resource::testing::FakeResourceApi;
    use serde_json::json;

    fn step(step_number: usize, name: Option<&str>, action: &str, details: Value) -> Step {
        Step {
            step_number,
            step_name: name.map(str::to_string),
            action: action.into(),
            resource_type: None,
            resource_id: None,
            details: details.as_object().cloned().unwrap_or_default(),
            result: None,
        }
    }

    fn load(step_number: usize, name: &str, resource_type: &str, resource_id: &str) -> Step {
        Step {
            resource_type: Some(json!(resource_type)),
            resource_id: Some(json!(resource_id)),
            ..step(step_number, Some(name), "load_resource", json!({}))
        }
    }

    #[test]
    fn unknown_action_does_not_stop_the_run() {
        let plan = ExecutionPlan {
            title: None,
            steps: vec![
                step(1, None, "frobnicate", json!({})),
                step(2, Some("echo"), "upsert_integration", json!({"data": {"installationId": "1"}})),
            ],
        };

        let report = execute_plan(plan, &Map::new(), &FakeResourceApi::default());

        let statuses: Vec<OutcomeStatus> = report.outcomes.iter().map(|outcome| outcome.status).collect();
        assert_eq!(statuses, vec![OutcomeStatus::UnknownAction, OutcomeStatus::Mocked]);
        assert!(report.plan.steps[0].result.is_none());
        assert_eq!(report.plan.steps[1].result.as_ref().map(|result| result["status"].clone()), Some(json!("mock_done_nothing")));
    }

    #[test]
    fn unsupported_resource_type_is_isolated_to_its_step() {
        let api = FakeResourceApi::default().with_blueprint("service", json!({"blueprint": {"identifier": "service"}}));
        let plan = ExecutionPlan {
            title: None,
            steps: vec![load(1, "widget", "widget", "w1"), load(2, "service", "blueprint", "service")],
        };

        let report = execute_plan(plan, &Map::new(), &api);

        assert_eq!(report.outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(report.outcomes[0].get("message"), Some(&json!("Unsupported resource type: widget")));
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
    }

    #[test]
    fn later_steps_see_earlier_results() {
        let api = FakeResourceApi::default().with_blueprint("service", json!({"ok": true, "blueprint": {"identifier": "service"}}));
        let plan = ExecutionPlan {
            title: Some("props".into()),
            steps: vec![
                load(1, "load service", "blueprint", "{{ inputs.blueprint }}"),
                step(
                    2,
                    Some("addprops"),
                    "add_properties_to_blueprint",
                    json!({
                        "blueprint_data": "{{ steps.load service.result }}",
                        "properties": [{"identifier": "tier", "name": "Tier", "type": "string"}]
                    }),
                ),
            ],
        };
        let inputs = json!({"blueprint": "service"}).as_object().cloned().unwrap_or_default();

        let report = execute_plan(plan, &inputs, &api);

        assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
        assert_eq!(api.updates.borrow()[0].0, "service");
        assert_eq!(
            report.plan.steps[1].details["blueprint_data"],
            json!("{{ steps.load service.result }}"),
            "plan keeps the authored text"
        );
    }

    #[test]
    fn steps_run_in_step_number_order() {
        let plan = ExecutionPlan {
            title: None,
            steps: vec![
                step(2, Some("second"), "upsert_integration", json!({"data": "{{ steps.first.result }}"})),
                step(1, Some("first"), "upsert_integration", json!({"data": "one"})),
            ],
        };

        let report = execute_plan(plan, &Map::new(), &FakeResourceApi::default());

        assert_eq!(report.outcomes[0].step_number, 1);
        let echoed = report.outcomes[1].get("integration_data").and_then(Value::as_str).unwrap_or_default();
        let embedded: Value = serde_json::from_str(echoed).expect("embedded result is JSON");
        assert_eq!(embedded["integration_data"], "one");
        assert_eq!(embedded["step_name"], "first");
    }

    #[test]
    fn summaries_and_counts_cover_every_step() {
        let plan = ExecutionPlan {
            title: None,
            steps: vec![
                step(1, None, "frobnicate", json!({})),
                step(2, Some("cards"), "add_scorecards_to_blueprint", json!({"scorecards": []})),
                step(3, None, "upsert_integration", json!({})),
            ],
        };

        let report = execute_plan(plan, &Map::new(), &FakeResourceApi::default());

        assert_eq!(
            serde_json::to_value(report.summaries()).expect("serialize summaries"),
            json!([
                {"step_number": 1, "step_name": null, "action": "frobnicate", "status": "unknown action"},
                {"step_number": 2, "step_name": "cards", "action": "add_scorecards_to_blueprint", "status": "mock_done_nothing"},
                {"step_number": 3, "step_name": null, "action": "upsert_integration", "status": "mock_done_nothing"}
            ])
        );
        assert_eq!(report.counts().get(&OutcomeStatus::Mocked), Some(&2));
        assert!(report.started_at <= report.finished_at);
        assert_eq!(report.outcome(2).map(|outcome| outcome.action.as_str()), Some("add_scorecards_to_blueprint"));
    }
}
