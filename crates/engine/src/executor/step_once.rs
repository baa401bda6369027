//! Single-step execution helpers.

use tracing::{debug, warn};

use crate::actions::{ActionKind, dispatch};
use crate::model::Step;
use crate::resolve::{RunContext, resolve_step};
use crate::resource::ResourceApi;
use crate::templates::collect_unresolved_placeholders;

use super::StepOutcome;

/// Resolve `step` against `run_context` and run its handler once.
///
/// The step itself is not modified; recording the outcome is the caller's job.
/// Unknown actions produce an [`OutcomeStatus::UnknownAction`](super::OutcomeStatus::UnknownAction)
/// outcome without invoking anything.
pub fn run_step(step: &Step, run_context: &RunContext<'_>, api: &dyn ResourceApi) -> StepOutcome {
    let resolved = resolve_step(step, run_context);

    for unresolved in collect_unresolved_placeholders(&resolved) {
        warn!(
            step = resolved.step_number,
            source_path = %unresolved.source_path,
            expression = %unresolved.expression,
            "placeholder left unresolved"
        );
    }
    debug!(
        step = resolved.step_number,
        resource_type = ?resolved.resource_type,
        resource_id = ?resolved.resource_id,
        "step resolved"
    );

    match ActionKind::parse(&resolved.action) {
        Some(kind) => {
            debug!(step = resolved.step_number, action = %kind, "dispatching step");
            StepOutcome::stamp(&resolved, dispatch(kind, &resolved, api))
        }
        None => StepOutcome::unknown_action(&resolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OutcomeStatus;
    use crate::resource::testing::FakeResourceApi;
    use serde_json::{Map, json};

    fn step(action: &str, resource_type: &str, resource_id: &str) -> Step {
        Step {
            step_number: 4,
            step_name: Some("load".into()),
            action: action.into(),
            resource_type: Some(json!(resource_type)),
            resource_id: Some(json!(resource_id)),
            details: Map::new(),
            result: None,
        }
    }

    #[test]
    fn resolves_before_dispatch() {
        let api = FakeResourceApi::default().with_blueprint("checkout", json!({"blueprint": {"identifier": "checkout"}}));
        let inputs = json!({"service": "checkout"}).as_object().cloned().unwrap_or_default();
        let original = step("load_resource", "blueprint", "{{ inputs.service }}");

        let outcome = run_step(&original, &RunContext::new(&inputs, &[]), &api);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.get("resource_id"), Some(&json!("checkout")));
        assert_eq!(outcome.step_number, 4);
        assert_eq!(outcome.step_name.as_deref(), Some("load"));
    }

    #[test]
    fn unknown_action_skips_dispatch() {
        let inputs = Map::new();
        let outcome = run_step(&step("frobnicate", "blueprint", "service"), &RunContext::new(&inputs, &[]), &FakeResourceApi::default());

        assert_eq!(outcome.status, OutcomeStatus::UnknownAction);
        assert_eq!(outcome.action, "frobnicate");
        assert!(outcome.payload.is_empty());
    }
}
