//! Custom deployment types and build workflows. Neither has a node that can
//! be undone, so their rollback is verification and wrap-up only.

use serde_json::json;

use phasegrid_model::{
    DeploymentType, GraphResult, OrchestrationStrategy, PhaseStep, PhaseStepType, StepType, names,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    let custom = RulePair::new(forward, rollback);
    table.register(DeploymentType::Custom, NON_BLUE_GREEN, custom);
    table.register(DeploymentType::Custom, BLUE_GREEN, custom);

    let collect = RulePair::new(build_forward, build_rollback);
    for dt in DeploymentType::ALL {
        table.register(dt, &[OrchestrationStrategy::Build], collect);
    }
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::CustomDeploymentPhaseStep, names::DEPLOY).with_step(node(
            StepType::CustomDeploymentFetchInstances,
            names::FETCH_INSTANCES,
            json!({ "stateTimeoutInMinutes": 1 }),
        )),
        build::verify(req, names::VERIFY_SERVICE),
        build::wrap_up(),
    ])
}

fn rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![build::rollback_verify(names::DEPLOY), build::rollback_wrap_up()])
}

fn build_forward(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        build::prepare_steps(),
        step(PhaseStepType::CollectArtifact, names::COLLECT_ARTIFACT).with_step(node(
            StepType::ArtifactCollection,
            names::ARTIFACT_COLLECTION,
            json!({}),
        )),
        build::wrap_up(),
    ])
}

fn build_rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        build::rollback_verify(names::COLLECT_ARTIFACT),
        build::rollback_wrap_up(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_fetches_instances() {
        let req = PhaseRequest::new(DeploymentType::Custom, OrchestrationStrategy::Canary);
        let steps = forward(&req).unwrap();
        assert_eq!(steps[0].steps[0].step_type, StepType::CustomDeploymentFetchInstances);
        assert_eq!(steps[0].steps[0].property("stateTimeoutInMinutes"), Some(&json!(1)));
        assert_eq!(rollback(&req).unwrap().len(), 2);
    }

    #[test]
    fn build_collects_artifact() {
        let req = PhaseRequest::new(DeploymentType::Ssh, OrchestrationStrategy::Build);
        let steps = build_forward(&req).unwrap();
        assert_eq!(steps[1].steps[0].step_type, StepType::ArtifactCollection);
        assert_eq!(steps.last().unwrap().phase_step_type, PhaseStepType::WrapUp);
    }
}
