use serde_json::json;

use phasegrid_model::{
    DeploymentType, GraphResult, OrchestrationStrategy, PhaseStep, PhaseStepType, StepType, names,
};

use super::{RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    table.register(
        DeploymentType::Helm,
        &[
            OrchestrationStrategy::Basic,
            OrchestrationStrategy::Rolling,
            OrchestrationStrategy::MultiService,
        ],
        RulePair::new(forward, rollback),
    );
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::HelmDeploy, names::DEPLOY_CONTAINERS)
            .with_step(node(StepType::HelmDeploy, names::HELM_DEPLOY, json!({}))),
        build::verify(req, names::VERIFY_SERVICE),
        build::wrap_up(),
    ])
}

fn rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        build::rollback_step(
            PhaseStepType::HelmDeploy,
            names::DEPLOY_CONTAINERS,
            names::DEPLOY_CONTAINERS,
            node(StepType::HelmRollback, names::HELM_ROLLBACK, json!({})),
        ),
        build::rollback_verify(names::DEPLOY_CONTAINERS),
        build::rollback_wrap_up(),
    ])
}
