//! Lambda and CodeDeploy share one shape: prepare, deploy, verify.

use serde_json::{Map, Value};

use phasegrid_model::{
    DeploymentType, GraphResult, Node, OrchestrationStrategy, PhaseStep, PhaseStepType, StepType,
    names,
};

use super::{RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

use OrchestrationStrategy::{Basic, Canary, MultiService};

pub(super) fn register(table: &mut RuleTable) {
    table.register(
        DeploymentType::AwsLambda,
        &[Basic, Canary, MultiService],
        RulePair::new(lambda_forward, lambda_rollback),
    );
    table.register(
        DeploymentType::AwsCodedeploy,
        &[Basic, Canary, MultiService],
        RulePair::new(codedeploy_forward, codedeploy_rollback),
    );
}

fn deploy_shape(req: &PhaseRequest, kind: PhaseStepType, state: Node) -> Vec<PhaseStep> {
    vec![
        build::prepare_steps(),
        step(kind, names::DEPLOY_SERVICE).with_step(state),
        build::verify(req, names::VERIFY_SERVICE),
        build::wrap_up(),
    ]
}

fn rollback_shape(kind: PhaseStepType, state: Node) -> Vec<PhaseStep> {
    vec![
        build::rollback_step(kind, names::DEPLOY_SERVICE, names::DEPLOY_SERVICE, state),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ]
}

fn lambda_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(deploy_shape(
        req,
        PhaseStepType::DeployAwsLambda,
        Node::new(StepType::AwsLambdaState, names::AWS_LAMBDA),
    ))
}

fn lambda_rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(rollback_shape(
        PhaseStepType::DeployAwsLambda,
        Node::new(StepType::AwsLambdaRollback, names::ROLLBACK_AWS_LAMBDA),
    ))
}

/// Non-blank S3 defaults become node properties.
fn codedeploy_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let defaults = &req.state_defaults;
    let mut properties = Map::new();
    for (key, value) in [
        ("bucket", &defaults.bucket),
        ("key", &defaults.key),
        ("bundleType", &defaults.bundle_type),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            properties.insert(key.to_string(), Value::from(value));
        }
    }
    Ok(deploy_shape(
        req,
        PhaseStepType::DeployAwsCodedeploy,
        node(StepType::AwsCodedeployState, names::AWS_CODEDEPLOY, Value::Object(properties)),
    ))
}

fn codedeploy_rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(rollback_shape(
        PhaseStepType::DeployAwsCodedeploy,
        Node::new(StepType::AwsCodedeployRollback, names::ROLLBACK_AWS_CODEDEPLOY),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::StateDefaults;

    #[test]
    fn codedeploy_keeps_non_blank_defaults() {
        let req = PhaseRequest::new(DeploymentType::AwsCodedeploy, Basic).with_state_defaults(
            StateDefaults {
                bucket: Some("artifacts".into()),
                key: Some(" ".into()),
                bundle_type: None,
            },
        );
        let steps = codedeploy_forward(&req).unwrap();
        assert_eq!(steps[0].phase_step_type, PhaseStepType::PrepareSteps);
        let state = &steps[1].steps[0];
        assert_eq!(state.str_property("bucket"), Some("artifacts"));
        assert_eq!(state.properties.len(), 1);
    }

    #[test]
    fn lambda_rollback_undoes_deploy_service() {
        let req = PhaseRequest::new(DeploymentType::AwsLambda, Canary);
        let rollback = lambda_rollback(&req).unwrap();
        assert_eq!(rollback[0].steps[0].step_type, StepType::AwsLambdaRollback);
        assert_eq!(
            rollback[0].phase_step_name_for_rollback.as_deref(),
            Some(names::DEPLOY_SERVICE)
        );
    }
}
