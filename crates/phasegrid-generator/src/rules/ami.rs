use serde_json::json;

use phasegrid_model::{
    names, DeploymentType, GraphResult, InfrastructureKind, OrchestrationStrategy, PhaseStep,
    PhaseStepType, StepType,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable, spotinst};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    table.register(DeploymentType::Ami, NON_BLUE_GREEN, RulePair::new(forward, rollback));
    table.register(
        DeploymentType::Ami,
        BLUE_GREEN,
        RulePair::new(blue_green_forward, blue_green_rollback),
    );
}

fn autoscaling_setup(req: &PhaseRequest, blue_green: bool) -> Option<PhaseStep> {
    if !req.service_setup_required || !req.infra.is(InfrastructureKind::is_ami) {
        return None;
    }
    Some(
        step(PhaseStepType::AmiAutoscalingGroupSetup, names::SETUP_AUTOSCALING_GROUP).with_step(
            node(
                StepType::AwsAmiServiceSetup,
                names::AWS_AUTOSCALING_GROUP_SETUP,
                json!({
                    "maxInstances": 10,
                    "autoScalingSteadyStateTimeout": 10,
                    "blueGreen": blue_green,
                }),
            ),
        ),
    )
}

fn deploy(kind: StepType, name: &str) -> PhaseStep {
    step(PhaseStepType::AmiDeployAutoscalingGroup, names::DEPLOY_SERVICE)
        .with_step(node(kind, name, json!({})))
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.infra.is_spotinst() {
        return spotinst::forward(req);
    }
    let mut steps = Vec::new();
    if req.dynamic_infra && req.strategy == OrchestrationStrategy::Basic {
        steps.push(build::provision_infrastructure());
    }
    steps.extend(autoscaling_setup(req, false));
    steps.push(deploy(StepType::AwsAmiServiceDeploy, names::UPGRADE_AUTOSCALING_GROUP));
    steps.push(build::verify(req, names::VERIFY_SERVICE));
    steps.push(build::wrap_up());
    Ok(steps)
}

fn rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.infra.is_spotinst() {
        return spotinst::rollback(req);
    }
    Ok(vec![
        build::rollback_step(
            PhaseStepType::AmiDeployAutoscalingGroup,
            names::ROLLBACK_SERVICE,
            names::DEPLOY_SERVICE,
            node(StepType::AwsAmiServiceRollback, names::ROLLBACK_AUTOSCALING_GROUP, json!({})),
        ),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

fn blue_green_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.infra.is_spotinst() {
        return spotinst::blue_green_forward(req);
    }
    if req.creation.alb_traffic_shift {
        return alb_shift_forward(req);
    }
    let mut steps = Vec::new();
    if req.dynamic_infra {
        steps.push(build::provision_infrastructure());
    }
    steps.extend(autoscaling_setup(req, true));
    steps.push(deploy(StepType::AwsAmiServiceDeploy, names::UPGRADE_AUTOSCALING_GROUP));
    steps.push(build::verify(req, names::VERIFY_STAGING));
    steps.push(
        step(PhaseStepType::AmiSwitchAutoscalingGroupRoutes, names::SWAP_ROUTES).with_step(node(
            StepType::AwsAmiSwitchRoutes,
            names::SWITCH_AUTOSCALING_GROUP_ROUTE,
            json!({ "downsizeOldAsg": true }),
        )),
    );
    steps.push(build::wrap_up());
    Ok(steps)
}

fn alb_shift_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::AmiAutoscalingGroupSetup, names::SETUP_AUTOSCALING_GROUP).with_step(
            node(
                StepType::AsgAmiServiceAlbShiftSetup,
                names::ASG_AMI_ALB_SHIFT_SETUP,
                json!({
                    "minInstances": 0,
                    "maxInstances": 10,
                    "desiredInstances": 6,
                    "autoScalingSteadyStateTimeout": 10,
                }),
            ),
        ),
        deploy(
            StepType::AsgAmiServiceAlbShiftDeploy,
            names::UPGRADE_TRAFFIC_SHIFT_AUTOSCALING_GROUP,
        ),
        build::verify(req, names::VERIFY_STAGING),
        step(PhaseStepType::AmiSwitchAutoscalingGroupRoutes, names::SWAP_ROUTES).with_step(node(
            StepType::AsgAmiAlbShiftSwitchRoutes,
            names::SHIFT_TRAFFIC_WEIGHT,
            json!({ "downsizeOldAsg": true }),
        )),
        build::wrap_up(),
    ])
}

fn blue_green_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.infra.is_spotinst() {
        return spotinst::blue_green_rollback(req);
    }
    let switch = if req.creation.alb_traffic_shift {
        node(
            StepType::AsgAmiRollbackAlbShiftSwitchRoutes,
            names::SHIFT_TRAFFIC_WEIGHT_ROLLBACK,
            json!({}),
        )
    } else {
        node(
            StepType::AwsAmiRollbackSwitchRoutes,
            names::ROLLBACK_AUTOSCALING_GROUP_ROUTE,
            json!({}),
        )
    };
    Ok(vec![
        build::rollback_step(
            PhaseStepType::AmiSwitchAutoscalingGroupRoutes,
            names::ROLLBACK_SERVICE,
            names::DEPLOY_SERVICE,
            switch,
        ),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CreationFlags, InfraTraits};

    #[test]
    fn provision_only_for_dynamic_basic() {
        let req = PhaseRequest::new(DeploymentType::Ami, OrchestrationStrategy::Basic)
            .with_dynamic_infra(true)
            .with_infra(InfraTraits::of_kind(InfrastructureKind::AwsAmi));
        let steps = forward(&req).unwrap();
        assert_eq!(steps[0].phase_step_type, PhaseStepType::ProvisionInfrastructure);
        assert_eq!(steps[1].steps[0].property("maxInstances"), Some(&json!(10)));

        let mut canary = req.clone();
        canary.strategy = OrchestrationStrategy::Canary;
        let steps = forward(&canary).unwrap();
        assert_eq!(steps[0].phase_step_type, PhaseStepType::AmiAutoscalingGroupSetup);
    }

    #[test]
    fn spotinst_infra_delegates() {
        let req = PhaseRequest::new(DeploymentType::Ami, OrchestrationStrategy::BlueGreen)
            .with_infra(InfraTraits::of_kind(InfrastructureKind::AwsAmiSpotinst));
        let steps = blue_green_forward(&req).unwrap();
        assert_eq!(steps[0].phase_step_type, PhaseStepType::SpotinstSetup);
        assert!(steps[0].steps[0].flag("blueGreen"));
        let rollback = blue_green_rollback(&req).unwrap();
        assert_eq!(rollback[0].phase_step_type, PhaseStepType::SpotinstListenerUpdateRollback);
    }

    #[test]
    fn alb_traffic_shift_variant() {
        let req = PhaseRequest::new(DeploymentType::Ami, OrchestrationStrategy::BlueGreen)
            .with_dynamic_infra(true)
            .with_creation_flags(CreationFlags {
                alb_traffic_shift: true,
                ..CreationFlags::default()
            });
        let steps = blue_green_forward(&req).unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].steps[0].step_type, StepType::AsgAmiServiceAlbShiftSetup);
        assert_eq!(steps[0].steps[0].property("desiredInstances"), Some(&json!(6)));
        assert_eq!(
            blue_green_rollback(&req).unwrap()[0].steps[0].step_type,
            StepType::AsgAmiRollbackAlbShiftSwitchRoutes
        );
    }
}
