//! Elastigroup rules. AMI phases on Spotinst infrastructure delegate here.

use serde_json::json;

use phasegrid_model::{
    DeploymentType, GraphResult, InfrastructureKind, PhaseStep, PhaseStepType, StepType, names,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    table.register(DeploymentType::Spotinst, NON_BLUE_GREEN, RulePair::new(forward, rollback));
    table.register(
        DeploymentType::Spotinst,
        BLUE_GREEN,
        RulePair::new(blue_green_forward, blue_green_rollback),
    );
}

fn setup(req: &PhaseRequest, blue_green: bool) -> Option<PhaseStep> {
    if !req.service_setup_required || !req.infra.is(InfrastructureKind::is_ami) {
        return None;
    }
    Some(
        step(PhaseStepType::SpotinstSetup, names::ELASTIGROUP_SETUP).with_step(node(
            StepType::SpotinstSetup,
            names::ELASTIGROUP_SETUP,
            json!({ "blueGreen": blue_green }),
        )),
    )
}

pub(super) fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps: Vec<PhaseStep> = setup(req, false).into_iter().collect();
    steps.push(
        step(PhaseStepType::SpotinstDeploy, names::ELASTIGROUP_DEPLOY).with_step(node(
            StepType::SpotinstDeploy,
            names::ELASTIGROUP_DEPLOY,
            json!({}),
        )),
    );
    steps.push(build::verify(req, names::VERIFY_STAGING));
    steps.push(build::wrap_up());
    Ok(steps)
}

pub(super) fn rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        build::rollback_step(
            PhaseStepType::SpotinstRollback,
            names::ELASTIGROUP_ROLLBACK,
            names::DEPLOY_SERVICE,
            node(StepType::SpotinstRollback, names::ELASTIGROUP_ROLLBACK, json!({})),
        ),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

pub(super) fn blue_green_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.creation.alb_traffic_shift {
        return alb_shift_forward(req);
    }
    let mut steps: Vec<PhaseStep> = setup(req, true).into_iter().collect();
    steps.push(
        step(PhaseStepType::SpotinstDeploy, names::ELASTIGROUP_DEPLOY).with_step(node(
            StepType::SpotinstDeploy,
            names::ELASTIGROUP_DEPLOY,
            json!({ "instanceUnitType": "PERCENTAGE", "instanceCount": 100 }),
        )),
    );
    steps.push(build::verify(req, names::VERIFY_STAGING));
    steps.push(
        step(PhaseStepType::SpotinstListenerUpdate, names::ROUTE_UPDATE).with_step(node(
            StepType::SpotinstListenerUpdate,
            names::SWAP_PRODUCTION_WITH_STAGE,
            json!({ "downsizeOldElastiGroup": true }),
        )),
    );
    steps.push(build::wrap_up());
    Ok(steps)
}

fn alb_shift_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::SpotinstSetup, names::ELASTIGROUP_SETUP).with_step(node(
            StepType::SpotinstAlbShiftSetup,
            names::ELASTIGROUP_ALB_SHIFT_SETUP,
            json!({}),
        )),
        step(PhaseStepType::SpotinstDeploy, names::ELASTIGROUP_DEPLOY).with_step(node(
            StepType::SpotinstAlbShiftDeploy,
            names::ELASTIGROUP_ALB_SHIFT_DEPLOY,
            json!({ "instanceUnitType": "PERCENTAGE", "instanceCount": 100 }),
        )),
        build::verify(req, names::VERIFY_STAGING),
        step(PhaseStepType::SpotinstListenerUpdate, names::ROUTE_UPDATE).with_step(node(
            StepType::SpotinstListenerAlbShift,
            names::SHIFT_TRAFFIC_WEIGHT,
            json!({ "downsizeOldElastigroup": true }),
        )),
        build::wrap_up(),
    ])
}

pub(super) fn blue_green_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let listener = if req.creation.alb_traffic_shift {
        node(
            StepType::SpotinstListenerAlbShiftRollback,
            names::SHIFT_TRAFFIC_WEIGHT_ROLLBACK,
            json!({}),
        )
    } else {
        node(
            StepType::SpotinstListenerUpdateRollback,
            names::SWAP_PRODUCTION_WITH_STAGE,
            json!({}),
        )
    };
    Ok(vec![
        build::rollback_step(
            PhaseStepType::SpotinstListenerUpdateRollback,
            names::ROUTE_UPDATE_ROLLBACK,
            names::DEPLOY_SERVICE,
            listener,
        ),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}
