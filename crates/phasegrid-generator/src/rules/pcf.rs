use serde_json::json;

use phasegrid_model::{
    DeploymentType, GraphError, GraphResult, PhaseStep, PhaseStepType, StepType, names,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    table.register(DeploymentType::Pcf, NON_BLUE_GREEN, RulePair::new(forward, rollback));
    table.register(
        DeploymentType::Pcf,
        BLUE_GREEN,
        RulePair::new(blue_green_forward, blue_green_rollback),
    );
}

fn app_setup(blue_green: bool, resize_strategy: &str) -> PhaseStep {
    step(PhaseStepType::PcfSetup, names::SETUP).with_step(node(
        StepType::PcfSetup,
        names::APP_SETUP,
        json!({
            "blueGreen": blue_green,
            "isWorkflowV2": true,
            "resizeStrategy": resize_strategy,
        }),
    ))
}

fn app_rollback() -> PhaseStep {
    build::rollback_step(
        PhaseStepType::PcfResize,
        names::DEPLOY,
        names::DEPLOY,
        node(StepType::PcfRollback, names::APP_ROLLBACK, json!({})),
    )
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps = Vec::new();
    if req.service_setup_required {
        steps.push(app_setup(false, "DOWNSIZE_OLD_FIRST"));
    }
    steps.push(
        step(PhaseStepType::PcfResize, names::DEPLOY)
            .with_step(node(StepType::PcfResize, names::APP_RESIZE, json!({}))),
    );
    steps.push(build::verify(req, names::VERIFY_SERVICE));
    steps.push(build::wrap_up());
    Ok(steps)
}

fn rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        app_rollback(),
        build::rollback_verify(names::DEPLOY_CONTAINERS),
        build::rollback_wrap_up(),
    ])
}

fn reject_daemon_or_stateful(req: &PhaseRequest) -> GraphResult<()> {
    if req.is_daemon_or_stateful() {
        return Err(GraphError::Unsupported(
            "DaemonSet and StatefulSet are not supported with Blue/Green Deployment".to_string(),
        ));
    }
    Ok(())
}

fn blue_green_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    reject_daemon_or_stateful(req)?;
    let mut steps = Vec::new();
    if req.service_setup_required {
        steps.push(app_setup(true, "RESIZE_NEW_FIRST"));
    }
    steps.push(step(PhaseStepType::PcfResize, names::DEPLOY).with_step(node(
        StepType::PcfResize,
        names::APP_RESIZE,
        build::blue_green_deploy_properties(),
    )));
    steps.push(build::verify(req, names::VERIFY_STAGING));
    steps.push(
        step(PhaseStepType::PcfSwitchRoutes, names::UPDATE_ROUTE).with_step(node(
            StepType::PcfBgMapRoute,
            names::SWAP_ROUTES,
            json!({ "downsizeOldApps": false }),
        )),
    );
    steps.push(build::wrap_up());
    Ok(steps)
}

fn blue_green_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    reject_daemon_or_stateful(req)?;
    Ok(vec![
        build::rollback_step(
            PhaseStepType::PcfSwitchRoutes,
            names::UPDATE_ROUTE,
            names::UPDATE_ROUTE,
            node(StepType::PcfBgMapRoute, names::SWAP_ROUTES, build::swap_service_properties()),
        ),
        app_rollback(),
        build::rollback_verify(names::APP_RESIZE),
        build::rollback_wrap_up(),
    ])
}
