//! Azure scale sets and web app slots. Both are gated by account toggles,
//! checked before rule lookup.

use serde_json::json;

use phasegrid_model::{
    names, DeploymentType, GraphResult, InfrastructureKind, OrchestrationStrategy, PhaseStep,
    PhaseStepType, StepType,
};

use super::{RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

use OrchestrationStrategy::{Basic, BlueGreen, Canary};

pub(super) fn register(table: &mut RuleTable) {
    table.register(
        DeploymentType::AzureVmss,
        &[Basic, Canary, BlueGreen],
        RulePair::new(vmss_forward, vmss_rollback),
    );
    table.register(
        DeploymentType::AzureWebapp,
        &[Canary],
        RulePair::new(webapp_canary_forward, webapp_rollback),
    );
    table.register(
        DeploymentType::AzureWebapp,
        &[BlueGreen],
        RulePair::new(webapp_blue_green_forward, webapp_rollback),
    );
}

fn vmss_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps = Vec::new();
    if req.service_setup_required && req.infra.is(|k| *k == InfrastructureKind::AzureVmss) {
        steps.push(
            step(PhaseStepType::AzureVmssSetup, names::AZURE_VMSS_SETUP).with_step(node(
                StepType::AzureVmssSetup,
                names::AZURE_VMSS_SETUP,
                json!({
                    "minInstances": 0,
                    "maxInstances": 2,
                    "desiredInstances": 1,
                    "autoScalingSteadyStateVMSSTimeout": 20,
                    "blueGreen": false,
                }),
            )),
        );
    }
    steps.push(
        step(PhaseStepType::AzureVmssDeploy, names::AZURE_VMSS_DEPLOY).with_step(node(
            StepType::AzureVmssDeploy,
            names::AZURE_VMSS_DEPLOY,
            json!({}),
        )),
    );
    steps.push(build::verify(req, names::VERIFY_SERVICE));
    if req.is_blue_green() {
        steps.push(
            step(PhaseStepType::AzureVmssSwitchRoutes, names::AZURE_VMSS_SWITCH_ROUTES).with_step(
                node(
                    StepType::AzureVmssSwitchRoutes,
                    names::AZURE_VMSS_SWITCH_ROUTES,
                    json!({ "downsizeOldVMSS": true }),
                ),
            ),
        );
    }
    steps.push(build::wrap_up());
    Ok(steps)
}

fn vmss_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let first = if req.is_blue_green() {
        build::rollback_step(
            PhaseStepType::AzureVmssSwitchRollback,
            names::AZURE_VMSS_SWITCH_ROUTES_ROLLBACK,
            names::DEPLOY_SERVICE,
            node(
                StepType::AzureVmssSwitchRoutesRollback,
                names::AZURE_VMSS_SWITCH_ROUTES_ROLLBACK,
                json!({}),
            ),
        )
    } else {
        build::rollback_step(
            PhaseStepType::AzureVmssRollback,
            names::AZURE_VMSS_ROLLBACK,
            names::DEPLOY_SERVICE,
            node(StepType::AzureVmssRollback, names::AZURE_VMSS_ROLLBACK, json!({})),
        )
    };
    Ok(vec![
        first,
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

fn slot_setup() -> PhaseStep {
    step(PhaseStepType::AzureWebappSlotSetup, names::SLOT_SETUP).with_step(node(
        StepType::AzureWebappSlotSetup,
        names::SLOT_DEPLOYMENT,
        json!({}),
    ))
}

fn slot_swap() -> PhaseStep {
    step(PhaseStepType::AzureWebappSlotSwap, names::SWAP_DEPLOYMENT_SLOTS).with_step(node(
        StepType::AzureWebappSlotSwap,
        names::SWAP_SLOT,
        json!({}),
    ))
}

/// Later canary phases only shift traffic; the slot is set up once.
fn webapp_canary_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps = Vec::new();
    if req.dynamic_infra {
        steps.push(build::provision_infrastructure());
    }
    if req.first_phase {
        steps.push(slot_setup());
        steps.push(build::verify(req, names::VERIFY_SERVICE));
    }
    steps.push(
        step(PhaseStepType::AzureWebappSlotTrafficShift, names::SHIFT_TRAFFIC_TO_SLOT).with_step(
            node(
                StepType::AzureWebappSlotShiftTraffic,
                names::TRAFFIC_PERCENT,
                json!({ "trafficWeightExpr": 0 }),
            ),
        ),
    );
    steps.push(slot_swap());
    steps.push(build::wrap_up());
    Ok(steps)
}

fn webapp_blue_green_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps = Vec::new();
    if req.dynamic_infra {
        steps.push(build::provision_infrastructure());
    }
    steps.push(slot_setup());
    steps.push(build::verify(req, names::VERIFY_SERVICE));
    steps.push(slot_swap());
    steps.push(build::wrap_up());
    Ok(steps)
}

fn webapp_rollback(_req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        build::rollback_step(
            PhaseStepType::AzureWebappSlotRollback,
            names::SLOT_ROLLBACK,
            names::DEPLOY_SERVICE,
            node(StepType::AzureWebappSlotRollback, names::SLOT_ROLLBACK, json!({})),
        ),
        build::rollback_verify(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_canary_phases_skip_slot_setup() {
        let req = PhaseRequest::new(DeploymentType::AzureWebapp, Canary).with_first_phase(false);
        let steps = webapp_canary_forward(&req).unwrap();
        let types: Vec<_> = steps.iter().map(|s| s.phase_step_type).collect();
        assert_eq!(
            types,
            vec![
                PhaseStepType::AzureWebappSlotTrafficShift,
                PhaseStepType::AzureWebappSlotSwap,
                PhaseStepType::WrapUp,
            ]
        );
    }

    #[test]
    fn vmss_blue_green_switches_routes() {
        let req = PhaseRequest::new(DeploymentType::AzureVmss, BlueGreen);
        let steps = vmss_forward(&req).unwrap();
        assert_eq!(steps[0].steps[0].property("maxInstances"), Some(&json!(2)));
        assert_eq!(steps[3].phase_step_type, PhaseStepType::AzureVmssSwitchRoutes);
        let rollback = vmss_rollback(&req).unwrap();
        assert_eq!(rollback[0].phase_step_type, PhaseStepType::AzureVmssSwitchRollback);

        let basic = PhaseRequest::new(DeploymentType::AzureVmss, Basic);
        assert_eq!(vmss_forward(&basic).unwrap().len(), 4);
        assert_eq!(vmss_rollback(&basic).unwrap()[0].name, names::AZURE_VMSS_ROLLBACK);
    }
}
