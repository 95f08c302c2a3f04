use serde_json::json;

use phasegrid_model::{
    names, DeploymentType, GraphResult, OrchestrationStrategy, PhaseStep, PhaseStepType, StepType,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    table.register(DeploymentType::Ecs, NON_BLUE_GREEN, RulePair::new(forward, rollback));
    table.register(
        DeploymentType::Ecs,
        BLUE_GREEN,
        RulePair::new(blue_green_forward, blue_green_rollback),
    );
}

/// Daemon scheduling only applies to basic workflows.
fn is_daemon(req: &PhaseRequest) -> bool {
    req.strategy == OrchestrationStrategy::Basic && req.daemon_set
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let daemon = is_daemon(req);
    let mut steps = Vec::new();
    if req.service_setup_required {
        let setup = if daemon {
            node(StepType::EcsDaemonServiceSetup, names::ECS_DAEMON_SERVICE_SETUP, json!({}))
        } else {
            node(StepType::EcsServiceSetup, names::ECS_SERVICE_SETUP, json!({}))
        };
        steps.push(step(PhaseStepType::ContainerSetup, names::SETUP_CONTAINER).with_step(setup));
    }
    if !daemon {
        steps.push(
            step(PhaseStepType::ContainerDeploy, names::DEPLOY_CONTAINERS).with_step(node(
                StepType::EcsServiceDeploy,
                names::UPGRADE_CONTAINERS,
                json!({}),
            )),
        );
    }
    steps.push(build::verify(req, names::VERIFY_SERVICE));
    steps.push(build::wrap_up());
    Ok(steps)
}

fn rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let first = if is_daemon(req) {
        build::rollback_step(
            PhaseStepType::ContainerSetup,
            names::SETUP_CONTAINER,
            names::SETUP_CONTAINER,
            node(StepType::EcsServiceSetupRollback, names::ROLLBACK_CONTAINERS, json!({})),
        )
    } else {
        container_rollback()
    };
    Ok(vec![
        first,
        build::rollback_verify(names::DEPLOY_CONTAINERS),
        build::rollback_wrap_up(),
    ])
}

fn container_rollback() -> PhaseStep {
    build::rollback_step(
        PhaseStepType::ContainerDeploy,
        names::DEPLOY_CONTAINERS,
        names::DEPLOY_CONTAINERS,
        node(StepType::EcsServiceRollback, names::ROLLBACK_CONTAINERS, json!({})),
    )
}

/// Route 53 when the workflow was created with DNS swapping, otherwise
/// target-group swapping behind the load balancer.
fn blue_green_forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let dns = req.creation.ecs_bg_dns;
    let mut steps = Vec::new();
    if req.dynamic_infra {
        steps.push(build::provision_infrastructure());
    }
    if req.service_setup_required {
        let setup = if dns {
            node(
                StepType::EcsBgServiceSetupRoute53,
                names::SETUP_ROUTE53,
                json!({ "resizeStrategy": "RESIZE_NEW_FIRST" }),
            )
        } else {
            node(
                StepType::EcsBgServiceSetup,
                names::SETUP_LOAD_BALANCER,
                json!({ "resizeStrategy": "RESIZE_NEW_FIRST", "useLoadBalancer": true }),
            )
        };
        steps.push(step(PhaseStepType::ContainerSetup, names::SETUP_CONTAINER).with_step(setup));
    }

    steps.push(
        step(PhaseStepType::ContainerDeploy, names::DEPLOY_CONTAINERS).with_step(node(
            StepType::EcsServiceDeploy,
            names::UPGRADE_CONTAINERS,
            build::blue_green_deploy_properties(),
        )),
    );
    steps.push(build::verify(req, names::VERIFY_SERVICE));

    let swap = if dns {
        step(PhaseStepType::EcsUpdateRoute53DnsWeight, names::SWAP_ROUTE53_DNS).with_step(node(
            StepType::EcsRoute53DnsWeightUpdate,
            names::CHANGE_ROUTE53_WEIGHTS,
            json!({
                "downsizeOldService": true,
                "oldServiceDNSWeight": 0,
                "newServiceDNSWeight": 100,
                "recordTTL": 60,
            }),
        ))
    } else {
        step(PhaseStepType::EcsUpdateListenerBg, names::SWAP_TARGET_GROUPS).with_step(node(
            StepType::EcsListenerUpdate,
            names::SWAP_TARGET_GROUPS,
            json!({ "downsizeOldService": true }),
        ))
    };
    steps.push(swap);
    steps.push(build::wrap_up());
    Ok(steps)
}

fn blue_green_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.creation.ecs_bg_dns {
        return Ok(vec![
            build::rollback_step(
                PhaseStepType::EcsUpdateRoute53DnsWeight,
                names::SWAP_ROUTE53_DNS,
                names::DEPLOY_CONTAINERS,
                node(
                    StepType::EcsRoute53DnsWeightUpdateRollback,
                    names::ROLLBACK_ROUTE53_WEIGHTS,
                    json!({}),
                ),
            ),
            build::rollback_verify(names::VERIFY_SERVICE),
            build::rollback_wrap_up(),
        ]);
    }
    Ok(vec![
        build::rollback_step(
            PhaseStepType::EcsUpdateListenerBg,
            names::SWAP_TARGET_GROUPS,
            names::DEPLOY_CONTAINERS,
            node(StepType::EcsListenerUpdateRollback, names::ROLLBACK_SWAP_TARGET_GROUPS, json!({})),
        ),
        container_rollback(),
        build::rollback_verify(names::DEPLOY_CONTAINERS),
        build::rollback_wrap_up(),
    ])
}
