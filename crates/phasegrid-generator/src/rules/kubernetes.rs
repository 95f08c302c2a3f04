use serde_json::json;

use phasegrid_model::{
    names, DeploymentType, GraphError, GraphResult, OrchestrationStrategy, PhaseStep,
    PhaseStepType, StepType,
};

use super::{BLUE_GREEN, NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, node, step};
use crate::request::PhaseRequest;

const REPLICATION_CONTROLLER_NAME: &str = "${app.name}-${service.name}-${env.name}";
const RESIZE_NEW_FIRST: &str = "RESIZE_NEW_FIRST";

pub(super) fn register(table: &mut RuleTable) {
    table.register(
        DeploymentType::Kubernetes,
        NON_BLUE_GREEN,
        RulePair::new(forward, rollback),
    );
    table.register(
        DeploymentType::Kubernetes,
        BLUE_GREEN,
        RulePair::new(blue_green_forward, blue_green_rollback),
    );
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    let mut steps = Vec::new();
    if req.service_setup_required {
        if req.infra.gke_runtime_cluster {
            steps.push(
                step(PhaseStepType::ClusterSetup, names::SETUP_CLUSTER).with_step(node(
                    StepType::GcpClusterSetup,
                    names::GCP_CLUSTER_SETUP,
                    json!({}),
                )),
            );
        }
        steps.push(
            step(PhaseStepType::ContainerSetup, names::SETUP_CONTAINER).with_step(node(
                StepType::KubernetesSetup,
                names::KUBERNETES_SERVICE_SETUP,
                json!({
                    "replicationControllerName": REPLICATION_CONTROLLER_NAME,
                    "resizeStrategy": RESIZE_NEW_FIRST,
                }),
            )),
        );
    }

    if !req.is_daemon_or_stateful() {
        let properties = if req.strategy == OrchestrationStrategy::Basic {
            json!({ "instanceCount": "100" })
        } else {
            json!({})
        };
        steps.push(
            step(PhaseStepType::ContainerDeploy, names::DEPLOY_CONTAINERS).with_step(node(
                StepType::KubernetesDeploy,
                names::UPGRADE_CONTAINERS,
                properties,
            )),
        );
    }

    steps.push(build::verify(req, names::VERIFY_SERVICE));
    steps.push(build::wrap_up());
    Ok(steps)
}

fn rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    if req.is_daemon_or_stateful() {
        return Ok(vec![
            setup_rollback(),
            build::rollback_verify(names::SETUP_CONTAINER),
            build::rollback_wrap_up(),
        ]);
    }

    let mut steps = vec![build::rollback_step(
        PhaseStepType::ContainerDeploy,
        names::DEPLOY_CONTAINERS,
        names::DEPLOY_CONTAINERS,
        node(StepType::KubernetesDeployRollback, names::ROLLBACK_CONTAINERS, json!({})),
    )];
    if req.service_setup_required {
        steps.push(setup_rollback());
    }
    steps.push(build::rollback_verify(names::DEPLOY_CONTAINERS));
    steps.push(build::rollback_wrap_up());
    Ok(steps)
}

fn setup_rollback() -> PhaseStep {
    build::rollback_step(
        PhaseStepType::ContainerSetup,
        names::SETUP_CONTAINER,
        names::SETUP_CONTAINER,
        node(StepType::KubernetesSetupRollback, names::ROLLBACK_KUBERNETES_SETUP, json!({})),
    )
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
        let service_spec = json!({
            "serviceType": "ClusterIP",
            "port": 80,
            "targetPort": 8080,
            "protocol": "TCP",
        });
        steps.push(
            step(PhaseStepType::ContainerSetup, names::SETUP_CONTAINER).with_step(node(
                StepType::KubernetesSetup,
                names::BLUE_GREEN_SERVICE_SETUP,
                json!({
                    "replicationControllerName": REPLICATION_CONTROLLER_NAME,
                    "blueGreen": true,
                    "blueGreenConfig": {
                        "primaryService": service_spec.clone(),
                        "stageService": service_spec,
                    },
                    "resizeStrategy": RESIZE_NEW_FIRST,
                }),
            )),
        );
    }

    steps.push(
        step(PhaseStepType::ContainerDeploy, names::DEPLOY_CONTAINERS).with_step(node(
            StepType::KubernetesDeploy,
            names::UPGRADE_CONTAINERS,
            build::blue_green_deploy_properties(),
        )),
    );
    steps.push(build::verify(req, names::VERIFY_STAGE_SERVICE));
    steps.push(
        step(PhaseStepType::RouteUpdate, names::ROUTE_UPDATE).with_step(node(
            StepType::KubernetesSwapServiceSelectors,
            names::SWAP_PRIMARY_WITH_STAGE,
            build::swap_service_properties(),
        )),
    );
    steps.push(build::wrap_up());
    Ok(steps)
}

fn blue_green_rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    reject_daemon_or_stateful(req)?;

    let mut steps = vec![
        build::rollback_step(
            PhaseStepType::RouteUpdate,
            names::ROUTE_UPDATE,
            names::ROUTE_UPDATE,
            node(
                StepType::KubernetesSwapServiceSelectors,
                names::SWAP_PRIMARY_WITH_STAGE,
                build::swap_service_properties(),
            ),
        ),
        step(PhaseStepType::ContainerDeploy, names::DEPLOY_CONTAINERS)
            .mirroring(names::DEPLOY_CONTAINERS),
    ];
    if req.service_setup_required {
        steps.push(
            step(PhaseStepType::ContainerSetup, names::SETUP_CONTAINER)
                .mirroring(names::SETUP_CONTAINER),
        );
    }
    steps.push(build::rollback_verify(names::DEPLOY_CONTAINERS));
    steps.push(build::rollback_wrap_up());
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(steps: &[PhaseStep]) -> Vec<PhaseStepType> {
        steps.iter().map(|s| s.phase_step_type).collect()
    }

    #[test]
    fn basic_on_gke_runtime_cluster() {
        let mut req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::Basic);
        req.infra.gke_runtime_cluster = true;
        let steps = forward(&req).unwrap();
        assert_eq!(
            types(&steps),
            vec![
                PhaseStepType::ClusterSetup,
                PhaseStepType::ContainerSetup,
                PhaseStepType::ContainerDeploy,
                PhaseStepType::VerifyService,
                PhaseStepType::WrapUp,
            ]
        );
        let deploy = &steps[2].steps[0];
        assert_eq!(deploy.str_property("instanceCount"), Some("100"));
    }

    #[test]
    fn canary_deploy_has_no_instance_count() {
        let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::Canary);
        let steps = forward(&req).unwrap();
        assert_eq!(steps[0].name, names::SETUP_CONTAINER);
        assert!(steps[1].steps[0].properties.is_empty());
    }

    #[test]
    fn daemon_set_skips_deploy_and_rolls_back_setup_only() {
        let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::Rolling)
            .with_daemon_set(true);
        let steps = forward(&req).unwrap();
        assert!(steps.iter().all(|s| s.phase_step_type != PhaseStepType::ContainerDeploy));

        let rollback = rollback(&req).unwrap();
        assert_eq!(rollback.len(), 3);
        assert_eq!(rollback[0].steps[0].step_type, StepType::KubernetesSetupRollback);
        assert_eq!(
            rollback[1].phase_step_name_for_rollback.as_deref(),
            Some(names::SETUP_CONTAINER)
        );
    }

    #[test]
    fn blue_green_swaps_primary_and_stage() {
        let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::BlueGreen);
        let steps = blue_green_forward(&req).unwrap();
        let setup = &steps[0].steps[0];
        assert!(setup.flag("blueGreen"));
        assert_eq!(
            setup.property("blueGreenConfig").unwrap()["stageService"]["targetPort"],
            8080
        );
        assert_eq!(steps[2].name, names::VERIFY_STAGE_SERVICE);
        let swap = &steps[3].steps[0];
        assert_eq!(swap.str_property("service1"), Some("${PRIMARY_SERVICE_NAME}"));

        let rollback = blue_green_rollback(&req).unwrap();
        assert_eq!(rollback[0].name, names::ROUTE_UPDATE);
        assert!(rollback[0].steps[0].rollback);
        assert!(rollback[1].steps.is_empty());
    }

    #[test]
    fn blue_green_without_setup_has_no_setup_rollback() {
        let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::BlueGreen)
            .with_service_setup(false);
        let rollback = blue_green_rollback(&req).unwrap();
        assert!(rollback.iter().all(|s| s.phase_step_type != PhaseStepType::ContainerSetup));
    }
}
