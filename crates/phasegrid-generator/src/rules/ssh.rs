//! Host-based deployments over SSH and WinRM.

use serde_json::json;

use phasegrid_model::{
    names, CommandType, DeploymentType, GraphResult, Node, OrchestrationStrategy, PhaseStep,
    PhaseStepType, StepType,
};

use super::{NON_BLUE_GREEN, RulePair, RuleTable};
use crate::build::{self, command_nodes, node, step};
use crate::request::PhaseRequest;

pub(super) fn register(table: &mut RuleTable) {
    for dt in [DeploymentType::Ssh, DeploymentType::Winrm] {
        table.register(dt, NON_BLUE_GREEN, RulePair::new(forward, rollback));
    }
}

fn node_select_kind(req: &PhaseRequest) -> StepType {
    if req.strategy == OrchestrationStrategy::Rolling {
        StepType::RollingNodeSelect
    } else if req.infra.is_physical_data_center() {
        StepType::DcNodeSelect
    } else {
        StepType::AwsNodeSelect
    }
}

fn load_balancer(operation: &str, rollback: bool) -> Node {
    let mut lb = node(
        StepType::ElasticLoadBalancer,
        names::ELASTIC_LOAD_BALANCER,
        json!({ "operation": operation }),
    );
    lb.rollback = rollback;
    lb
}

/// Command nodes of one slot, with the load balancer toggle appended when
/// the infrastructure has one.
fn service_toggle(req: &PhaseRequest, command_type: CommandType, operation: &str, rollback: bool) -> Vec<Node> {
    let mut nodes = command_nodes(req, command_type, rollback);
    if req.infra.load_balancer {
        nodes.push(load_balancer(operation, rollback));
    }
    nodes
}

fn forward(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::InfrastructureNode, names::PREPARE_INFRA).with_step(node(
            node_select_kind(req),
            names::SELECT_NODES,
            json!({
                "specificHosts": false,
                "instanceCount": 1,
                "excludeSelectedHostsFromFuturePhases": true,
            }),
        )),
        step(PhaseStepType::DisableService, names::DISABLE_SERVICE)
            .with_steps(service_toggle(req, CommandType::Disable, "Disable", false)),
        step(PhaseStepType::DeployService, names::DEPLOY_SERVICE)
            .with_steps(command_nodes(req, CommandType::Install, false)),
        step(PhaseStepType::EnableService, names::ENABLE_SERVICE)
            .with_steps(service_toggle(req, CommandType::Enable, "Enable", false)),
        build::verify(req, names::VERIFY_SERVICE),
        build::wrap_up(),
    ])
}

fn rollback(req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
    Ok(vec![
        step(PhaseStepType::DisableService, names::DISABLE_SERVICE)
            .with_steps(service_toggle(req, CommandType::Disable, "Disable", true))
            .mirroring(names::ENABLE_SERVICE),
        step(PhaseStepType::StopService, names::STOP_SERVICE)
            .with_steps(command_nodes(req, CommandType::Stop, true))
            .mirroring(names::DEPLOY_SERVICE),
        step(PhaseStepType::DeployService, names::DEPLOY_SERVICE)
            .with_steps(command_nodes(req, CommandType::Install, true))
            .mirroring(names::DEPLOY_SERVICE),
        step(PhaseStepType::EnableService, names::ENABLE_SERVICE)
            .with_steps(service_toggle(req, CommandType::Enable, "Enable", true))
            .mirroring(names::DISABLE_SERVICE),
        step(PhaseStepType::VerifyService, names::VERIFY_SERVICE)
            .with_steps(command_nodes(req, CommandType::Verify, true))
            .mirroring(names::DEPLOY_SERVICE),
        build::rollback_wrap_up(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{InfraTraits, ServiceCommands};
    use phasegrid_model::InfrastructureKind;

    fn request(strategy: OrchestrationStrategy) -> PhaseRequest {
        let commands = ServiceCommands::default()
            .with(CommandType::Install, "Install")
            .with(CommandType::Stop, "Stop")
            .with(CommandType::Verify, "Verify Port");
        PhaseRequest::new(DeploymentType::Ssh, strategy).with_commands(commands)
    }

    #[test]
    fn node_select_follows_strategy_then_infra() {
        assert_eq!(node_select_kind(&request(OrchestrationStrategy::Rolling)), StepType::RollingNodeSelect);
        let dc = request(OrchestrationStrategy::Basic)
            .with_infra(InfraTraits::of_kind(InfrastructureKind::PhysicalDataCenterSsh));
        assert_eq!(node_select_kind(&dc), StepType::DcNodeSelect);
        assert_eq!(node_select_kind(&request(OrchestrationStrategy::Canary)), StepType::AwsNodeSelect);
    }

    #[test]
    fn load_balancer_steps_attached() {
        let mut req = request(OrchestrationStrategy::Basic);
        req.infra.load_balancer = true;
        let steps = forward(&req).unwrap();
        let disable = &steps[1];
        assert_eq!(disable.steps.len(), 1);
        assert_eq!(disable.steps[0].str_property("operation"), Some("Disable"));
        assert_eq!(steps[2].step_names(), vec!["Install"]);
        assert_eq!(steps[4].step_names(), vec!["Verify Port"]);

        let rollback = rollback(&req).unwrap();
        assert_eq!(rollback.len(), 6);
        assert_eq!(rollback[1].step_names(), vec!["Stop"]);
        assert!(rollback[0].steps[0].rollback);
        assert_eq!(
            rollback[3].phase_step_name_for_rollback.as_deref(),
            Some(names::DISABLE_SERVICE)
        );
    }
}
