//! Small constructors shared by the rule modules.

use serde_json::Value;

use phasegrid_model::{CommandType, Node, PhaseStep, PhaseStepType, Properties, StepType, names};

use crate::request::PhaseRequest;

/// Node with properties taken from a `json!` object literal.
pub(crate) fn node(kind: StepType, name: &str, properties: Value) -> Node {
    let mut node = Node::new(kind, name);
    node.properties = into_properties(properties);
    node
}

pub(crate) fn into_properties(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

pub(crate) fn step(kind: PhaseStepType, name: &str) -> PhaseStep {
    PhaseStep::new(kind, name)
}

/// One COMMAND node per service command of the given type.
pub(crate) fn command_nodes(req: &PhaseRequest, command_type: CommandType, rollback: bool) -> Vec<Node> {
    req.commands
        .names(command_type)
        .iter()
        .map(|name| {
            let mut node = Node::new(StepType::Command, name).with_property("commandName", name.as_str());
            node.rollback = rollback;
            node
        })
        .collect()
}

pub(crate) fn provision_infrastructure() -> PhaseStep {
    step(PhaseStepType::ProvisionInfrastructure, names::PROVISION_INFRASTRUCTURE)
}

pub(crate) fn prepare_steps() -> PhaseStep {
    step(PhaseStepType::PrepareSteps, names::PREPARE_STEPS)
}

/// Verification group populated with the service's verify commands.
pub(crate) fn verify(req: &PhaseRequest, name: &str) -> PhaseStep {
    step(PhaseStepType::VerifyService, name).with_steps(command_nodes(req, CommandType::Verify, false))
}

pub(crate) fn wrap_up() -> PhaseStep {
    step(PhaseStepType::WrapUp, names::WRAP_UP)
}

/// Rollback group holding one rollback node, run when `mirror` succeeded.
pub(crate) fn rollback_step(kind: PhaseStepType, name: &str, mirror: &str, node: Node) -> PhaseStep {
    step(kind, name).with_step(node.as_rollback()).mirroring(mirror)
}

pub(crate) fn rollback_verify(mirror: &str) -> PhaseStep {
    step(PhaseStepType::VerifyService, names::VERIFY_SERVICE).mirroring(mirror)
}

pub(crate) fn rollback_wrap_up() -> PhaseStep {
    wrap_up().as_rollback()
}

/// Full-traffic deploy defaults used by every blue/green deploy node.
pub(crate) fn blue_green_deploy_properties() -> Value {
    serde_json::json!({
        "instanceUnitType": "PERCENTAGE",
        "instanceCount": 100,
        "downsizeInstanceUnitType": "PERCENTAGE",
        "downsizeInstanceCount": 100,
    })
}

/// Service selector swap between the primary and stage services.
pub(crate) fn swap_service_properties() -> Value {
    serde_json::json!({
        "service1": names::PRIMARY_SERVICE_NAME_EXPR,
        "service2": names::STAGE_SERVICE_NAME_EXPR,
    })
}
