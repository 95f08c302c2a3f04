//! Node-level reconciliation: host selection reset, identity preservation
//! across edits, and the artifact check in pre-deployment.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use phasegrid_model::{
    DeploymentType, InstanceUnitType, Node, OrchestrationStrategy, OrchestrationWorkflow,
    PhaseStep, PhaseStepType, StepType, StepTypeRegistry, WorkflowPhase, names, new_id,
};

const SPECIFIC_HOSTS: &str = "specificHosts";
const HOST_NAMES: &str = "hostNames";
const INSTANCE_COUNT: &str = "instanceCount";
const INSTANCE_UNIT_TYPE: &str = "instanceUnitType";

/// How incoming nodes are paired with the nodes they replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Editor updates: nodes keep the ids they were loaded with. A node
    /// sent without an id is paired by name.
    #[default]
    ById,
    /// Document re-imports carry no ids; nodes are paired by name.
    ByName,
}

/// Drops pinned hosts from node-select steps after the infrastructure or
/// environment changed. Returns how many nodes were reset.
pub fn reset_node_selection(phase: &mut WorkflowPhase, registry: &StepTypeRegistry) -> usize {
    let mut reset = 0;
    let groups = phase
        .phase_steps
        .iter_mut()
        .filter(|ps| ps.phase_step_type == PhaseStepType::InfrastructureNode);
    for group in groups {
        for node in &mut group.steps {
            if !registry.is_node_select(&node.step_type) || !node.flag(SPECIFIC_HOSTS) {
                continue;
            }
            node.properties.insert(SPECIFIC_HOSTS.into(), Value::Bool(false));
            node.properties.remove(HOST_NAMES);
            node.properties.insert(INSTANCE_COUNT.into(), Value::from(1));
            node.properties.insert(
                INSTANCE_UNIT_TYPE.into(),
                Value::from(InstanceUnitType::Count.as_str()),
            );
            reset += 1;
        }
    }
    if reset > 0 {
        debug!(phase = %phase.name, nodes = reset, "node selection reset");
    }
    reset
}

/// Previous nodes of a phase or step group, indexed for matching.
struct PreviousNodes<'p> {
    by_id: HashMap<&'p str, &'p Node>,
    by_name: HashMap<&'p str, &'p Node>,
}

impl<'p> PreviousNodes<'p> {
    fn new(nodes: impl Iterator<Item = &'p Node>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for node in nodes {
            if !node.id.is_empty() {
                by_id.insert(node.id.as_str(), node);
            }
            by_name.entry(node.name.as_str()).or_insert(node);
        }
        Self { by_id, by_name }
    }

    fn find(&self, node: &Node, mode: MatchMode) -> Option<&'p Node> {
        match mode {
            MatchMode::ById if node.id.is_empty() => self.by_name.get(node.name.as_str()).copied(),
            MatchMode::ById => self.by_id.get(node.id.as_str()).copied(),
            MatchMode::ByName => self.by_name.get(node.name.as_str()).copied(),
        }
    }
}

fn reconcile_node(
    node: &mut Node,
    previous: &PreviousNodes<'_>,
    mode: MatchMode,
    registry: &StepTypeRegistry,
) {
    let Some(old) = previous.find(node, mode) else {
        if mode == MatchMode::ByName || node.id.is_empty() {
            node.id = new_id();
        }
        return;
    };
    node.id = old.id.clone();
    if old.step_type != node.step_type {
        return;
    }
    for key in registry.carried_properties(&node.step_type) {
        if node.properties.contains_key(*key) {
            continue;
        }
        if let Some(value) = old.properties.get(*key) {
            node.properties.insert((*key).to_string(), value.clone());
        }
    }
}

/// Gives incoming nodes of `incoming` the ids of the nodes they replace in
/// `previous` and carries per-kind properties the incoming node lacks.
pub fn preserve_step_ids(
    incoming: &mut PhaseStep,
    previous: &PhaseStep,
    mode: MatchMode,
    registry: &StepTypeRegistry,
) {
    if mode == MatchMode::ByName || incoming.id.is_empty() {
        incoming.id = previous.id.clone();
    }
    let index = PreviousNodes::new(previous.steps.iter());
    for node in &mut incoming.steps {
        reconcile_node(node, &index, mode, registry);
    }
}

/// Phase-wide variant of [`preserve_step_ids`]. Step groups are paired by
/// id or name; nodes may match anywhere in the previous phase, so moving a
/// node between groups keeps its identity.
pub fn preserve_phase_ids(
    incoming: &mut WorkflowPhase,
    previous: &WorkflowPhase,
    mode: MatchMode,
    registry: &StepTypeRegistry,
) {
    let index = PreviousNodes::new(previous.nodes());
    for group in &mut incoming.phase_steps {
        let old_group = previous.phase_steps.iter().find(|old| match mode {
            MatchMode::ById => !group.id.is_empty() && old.id == group.id,
            MatchMode::ByName => old.name == group.name,
        });
        match old_group {
            Some(old) => group.id = old.id.clone(),
            None if mode == MatchMode::ByName || group.id.is_empty() => group.id = new_id(),
            None => {}
        }
        for node in &mut group.steps {
            reconcile_node(node, &index, mode, registry);
        }
    }
}

/// Replaces every id in `phase` with a fresh one, rewriting skip strategies
/// to the new node ids.
pub fn refresh_ids(phase: &mut WorkflowPhase) {
    phase.id = new_id();
    for group in &mut phase.phase_steps {
        group.id = new_id();
        let mut renamed = HashMap::new();
        for node in &mut group.steps {
            let fresh = new_id();
            renamed.insert(std::mem::replace(&mut node.id, fresh.clone()), fresh);
        }
        for strategy in &mut group.step_skip_strategies {
            for id in &mut strategy.step_ids {
                if let Some(fresh) = renamed.get(id.as_str()) {
                    *id = fresh.clone();
                }
            }
        }
    }
}

/// Host-based and slot deployments verify the artifact before any phase
/// runs. Build workflows collect the artifact instead.
pub fn artifact_check_required(phase: &WorkflowPhase, strategy: OrchestrationStrategy) -> bool {
    strategy != OrchestrationStrategy::Build
        && matches!(
            phase.deployment_type,
            Some(DeploymentType::Ssh | DeploymentType::Pcf | DeploymentType::AzureWebapp)
        )
}

/// Adds an ARTIFACT_CHECK node to pre-deployment unless one exists.
/// Returns whether the node was added.
pub fn ensure_artifact_check(workflow: &mut OrchestrationWorkflow) -> bool {
    let pre = &mut workflow.pre_deployment_steps;
    if pre.steps.iter().any(|n| n.step_type == StepType::ArtifactCheck) {
        return false;
    }
    pre.steps
        .push(Node::new(StepType::ArtifactCheck, names::ARTIFACT_CHECK));
    debug!("artifact check added to pre-deployment");
    true
}
