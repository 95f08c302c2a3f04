//! Rollback step groups for infrastructure provisioners.
//!
//! Provisioner nodes (Terraform, CloudFormation, ARM, Terragrunt) are
//! scanned in order and each one that applied changes gets a rollback node.
//! Plan-only runs apply nothing, but later nodes that inherit an approved
//! plan take the plan's workspace and module path, and skip rollback when
//! the plan asked to.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use phasegrid_model::{
    Node, PhaseStep, PhaseStepType, StepType, StepTypeRegistry, WorkflowPhase, names,
};

const PROVISIONER_ID: &str = "provisionerId";
const RUN_PLAN_ONLY: &str = "runPlanOnly";
const INHERIT_APPROVED_PLAN: &str = "inheritApprovedPlan";
const SKIP_ROLLBACK: &str = "skipRollback";
const WORKSPACE: &str = "workspace";
const PATH_TO_MODULE: &str = "pathToModule";

/// Properties a rollback node copies from its provisioner, when present.
fn rollback_properties(kind: &StepType) -> &'static [&'static str] {
    match kind {
        StepType::CloudFormationCreateStack => &[
            "customStackName",
            "region",
            "useCustomStackName",
            "awsConfigId",
            PROVISIONER_ID,
            "timeoutMillis",
            "templateExpressions",
        ],
        StepType::TerraformProvision => &[PROVISIONER_ID, "timeoutMillis", WORKSPACE, "templateExpressions"],
        StepType::TerragruntProvision => &[PROVISIONER_ID, "timeoutMillis", WORKSPACE, PATH_TO_MODULE],
        StepType::ArmCreateResource => &[
            PROVISIONER_ID,
            "timeoutMillis",
            "timeoutExpression",
            "cloudProviderId",
            "resourceGroupExpression",
            "subscriptionExpression",
        ],
        _ => &[],
    }
}

/// Workspace and module path recorded from plan runs.
type PlanRecord = (Option<Value>, Option<Value>);

#[derive(Debug, Default)]
struct PlanScan {
    /// Latest workspace and module path planned per provisioner.
    plans: HashMap<String, PlanRecord>,
    skipped: HashSet<String>,
}

impl PlanScan {
    /// Only values the plan actually sets are recorded, so a plan without a
    /// workspace keeps the one an earlier plan set.
    fn record_plan(&mut self, provisioner_id: &str, node: &Node) {
        let record = self.plans.entry(provisioner_id.to_string()).or_default();
        if let Some(workspace) = node.property(WORKSPACE).filter(|v| !v.is_null()) {
            record.0 = Some(workspace.clone());
        }
        if let Some(path_to_module) = node.property(PATH_TO_MODULE).filter(|v| !v.is_null()) {
            record.1 = Some(path_to_module.clone());
        }
        if node.flag(SKIP_ROLLBACK) {
            self.skipped.insert(provisioner_id.to_string());
        } else {
            self.skipped.remove(provisioner_id);
        }
    }
}

/// `inherited` is set for nodes inheriting an approved plan; the inner
/// `None` means no plan ran before them.
fn rollback_node(
    source: &Node,
    rollback_kind: StepType,
    inherited: Option<Option<&PlanRecord>>,
) -> Node {
    let mut node = Node::new(rollback_kind, &names::rollback_name(&source.name)).as_rollback();
    // Derived ids keep the forward and reverse groups identical.
    node.id = if source.id.is_empty() {
        String::new()
    } else {
        format!("{}_rollback", source.id)
    };

    let carried = rollback_properties(&source.step_type);
    for key in carried {
        if let Some(value) = source.property(key) {
            node.properties.insert((*key).to_string(), value.clone());
        }
    }
    if let Some(plan) = inherited {
        let (workspace, path_to_module) = match plan {
            Some((workspace, path_to_module)) => (workspace.as_ref(), path_to_module.as_ref()),
            None => (None, None),
        };
        for (key, value) in [(WORKSPACE, workspace), (PATH_TO_MODULE, path_to_module)] {
            if !carried.contains(&key) {
                continue;
            }
            match value {
                Some(value) => node.properties.insert(key.to_string(), value.clone()),
                None => node.properties.remove(key),
            };
        }
    }
    node
}

/// Rollback nodes for the provisioners in `source`, in scan order. `None`
/// when the group holds no provisioner at all.
fn rollback_nodes(source: &PhaseStep, registry: &StepTypeRegistry) -> Option<Vec<Node>> {
    let mut scan = PlanScan::default();
    let mut found = false;
    let mut nodes = Vec::new();

    for node in &source.steps {
        let Some(rollback_kind) = registry.provisioner_rollback(&node.step_type) else {
            continue;
        };
        found = true;
        let provisioner_id = node.str_property(PROVISIONER_ID).unwrap_or_default();

        if node.flag(RUN_PLAN_ONLY) {
            scan.record_plan(provisioner_id, node);
            continue;
        }
        if node.flag(SKIP_ROLLBACK) {
            debug!(node = %node.name, "provisioner rollback skipped");
            continue;
        }
        let inherited = if node.flag(INHERIT_APPROVED_PLAN) {
            if scan.skipped.contains(provisioner_id) {
                debug!(node = %node.name, provisioner = provisioner_id, "approved plan skips rollback");
                continue;
            }
            Some(scan.plans.get(provisioner_id))
        } else {
            None
        };
        nodes.push(rollback_node(node, rollback_kind.clone(), inherited));
    }

    found.then_some(nodes)
}

fn provisioner_group(kind: PhaseStepType, name: &str, nodes: Vec<Node>) -> PhaseStep {
    PhaseStep::new(kind, name).with_steps(nodes).as_rollback()
}

/// Rollback of the pre-deployment provisioners, run before the phases roll
/// back.
pub fn rollback_provisioners(pre_deployment: &PhaseStep, registry: &StepTypeRegistry) -> Option<PhaseStep> {
    rollback_nodes(pre_deployment, registry).map(|nodes| {
        provisioner_group(PhaseStepType::RollbackProvisioners, names::ROLLBACK_PROVISIONERS, nodes)
    })
}

/// Same nodes as [`rollback_provisioners`] in reverse order, run after the
/// phases roll back.
pub fn rollback_provisioners_reverse(
    pre_deployment: &PhaseStep,
    registry: &StepTypeRegistry,
) -> Option<PhaseStep> {
    rollback_nodes(pre_deployment, registry).map(|mut nodes| {
        nodes.reverse();
        provisioner_group(
            PhaseStepType::RollbackProvisioners,
            names::ROLLBACK_PROVISIONERS_REVERSE,
            nodes,
        )
    })
}

/// Rollback of a phase's own provision-infrastructure group.
pub fn rollback_provision_infrastructure(
    provision: &PhaseStep,
    registry: &StepTypeRegistry,
) -> Option<PhaseStep> {
    rollback_nodes(provision, registry).map(|nodes| {
        provisioner_group(
            PhaseStepType::RollbackProvisionInfrastructure,
            names::ROLLBACK_PROVISION_INFRASTRUCTURE,
            nodes,
        )
    })
}

/// Rebuilds the provision rollback at the head of `rollback` from the first
/// group of `forward`. Any stale one is dropped first.
pub fn prepend_provision_rollback(
    forward: &WorkflowPhase,
    rollback: &mut WorkflowPhase,
    registry: &StepTypeRegistry,
) {
    let Some(first) = forward.phase_steps.first() else {
        return;
    };
    if first.phase_step_type != PhaseStepType::ProvisionInfrastructure {
        return;
    }
    rollback
        .phase_steps
        .retain(|ps| ps.phase_step_type != PhaseStepType::RollbackProvisionInfrastructure);
    if let Some(step) = rollback_provision_infrastructure(first, registry) {
        rollback.phase_steps.insert(0, step);
    }
}
