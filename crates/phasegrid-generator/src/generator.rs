//! Phase generation entry points.
//!
//! [`PhaseGenerator`] checks account toggles, looks the (deployment type,
//! strategy) pair up in its [`RuleTable`] and wraps the emitted step groups
//! into a forward phase and its rollback mirror.

use tracing::{debug, info};

use phasegrid_model::{
    DeploymentType, FeatureFlag, FeatureFlags, GraphError, GraphResult, OrchestrationStrategy,
    OrchestrationWorkflow, Phase, PhaseStep, ProvisionerRollbackOrder, StepTypeRegistry,
    WorkflowPhase, names,
};

use crate::provisioner;
use crate::request::PhaseRequest;
use crate::rules::{RulePair, RuleTable};

/// Compiles phase step groups from a [`PhaseRequest`].
#[derive(Debug, Clone)]
pub struct PhaseGenerator {
    rules: RuleTable,
    registry: StepTypeRegistry,
}

impl Default for PhaseGenerator {
    fn default() -> Self {
        Self::new(StepTypeRegistry::builtin())
    }
}

impl PhaseGenerator {
    /// Generator over the built-in rule table.
    pub fn new(registry: StepTypeRegistry) -> Self {
        Self::with_rules(RuleTable::builtin(), registry)
    }

    pub fn with_rules(rules: RuleTable, registry: StepTypeRegistry) -> Self {
        Self { rules, registry }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn registry(&self) -> &StepTypeRegistry {
        &self.registry
    }

    fn rule(&self, req: &PhaseRequest) -> GraphResult<&RulePair> {
        check_toggles(req)?;
        self.rules.lookup(req.deployment_type, req.strategy)
    }

    /// Ordered step groups of the forward phase.
    pub fn generate_phase_steps(&self, req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
        let steps = (self.rule(req)?.forward)(req)?;
        debug!(
            deployment_type = %req.deployment_type,
            strategy = %req.strategy,
            groups = steps.len(),
            "generated phase steps"
        );
        Ok(steps)
    }

    /// Ordered step groups of the rollback phase.
    pub fn generate_rollback_phase_steps(&self, req: &PhaseRequest) -> GraphResult<Vec<PhaseStep>> {
        let steps = (self.rule(req)?.rollback)(req)?;
        debug!(
            deployment_type = %req.deployment_type,
            strategy = %req.strategy,
            groups = steps.len(),
            "generated rollback phase steps"
        );
        Ok(steps)
    }

    /// Fills `forward` with generated step groups and builds its rollback
    /// mirror, including the provision-infrastructure rollback at its head.
    pub fn generate_phase(&self, mut forward: WorkflowPhase, req: &PhaseRequest) -> GraphResult<Phase> {
        let pair = self.rule(req)?;
        forward.deployment_type = Some(req.deployment_type);
        forward.daemon_set = req.daemon_set;
        forward.stateful_set = req.stateful_set;
        forward.rollback = false;
        forward.phase_steps = (pair.forward)(req)?;

        let mut rollback = rollback_phase(&forward, (pair.rollback)(req)?);
        provisioner::prepend_provision_rollback(&forward, &mut rollback, &self.registry);

        info!(
            phase = %forward.id,
            deployment_type = %req.deployment_type,
            strategy = %req.strategy,
            "generated phase"
        );
        Ok(Phase::new(forward, Some(rollback)))
    }

    /// Recomputes both provisioner rollback groups from pre-deployment.
    pub fn update_rollback_provisioners(&self, workflow: &mut OrchestrationWorkflow) {
        let pre = &workflow.pre_deployment_steps;
        workflow.rollback_provisioners = provisioner::rollback_provisioners(pre, &self.registry);
        workflow.rollback_provisioners_reverse =
            provisioner::rollback_provisioners_reverse(pre, &self.registry);
        debug!(
            nodes = workflow.rollback_provisioners.as_ref().map_or(0, |ps| ps.steps.len()),
            "rollback provisioners updated"
        );
    }
}

/// Rollback mirror of `forward` holding `phase_steps`.
pub fn rollback_phase(forward: &WorkflowPhase, phase_steps: Vec<PhaseStep>) -> WorkflowPhase {
    let mut rollback = WorkflowPhase::new(&names::rollback_name(&forward.name), forward.deployment_type);
    rollback.rollback = true;
    rollback.phase_name_for_rollback = Some(forward.name.clone());
    rollback.service_id = forward.service_id.clone();
    rollback.infra_definition_id = forward.infra_definition_id.clone();
    rollback.compute_provider_id = forward.compute_provider_id.clone();
    rollback.daemon_set = forward.daemon_set;
    rollback.stateful_set = forward.stateful_set;
    rollback.phase_steps = phase_steps;
    rollback
}

/// The provisioner rollback group that runs under `order`.
pub fn provisioner_rollback(
    workflow: &OrchestrationWorkflow,
    order: ProvisionerRollbackOrder,
) -> Option<&PhaseStep> {
    match order {
        ProvisionerRollbackOrder::BeforePhases => workflow.rollback_provisioners.as_ref(),
        ProvisionerRollbackOrder::AfterPhases => workflow.rollback_provisioners_reverse.as_ref(),
    }
}

/// Azure types are gated per account. Build workflows never are.
fn check_toggles(req: &PhaseRequest) -> GraphResult<()> {
    if req.strategy == OrchestrationStrategy::Build {
        return Ok(());
    }
    let (flag, label) = match req.deployment_type {
        DeploymentType::AzureVmss => (FeatureFlag::AzureVmss, "Azure VMSS is disabled"),
        DeploymentType::AzureWebapp => {
            (FeatureFlag::AzureWebapp, "Azure WebApp deployment is disabled")
        }
        _ => return Ok(()),
    };
    if req.features.is_enabled(flag, &req.account_id)? {
        return Ok(());
    }
    Err(GraphError::Unsupported(format!(
        "{label} by feature flag for account id : {}",
        req.account_id
    )))
}
