//! Whole-workflow validation.

use tracing::{debug, info};

use phasegrid_model::{
    Catalog, FeatureFlag, FeatureFlags, GraphError, GraphResult, OrchestrationStrategy,
    OrchestrationWorkflow, ReferenceKind, Service, StepTypeRegistry, WorkflowPhase,
};

use crate::compat::{check_helm_strategy, check_service_infra, check_strategy_infra};
use crate::interval::check_wait_intervals;
use crate::naming::check_workflow_names;
use crate::timeout::check_timeout_strategies;

/// Runs every policy rule against a workflow of one application. The
/// first violation aborts validation.
pub struct PolicyValidator<'a> {
    catalog: &'a dyn Catalog,
    flags: &'a dyn FeatureFlags,
    registry: &'a StepTypeRegistry,
    app_id: String,
    account_id: String,
}

impl<'a> PolicyValidator<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        flags: &'a dyn FeatureFlags,
        registry: &'a StepTypeRegistry,
    ) -> Self {
        Self {
            catalog,
            flags,
            registry,
            app_id: String::new(),
            account_id: String::new(),
        }
    }

    pub fn for_app(mut self, app_id: &str, account_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self.account_id = account_id.to_string();
        self
    }

    pub fn validate(&self, workflow: &OrchestrationWorkflow) -> GraphResult<()> {
        self.validate_structure(workflow)?;
        if workflow.strategy != OrchestrationStrategy::Build {
            for phase in workflow.forward_phases() {
                self.validate_phase(workflow.strategy, phase)?;
            }
        }
        info!(
            strategy = %workflow.strategy,
            phases = workflow.phases.len(),
            "workflow passed policy checks"
        );
        Ok(())
    }

    /// Rules that need no catalog lookups: names, failure strategies and
    /// wait intervals.
    pub fn validate_structure(&self, workflow: &OrchestrationWorkflow) -> GraphResult<()> {
        check_workflow_names(workflow)?;
        let timeout_support = self
            .flags
            .is_enabled(FeatureFlag::TimeoutFailureSupport, &self.account_id)?;
        check_timeout_strategies(workflow, self.registry, timeout_support)?;
        check_wait_intervals(workflow)
    }

    /// Service/infrastructure checks for one forward phase. Templatized
    /// bindings are resolved at deploy time and skipped here.
    fn validate_phase(&self, strategy: OrchestrationStrategy, phase: &WorkflowPhase) -> GraphResult<()> {
        let service = match phase.service_id.as_deref() {
            Some(id) if !phase.is_service_templatized() => Some(self.service(id)?),
            _ => None,
        };

        let infra_id = match phase.infra_definition_id.as_deref() {
            Some(id) if !phase.is_infra_templatized() => id,
            _ => {
                debug!(phase = %phase.name, "infrastructure not bound, skipping infra checks");
                let deployment_type = service
                    .as_ref()
                    .and_then(|s| s.deployment_type)
                    .or(phase.deployment_type);
                return check_helm_strategy(deployment_type, strategy);
            }
        };
        let infra = self
            .catalog
            .infrastructure_definition(&self.app_id, infra_id)?
            .ok_or_else(|| GraphError::missing(ReferenceKind::InfrastructureDefinition, infra_id))?;

        if let Some(service) = &service {
            check_service_infra(service, &infra)?;
        }
        let deployment_type = service
            .as_ref()
            .and_then(|s| s.deployment_type)
            .unwrap_or(infra.deployment_type);
        check_helm_strategy(Some(deployment_type), strategy)?;
        check_strategy_infra(strategy, &infra, service.as_ref())
    }

    fn service(&self, service_id: &str) -> GraphResult<Service> {
        self.catalog
            .service(&self.app_id, service_id)?
            .ok_or_else(|| GraphError::missing(ReferenceKind::Service, service_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasegrid_model::{
        DeploymentType, FeatureSet, InMemoryCatalog, InfrastructureDefinition, InfrastructureKind,
        Phase, PhaseStep, PhaseStepType,
    };

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_service(Service::new("svc-1", "api", Some(DeploymentType::Kubernetes)))
            .with_infrastructure(InfrastructureDefinition {
                id: "infra-1".into(),
                name: "cluster".into(),
                deployment_type: DeploymentType::Kubernetes,
                kind: InfrastructureKind::DirectKubernetes,
                cloud_provider_id: Some("gcp".into()),
                env_id: Some("env-1".into()),
                scoped_to_services: Vec::new(),
                load_balancer_id: None,
                cluster_name: None,
                dynamic: false,
            })
    }

    fn workflow(strategy: OrchestrationStrategy, service: &str, infra: &str) -> OrchestrationWorkflow {
        let mut phase = WorkflowPhase::new("Phase 1", Some(DeploymentType::Kubernetes));
        phase.service_id = Some(service.into());
        phase.infra_definition_id = Some(infra.into());
        phase
            .phase_steps
            .push(PhaseStep::new(PhaseStepType::WrapUp, "Wrap Up"));
        let mut workflow = OrchestrationWorkflow::new(strategy);
        workflow.phases.push(Phase::new(phase, None));
        workflow
    }

    #[test]
    fn valid_canary_passes() {
        let catalog = catalog();
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let validator = PolicyValidator::new(&catalog, &flags, &registry);
        assert!(validator.validate(&workflow(OrchestrationStrategy::Canary, "svc-1", "infra-1")).is_ok());
    }

    #[test]
    fn deleted_infrastructure_is_a_missing_reference() {
        let catalog = catalog();
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let validator = PolicyValidator::new(&catalog, &flags, &registry);
        let err = validator
            .validate(&workflow(OrchestrationStrategy::Canary, "svc-1", "gone"))
            .unwrap_err();
        assert!(err.is_missing_reference());
        assert!(
            validator
                .validate_structure(&workflow(OrchestrationStrategy::Canary, "svc-1", "gone"))
                .is_ok()
        );
    }

    #[test]
    fn rolling_on_kubernetes_v1_is_rejected() {
        let catalog = catalog();
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let validator = PolicyValidator::new(&catalog, &flags, &registry);
        let err = validator
            .validate(&workflow(OrchestrationStrategy::Rolling, "svc-1", "infra-1"))
            .unwrap_err();
        assert!(matches!(err, GraphError::Compatibility(_)));
    }

    #[test]
    fn build_workflows_skip_phase_checks() {
        let catalog = catalog();
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let validator = PolicyValidator::new(&catalog, &flags, &registry);
        assert!(validator.validate(&workflow(OrchestrationStrategy::Build, "gone", "gone")).is_ok());
    }
}
