//! Edits to a stored workflow: phase update, rollback phase update, phase
//! creation, cloning and deletion, and pre/post-deployment replacement.
//!
//! Every operation validates first and writes last, so a failed call leaves
//! the workflow as it was.

use tracing::{debug, info};

use phasegrid_generator::{PhaseGenerator, PhaseRequest, prepend_provision_rollback};
use phasegrid_model::{
    Catalog, FeatureSet, GraphError, GraphResult, InfrastructureDefinition, OrchestrationStrategy,
    OrchestrationWorkflow, Phase, PhaseStep, ReferenceKind, Service, StepTypeRegistry,
    TemplateExpression, WorkflowPhase, fields, names, new_id,
};
use phasegrid_policy::{
    check_helm_strategy, check_phase_names, check_phase_step_names, check_service_and_infra,
    check_service_compatibility, check_service_infra,
};

use crate::nodes::{
    MatchMode, artifact_check_required, ensure_artifact_check, preserve_phase_ids,
    preserve_step_ids, refresh_ids, reset_node_selection,
};

/// Applies edits to workflows of one application.
pub struct WorkflowReconciler<'a> {
    pub(crate) catalog: &'a dyn Catalog,
    generator: &'a PhaseGenerator,
    features: FeatureSet,
    pub(crate) app_id: String,
    account_id: String,
}

impl<'a> WorkflowReconciler<'a> {
    pub fn new(catalog: &'a dyn Catalog, generator: &'a PhaseGenerator) -> Self {
        Self {
            catalog,
            generator,
            features: FeatureSet::default(),
            app_id: String::new(),
            account_id: String::new(),
        }
    }

    pub fn for_app(mut self, app_id: &str, account_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self.account_id = account_id.to_string();
        self
    }

    /// Account toggles handed to phase generation.
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub(crate) fn registry(&self) -> &StepTypeRegistry {
        self.generator.registry()
    }

    pub(crate) fn service(&self, service_id: &str) -> GraphResult<Service> {
        self.catalog
            .service(&self.app_id, service_id)?
            .ok_or_else(|| GraphError::missing(ReferenceKind::Service, service_id))
    }

    pub(crate) fn infrastructure(&self, infra_definition_id: &str) -> GraphResult<InfrastructureDefinition> {
        self.catalog
            .infrastructure_definition(&self.app_id, infra_definition_id)?
            .ok_or_else(|| {
                GraphError::missing(ReferenceKind::InfrastructureDefinition, infra_definition_id)
            })
    }

    /// Replaces a forward phase and brings its rollback mirror in line.
    pub fn update_phase<'w>(
        &self,
        workflow: &'w mut OrchestrationWorkflow,
        mut incoming: WorkflowPhase,
        mode: MatchMode,
    ) -> GraphResult<&'w WorkflowPhase> {
        check_phase_names(&incoming)?;
        let rollback_flag_set = incoming.rollback
            || incoming
                .phase_steps
                .iter()
                .any(|ps| ps.rollback || ps.steps.iter().any(|n| n.rollback));
        if rollback_flag_set {
            return Err(GraphError::RollbackFlag(
                "The direct workflow phase should not have rollback flag set!".into(),
            ));
        }
        check_expressions(&incoming.template_expressions)?;
        incoming.cleanup_strategies();

        let index = workflow
            .phase_index(&incoming.id)
            .ok_or_else(|| GraphError::missing(ReferenceKind::Phase, incoming.id.as_str()))?;
        let mut entry = workflow.phases[index].clone();
        let previous = &entry.forward;

        incoming.name = incoming.name.trim().to_string();
        if incoming.service_id.as_deref().is_none_or(str::is_empty) {
            incoming.service_id = previous.service_id.clone();
        }
        preserve_phase_ids(&mut incoming, previous, mode, self.registry());

        let mut infra_changed = false;
        if workflow.strategy != OrchestrationStrategy::Build {
            let service = if incoming.is_service_templatized() {
                None
            } else {
                let id = incoming.service_id.as_deref().unwrap_or_default();
                Some(self.service(id)?)
            };
            let infra = if incoming.is_infra_templatized() {
                None
            } else {
                let id = incoming.infra_definition_id.as_deref().ok_or_else(|| {
                    GraphError::InvalidValue(format!(
                        "Infrastructure Definition is required for phase [{}]",
                        incoming.name
                    ))
                })?;
                Some(self.infrastructure(id)?)
            };
            if let (Some(service), Some(infra)) = (&service, &infra) {
                check_service_infra(service, infra)?;
            }
            if let Some(infra) = &infra {
                incoming.compute_provider_id = infra.cloud_provider_id.clone();
                incoming.deployment_type = Some(infra.deployment_type);
            }
            if !incoming.is_service_templatized() {
                check_service_compatibility(
                    self.catalog,
                    &self.app_id,
                    incoming.service_id.as_deref(),
                    previous.service_id.as_deref(),
                )?;
            }
            infra_changed = !incoming.is_infra_templatized()
                && incoming.infra_definition_id != previous.infra_definition_id;

            if let Some(rollback) = entry.rollback.as_mut() {
                rollback.service_id = incoming.service_id.clone();
                rollback.infra_definition_id = incoming.infra_definition_id.clone();
                rollback.variable_overrides = incoming.variable_overrides.clone();
                if let Some(infra) = &infra {
                    rollback.compute_provider_id = infra.cloud_provider_id.clone();
                    rollback.deployment_type = Some(infra.deployment_type);
                }
                prepend_provision_rollback(&incoming, rollback, self.registry());
            }
        }

        if infra_changed {
            reset_node_selection(&mut incoming, self.registry());
            if let Some(rollback) = entry.rollback.as_mut() {
                reset_node_selection(rollback, self.registry());
            }
        }
        let pulled = workflow.strategy.is_single_target().then(|| shared_expressions(&incoming));
        entry.forward = incoming;

        workflow.phases[index] = entry;
        if let Some(expressions) = pulled {
            set_workflow_expressions(workflow, expressions);
        }
        let phase = &workflow.phases[index].forward;
        info!(phase = %phase.id, infra_changed, "phase updated");
        Ok(phase)
    }

    /// Replaces the rollback mirror of `phase_id`. Every group and node of
    /// `incoming` must carry the rollback flag.
    pub fn update_rollback_phase<'w>(
        &self,
        workflow: &'w mut OrchestrationWorkflow,
        phase_id: &str,
        mut incoming: WorkflowPhase,
        mode: MatchMode,
    ) -> GraphResult<&'w WorkflowPhase> {
        check_phase_names(&incoming)?;
        let all_rollback = incoming.rollback
            && incoming
                .phase_steps
                .iter()
                .all(|ps| ps.rollback && ps.steps.iter().all(|n| n.rollback));
        if !all_rollback {
            return Err(GraphError::RollbackFlag(
                "The rollback workflow phase should have rollback flag set!".into(),
            ));
        }
        incoming.cleanup_strategies();

        let phase = workflow
            .phase_mut(phase_id)
            .ok_or_else(|| GraphError::missing(ReferenceKind::Phase, phase_id))?;
        if let Some(previous) = &phase.rollback {
            preserve_phase_ids(&mut incoming, previous, mode, self.registry());
        }
        if incoming.phase_name_for_rollback.is_none() {
            incoming.phase_name_for_rollback = Some(phase.forward.name.clone());
        }
        debug!(phase = %phase_id, "rollback phase updated");
        let rollback: &WorkflowPhase = phase.rollback.insert(incoming);
        Ok(rollback)
    }

    /// Generates a new phase and its rollback mirror and appends them.
    pub fn create_phase<'w>(
        &self,
        workflow: &'w mut OrchestrationWorkflow,
        mut forward: WorkflowPhase,
    ) -> GraphResult<&'w Phase> {
        let service_id = forward
            .service_id
            .as_deref()
            .filter(|_| !forward.is_service_templatized());
        let infra_id = forward
            .infra_definition_id
            .as_deref()
            .filter(|_| !forward.is_infra_templatized());
        check_service_and_infra(self.catalog, &self.app_id, service_id, infra_id)?;
        let service = service_id.map(|id| self.service(id)).transpose()?;
        let infra = infra_id.map(|id| self.infrastructure(id)).transpose()?;
        let deployment_type = service
            .as_ref()
            .and_then(|s| s.deployment_type)
            .or(infra.as_ref().map(|i| i.deployment_type))
            .or(forward.deployment_type)
            .ok_or_else(|| {
                GraphError::InvalidValue(format!(
                    "Deployment type is required to create phase [{}]",
                    forward.name
                ))
            })?;
        check_helm_strategy(Some(deployment_type), workflow.strategy)?;

        if forward.id.is_empty() {
            forward.id = new_id();
        }
        if forward.name.trim().is_empty() {
            forward.name = format!("Phase {}", workflow.phases.len() + 1);
        }
        if let Some(infra) = &infra {
            forward.compute_provider_id = infra.cloud_provider_id.clone();
        }
        let req = PhaseRequest::new(deployment_type, workflow.strategy)
            .with_account(&self.account_id)
            .with_features(self.features.clone())
            .with_first_phase(workflow.phases.is_empty())
            .with_daemon_set(forward.daemon_set)
            .with_stateful_set(forward.stateful_set)
            .bind(service.as_ref(), infra.as_ref());
        let phase = self.generator.generate_phase(forward, &req)?;

        let check = artifact_check_required(&phase.forward, workflow.strategy);
        workflow.phases.push(phase);
        if check {
            ensure_artifact_check(workflow);
        }
        self.generator.update_rollback_provisioners(workflow);

        let phase = &workflow.phases[workflow.phases.len() - 1];
        info!(phase = %phase.id(), deployment_type = %deployment_type, "phase created");
        Ok(phase)
    }

    /// Appends a copy of `phase_id` named `name`, with fresh ids.
    pub fn clone_phase<'w>(
        &self,
        workflow: &'w mut OrchestrationWorkflow,
        phase_id: &str,
        name: &str,
    ) -> GraphResult<&'w Phase> {
        let source = workflow
            .phase(phase_id)
            .ok_or_else(|| GraphError::missing(ReferenceKind::Phase, phase_id))?;
        let mut copy = source.clone();
        copy.forward.name = name.trim().to_string();
        refresh_ids(&mut copy.forward);
        if let Some(rollback) = copy.rollback.as_mut() {
            refresh_ids(rollback);
            rollback.name = names::rollback_name(&copy.forward.name);
            rollback.phase_name_for_rollback = Some(copy.forward.name.clone());
        }
        workflow.phases.push(copy);

        let phase = &workflow.phases[workflow.phases.len() - 1];
        info!(source = %phase_id, phase = %phase.id(), "phase cloned");
        Ok(phase)
    }

    /// Removes a phase together with its rollback mirror.
    pub fn delete_phase(&self, workflow: &mut OrchestrationWorkflow, phase_id: &str) -> GraphResult<Phase> {
        let index = workflow
            .phase_index(phase_id)
            .ok_or_else(|| GraphError::missing(ReferenceKind::Phase, phase_id))?;
        let removed = workflow.phases.remove(index);
        info!(phase = %phase_id, "phase deleted");
        Ok(removed)
    }

    /// Replaces pre-deployment and regenerates both provisioner rollback
    /// groups from it.
    pub fn update_pre_deployment(
        &self,
        workflow: &mut OrchestrationWorkflow,
        mut step: PhaseStep,
        mode: MatchMode,
    ) -> GraphResult<()> {
        check_phase_step_names(&step)?;
        step.cleanup_strategies();
        preserve_step_ids(&mut step, &workflow.pre_deployment_steps, mode, self.registry());
        workflow.pre_deployment_steps = step;
        self.generator.update_rollback_provisioners(workflow);
        info!(nodes = workflow.pre_deployment_steps.steps.len(), "pre-deployment updated");
        Ok(())
    }

    pub fn update_post_deployment(
        &self,
        workflow: &mut OrchestrationWorkflow,
        mut step: PhaseStep,
        mode: MatchMode,
    ) -> GraphResult<()> {
        check_phase_step_names(&step)?;
        step.cleanup_strategies();
        preserve_step_ids(&mut step, &workflow.post_deployment_steps, mode, self.registry());
        workflow.post_deployment_steps = step;
        self.generator.update_rollback_provisioners(workflow);
        info!(nodes = workflow.post_deployment_steps.steps.len(), "post-deployment updated");
        Ok(())
    }
}

/// Expressions must be plain `${name}` references.
fn check_expressions(expressions: &[TemplateExpression]) -> GraphResult<()> {
    match expressions.iter().find(|e| e.parameter_name().is_none()) {
        Some(bad) => Err(GraphError::Templatization(format!(
            "Template expression [{}] for field [{}] must be of the form ${{name}}",
            bad.expression, bad.field_name
        ))),
        None => Ok(()),
    }
}

fn shared_expressions(phase: &WorkflowPhase) -> Vec<TemplateExpression> {
    phase
        .template_expressions
        .iter()
        .filter(|e| e.field_name == fields::SERVICE_ID || e.field_name == fields::INFRA_DEFINITION_ID)
        .cloned()
        .collect()
}

/// Single-target workflows keep service and infrastructure bindings at
/// workflow level; a phase edit pulls its own up.
fn set_workflow_expressions(workflow: &mut OrchestrationWorkflow, expressions: Vec<TemplateExpression>) {
    workflow
        .template_expressions
        .retain(|e| e.field_name != fields::SERVICE_ID && e.field_name != fields::INFRA_DEFINITION_ID);
    workflow.add_to_user_variables(&expressions);
    workflow.template_expressions.extend(expressions);
}
