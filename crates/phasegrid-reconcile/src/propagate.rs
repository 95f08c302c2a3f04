//! Pushes workflow-level binding changes down into the phases.
//!
//! Single-target workflows (basic, rolling, blue/green) share one service
//! and infrastructure across phases, so the workflow's bindings overwrite
//! each phase. Canary and multi-service phases keep their own bindings;
//! templatizing the environment forces each phase's infrastructure to be
//! templatized as well.

use std::slice;

use tracing::{debug, info};

use phasegrid_model::{
    EntityType, GraphError, GraphResult, OrchestrationWorkflow, TemplateExpression, WorkflowPhase,
    fields, template,
};
use phasegrid_policy::check_service_compatibility;

use crate::nodes::reset_node_selection;
use crate::update::WorkflowReconciler;

const INFRA_VARIABLE_PREFIX: &str = "InfraDefinition_";

/// A change to a workflow's bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateChange {
    /// Workflow-level expressions after the change.
    pub expressions: Vec<TemplateExpression>,
    pub service_id: Option<String>,
    pub infra_definition_id: Option<String>,
    pub env_changed: bool,
    pub infra_changed: bool,
}

impl TemplateChange {
    pub fn new(expressions: Vec<TemplateExpression>) -> Self {
        Self {
            expressions,
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }

    pub fn with_infra_definition(mut self, infra_definition_id: &str) -> Self {
        self.infra_definition_id = Some(infra_definition_id.to_string());
        self
    }

    pub fn env_changed(mut self, changed: bool) -> Self {
        self.env_changed = changed;
        self
    }

    pub fn infra_changed(mut self, changed: bool) -> Self {
        self.infra_changed = changed;
        self
    }

    fn expression(&self, field_name: &str) -> Option<&TemplateExpression> {
        template::find_expression(&self.expressions, field_name)
    }
}

impl WorkflowReconciler<'_> {
    /// Applies `change` to every phase. On error the workflow is unchanged.
    pub fn propagate(&self, workflow: &mut OrchestrationWorkflow, change: &TemplateChange) -> GraphResult<()> {
        let mut updated = workflow.clone();
        if updated.strategy.is_single_target() {
            self.propagate_single_target(&mut updated, change)?;
        } else if updated.strategy.is_multi_phase() {
            self.propagate_multi_phase(&mut updated, change)?;
        }
        updated.template_expressions = change.expressions.clone();
        *workflow = updated;

        info!(
            strategy = %workflow.strategy,
            env_changed = change.env_changed,
            infra_changed = change.infra_changed,
            "workflow bindings propagated"
        );
        Ok(())
    }

    fn propagate_single_target(
        &self,
        workflow: &mut OrchestrationWorkflow,
        change: &TemplateChange,
    ) -> GraphResult<()> {
        if let Some(env) = change.expression(fields::ENV_ID) {
            if change.expression(fields::INFRA_DEFINITION_ID).is_none() {
                let message = if workflow.forward_phases().any(WorkflowPhase::is_infra_templatized) {
                    "Infrastructure Definition cannot be de-templatized because Environment is templatized"
                } else {
                    "Infrastructure Definition must be templatized when Environment is templatized"
                };
                return Err(GraphError::Templatization(message.into()));
            }
            workflow.add_to_user_variables(slice::from_ref(env));
        }

        for phase in workflow.forward_phases_mut() {
            set_phase_expressions(phase, &change.expressions);
            if !phase.is_service_templatized() {
                check_service_compatibility(
                    self.catalog,
                    &self.app_id,
                    change.service_id.as_deref(),
                    phase.service_id.as_deref(),
                )?;
            }
            if let Some(service_id) = &change.service_id {
                phase.service_id = Some(service_id.clone());
            }
            self.apply_infra(phase, change)?;
            if change.infra_changed || change.env_changed {
                reset_node_selection(phase, self.registry());
            }
        }

        for rollback in workflow.rollback_phases_mut() {
            if let Some(service_id) = &change.service_id {
                rollback.service_id = Some(service_id.clone());
            }
            self.apply_infra(rollback, change)?;
        }
        Ok(())
    }

    /// Binds the new infrastructure definition, or drops the old one when
    /// only the environment moved.
    fn apply_infra(&self, phase: &mut WorkflowPhase, change: &TemplateChange) -> GraphResult<()> {
        match change.infra_definition_id.as_deref() {
            Some(id) if phase.infra_definition_id.as_deref() != Some(id) => {
                let infra = self.infrastructure(id)?;
                phase.infra_definition_id = Some(id.to_string());
                phase.compute_provider_id = infra.cloud_provider_id.clone();
                phase.deployment_type = Some(infra.deployment_type);
                reset_node_selection(phase, self.registry());
            }
            None if change.env_changed && !change.infra_changed => unset_infra(phase),
            _ => {}
        }
        Ok(())
    }

    fn propagate_multi_phase(
        &self,
        workflow: &mut OrchestrationWorkflow,
        change: &TemplateChange,
    ) -> GraphResult<()> {
        workflow.add_to_user_variables(&change.expressions);
        let env_templatized = change.expression(fields::ENV_ID).is_some();

        for index in 0..workflow.phases.len() {
            let phase = &mut workflow.phases[index].forward;
            if change.infra_changed {
                reset_node_selection(phase, self.registry());
            }
            if env_templatized && !phase.is_infra_templatized() {
                self.templatize_infra(workflow, index)?;
            }
        }

        for rollback in workflow.rollback_phases_mut() {
            if change.env_changed {
                unset_infra(rollback);
            }
            if change.env_changed || change.infra_changed {
                reset_node_selection(rollback, self.registry());
            }
        }
        Ok(())
    }

    /// Mints an `InfraDefinition_<DEPLOYMENT_TYPE>` variable for the phase
    /// at `index`, suffixed with a number when the name is taken.
    fn templatize_infra(&self, workflow: &mut OrchestrationWorkflow, index: usize) -> GraphResult<()> {
        let phase = &workflow.phases[index].forward;
        let deployment_type = match phase.service_id.as_deref() {
            Some(id) if !phase.is_service_templatized() => {
                self.service(id)?.deployment_type.or(phase.deployment_type)
            }
            _ => phase.deployment_type,
        };
        let Some(deployment_type) = deployment_type else {
            return Err(GraphError::Templatization(format!(
                "Infrastructure of phase [{}] cannot be templatized without a deployment type",
                phase.name
            )));
        };

        let name = unique_variable_name(workflow, &format!("{INFRA_VARIABLE_PREFIX}{deployment_type}"));
        let expression = TemplateExpression::new(
            fields::INFRA_DEFINITION_ID,
            &format!("${{{name}}}"),
            EntityType::InfrastructureDefinition,
        );
        workflow.add_to_user_variables(slice::from_ref(&expression));
        let phase = &mut workflow.phases[index].forward;
        debug!(phase = %phase.name, variable = %name, "infrastructure templatized");
        phase.template_expressions.push(expression);
        Ok(())
    }
}

/// Replaces the phase's service and infrastructure expressions with the
/// workflow's. Other expressions stay.
fn set_phase_expressions(phase: &mut WorkflowPhase, expressions: &[TemplateExpression]) {
    let shared = |e: &TemplateExpression| {
        e.field_name == fields::SERVICE_ID || e.field_name == fields::INFRA_DEFINITION_ID
    };
    phase.template_expressions.retain(|e| !shared(e));
    phase
        .template_expressions
        .extend(expressions.iter().filter(|e| shared(e)).cloned());
}

fn unset_infra(phase: &mut WorkflowPhase) {
    phase.infra_definition_id = None;
    phase.compute_provider_id = None;
}

fn unique_variable_name(workflow: &OrchestrationWorkflow, base: &str) -> String {
    let taken = |name: &str| {
        workflow.has_user_variable(name)
            || workflow
                .forward_phases()
                .flat_map(|p| p.template_expressions.iter())
                .any(|e| e.parameter_name() == Some(name))
    };
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while taken(&candidate) {
        candidate = format!("{base}{suffix}");
        suffix += 1;
    }
    candidate
}
