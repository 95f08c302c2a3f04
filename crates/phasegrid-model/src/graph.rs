//! The workflow graph: nodes grouped into phase steps, phase steps grouped
//! into phases, phases paired with their rollback mirror.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::kinds::{DeploymentType, ExecutionStatus, OrchestrationStrategy, PhaseStepType};
use crate::step_type::StepType;
use crate::strategy::{
    FailureStrategy, StepSkipStrategy, cleanup_failure_strategies, cleanup_skip_strategies,
};
use crate::template::{self, NameValuePair, TemplateExpression, Variable, fields};

/// Ordered node configuration.
pub type Properties = Map<String, Value>;

/// Mint a fresh entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One configured step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Empty until the node is persisted or reconciled.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub rollback: bool,
    /// Linked step template the node inherits its base properties from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_variables: Vec<Variable>,
}

impl Node {
    pub fn new(step_type: StepType, name: &str) -> Self {
        Self {
            id: new_id(),
            step_type,
            name: name.to_string(),
            properties: Properties::new(),
            rollback: false,
            template_uuid: None,
            template_version: None,
            template_variables: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn as_rollback(mut self) -> Self {
        self.rollback = true;
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Boolean flag, accepting `true` and `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        match self.properties.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.template_uuid.is_some()
    }
}

/// A named, ordered group of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStep {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub phase_step_type: PhaseStepType,
    #[serde(default)]
    pub steps: Vec<Node>,
    #[serde(default)]
    pub rollback: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_strategies: Vec<FailureStrategy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_skip_strategies: Vec<StepSkipStrategy>,
    /// Seconds to wait before the step group starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_interval: Option<i64>,
    /// Name of the forward step group this rollback group undoes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_step_name_for_rollback: Option<String>,
    /// Forward status that must be reached for the rollback to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_for_rollback: Option<ExecutionStatus>,
    #[serde(default)]
    pub artifact_needed: bool,
}

impl PhaseStep {
    pub fn new(phase_step_type: PhaseStepType, name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            phase_step_type,
            steps: Vec::new(),
            rollback: false,
            failure_strategies: Vec::new(),
            step_skip_strategies: Vec::new(),
            wait_interval: None,
            phase_step_name_for_rollback: None,
            status_for_rollback: None,
            artifact_needed: false,
        }
    }

    pub fn pre_deployment() -> Self {
        Self::new(PhaseStepType::PreDeployment, "Pre-Deployment")
    }

    pub fn post_deployment() -> Self {
        Self::new(PhaseStepType::PostDeployment, "Post-Deployment")
    }

    pub fn with_step(mut self, node: Node) -> Self {
        self.steps.push(node);
        self
    }

    pub fn with_steps(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.steps.extend(nodes);
        self
    }

    pub fn as_rollback(mut self) -> Self {
        self.rollback = true;
        self
    }

    /// Marks this group as the rollback of `forward_name`, run only when the
    /// forward group succeeded.
    pub fn mirroring(mut self, forward_name: &str) -> Self {
        self.rollback = true;
        self.phase_step_name_for_rollback = Some(forward_name.to_string());
        self.status_for_rollback = Some(ExecutionStatus::Success);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|n| n.name.as_str()).collect()
    }

    /// Removes strategy references to steps that are no longer present.
    pub fn cleanup_strategies(&mut self) {
        let names: Vec<&str> = self.steps.iter().map(|n| n.name.as_str()).collect();
        let ids: Vec<&str> = self.steps.iter().map(|n| n.id.as_str()).collect();
        cleanup_failure_strategies(&mut self.failure_strategies, &names);
        cleanup_skip_strategies(&mut self.step_skip_strategies, &ids);
    }
}

/// One deployment unit: a service deployed to one infrastructure target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPhase {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<DeploymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_definition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_provider_id: Option<String>,
    #[serde(default)]
    pub daemon_set: bool,
    #[serde(default)]
    pub stateful_set: bool,
    #[serde(default)]
    pub phase_steps: Vec<PhaseStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_expressions: Vec<TemplateExpression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable_overrides: Vec<NameValuePair>,
    #[serde(default)]
    pub rollback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_name_for_rollback: Option<String>,
}

impl WorkflowPhase {
    pub fn new(name: &str, deployment_type: Option<DeploymentType>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            deployment_type,
            service_id: None,
            infra_definition_id: None,
            compute_provider_id: None,
            daemon_set: false,
            stateful_set: false,
            phase_steps: Vec::new(),
            template_expressions: Vec::new(),
            variable_overrides: Vec::new(),
            rollback: false,
            phase_name_for_rollback: None,
        }
    }

    pub fn template_expression(&self, field_name: &str) -> Option<&TemplateExpression> {
        template::find_expression(&self.template_expressions, field_name)
    }

    pub fn is_service_templatized(&self) -> bool {
        self.template_expression(fields::SERVICE_ID).is_some()
    }

    pub fn is_infra_templatized(&self) -> bool {
        self.template_expression(fields::INFRA_DEFINITION_ID).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.phase_steps.iter().flat_map(|ps| ps.steps.iter())
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.phase_steps.iter_mut().flat_map(|ps| ps.steps.iter_mut())
    }

    pub fn cleanup_strategies(&mut self) {
        for step in &mut self.phase_steps {
            step.cleanup_strategies();
        }
    }
}

/// A forward phase and its rollback mirror, stored as one entry so the
/// pairing cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub forward: WorkflowPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback: Option<WorkflowPhase>,
}

impl Phase {
    pub fn new(forward: WorkflowPhase, rollback: Option<WorkflowPhase>) -> Self {
        Self { forward, rollback }
    }

    pub fn id(&self) -> &str {
        &self.forward.id
    }
}

/// The canary-family orchestration document the compiler owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationWorkflow {
    pub strategy: OrchestrationStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_id: Option<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default = "PhaseStep::pre_deployment")]
    pub pre_deployment_steps: PhaseStep,
    #[serde(default = "PhaseStep::post_deployment")]
    pub post_deployment_steps: PhaseStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_provisioners: Option<PhaseStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_provisioners_reverse: Option<PhaseStep>,
    /// Passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_rules: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_strategies: Vec<FailureStrategy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_strategy: Option<Value>,
    /// Workflow-level bindings (environment, and service/infra for
    /// single-target strategies).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_expressions: Vec<TemplateExpression>,
}

impl OrchestrationWorkflow {
    pub fn new(strategy: OrchestrationStrategy) -> Self {
        Self {
            strategy,
            env_id: None,
            phases: Vec::new(),
            pre_deployment_steps: PhaseStep::pre_deployment(),
            post_deployment_steps: PhaseStep::post_deployment(),
            rollback_provisioners: None,
            rollback_provisioners_reverse: None,
            notification_rules: Vec::new(),
            failure_strategies: Vec::new(),
            user_variables: Vec::new(),
            concurrency_strategy: None,
            template_expressions: Vec::new(),
        }
    }

    pub fn phase_index(&self, phase_id: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.id() == phase_id)
    }

    pub fn phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id() == phase_id)
    }

    pub fn phase_mut(&mut self, phase_id: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id() == phase_id)
    }

    pub fn forward_phases(&self) -> impl Iterator<Item = &WorkflowPhase> {
        self.phases.iter().map(|p| &p.forward)
    }

    pub fn forward_phases_mut(&mut self) -> impl Iterator<Item = &mut WorkflowPhase> {
        self.phases.iter_mut().map(|p| &mut p.forward)
    }

    pub fn rollback_phases(&self) -> impl Iterator<Item = &WorkflowPhase> {
        self.phases.iter().filter_map(|p| p.rollback.as_ref())
    }

    pub fn rollback_phases_mut(&mut self) -> impl Iterator<Item = &mut WorkflowPhase> {
        self.phases.iter_mut().filter_map(|p| p.rollback.as_mut())
    }

    pub fn is_env_templatized(&self) -> bool {
        template::is_templatized(&self.template_expressions, fields::ENV_ID)
    }

    pub fn has_user_variable(&self, name: &str) -> bool {
        self.user_variables.iter().any(|v| v.name == name)
    }

    /// Adds one mandatory user variable per expression, skipping names that
    /// are already declared.
    pub fn add_to_user_variables(&mut self, expressions: &[TemplateExpression]) {
        for expression in expressions {
            let Some(name) = expression.parameter_name() else {
                continue;
            };
            if self.has_user_variable(name) {
                continue;
            }
            self.user_variables.push(Variable {
                name: name.to_string(),
                entity_type: expression.metadata.entity_type,
                value: None,
                artifact_type: expression.metadata.artifact_type.clone(),
                mandatory: expression.mandatory,
            });
        }
    }

    /// Every phase step that pre/post, phases or rollback phases own.
    pub fn all_phase_steps(&self) -> impl Iterator<Item = &PhaseStep> {
        std::iter::once(&self.pre_deployment_steps)
            .chain(self.phases.iter().flat_map(|p| {
                p.forward
                    .phase_steps
                    .iter()
                    .chain(p.rollback.iter().flat_map(|r| r.phase_steps.iter()))
            }))
            .chain(std::iter::once(&self.post_deployment_steps))
    }
}
