//! Workflow-variable bindings and the entity ids they resolve to.

use std::collections::{BTreeMap, BTreeSet};

use phasegrid_model::{OrchestrationWorkflow, TemplateExpression, WorkflowPhase, fields, template};

/// Values supplied for workflow variables at deploy time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: BTreeMap<String, String>,
    /// Unresolved service expressions the caller wants treated as needing
    /// an artifact.
    declared: BTreeSet<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn declare_artifact(mut self, expression: &str) -> Self {
        self.declared.insert(expression.to_string());
        self
    }

    /// Parses `NAME=VALUE`.
    pub fn parse_pair(pair: &str) -> Option<(String, String)> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), value.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_declared(&self, expression: &str) -> bool {
        self.declared.contains(expression)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value bound to the parameter of `field_name`, when the field is
    /// templatized. `None` means the field is not templatized.
    fn templatized_value(
        &self,
        expressions: &[TemplateExpression],
        field_name: &str,
    ) -> Option<Option<&str>> {
        let expression = template::find_expression(expressions, field_name)?;
        Some(expression.parameter_name().and_then(|name| self.get(name)))
    }
}

impl FromIterator<(String, String)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            declared: BTreeSet::new(),
        }
    }
}

/// Service id of a phase, read through the bindings when templatized.
pub fn resolved_service_id(phase: &WorkflowPhase, bindings: &Bindings) -> Option<String> {
    match bindings.templatized_value(&phase.template_expressions, fields::SERVICE_ID) {
        Some(bound) => bound.map(str::to_string),
        None => phase.service_id.clone(),
    }
}

/// Infrastructure definition ids of a phase. A templatized binding may list
/// several ids separated by commas.
pub fn resolved_infra_definition_ids(phase: &WorkflowPhase, bindings: &Bindings) -> Vec<String> {
    match bindings.templatized_value(&phase.template_expressions, fields::INFRA_DEFINITION_ID) {
        Some(Some(bound)) => bound
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        Some(None) => Vec::new(),
        None => phase.infra_definition_id.iter().cloned().collect(),
    }
}

/// Environment id of a workflow, read through the bindings when templatized.
pub fn resolve_environment_id(workflow: &OrchestrationWorkflow, bindings: &Bindings) -> Option<String> {
    match bindings.templatized_value(&workflow.template_expressions, fields::ENV_ID) {
        Some(bound) => bound.map(str::to_string),
        None => workflow.env_id.clone(),
    }
}
