//! TIMEOUT_ERROR failure-strategy rules.
//!
//! Timeouts are only meaningful on steps that can observe one, so a
//! strategy that reacts to nothing but timeouts must name such steps.

use std::iter;

use tracing::debug;

use phasegrid_model::{
    FailureStrategy, GraphError, GraphResult, OrchestrationWorkflow, PhaseStep, StepTypeRegistry,
};

/// Workflow-level strategies never handle timeouts.
pub fn check_orchestration_strategies(workflow: &OrchestrationWorkflow) -> GraphResult<()> {
    if workflow
        .failure_strategies
        .iter()
        .any(FailureStrategy::contains_timeout)
    {
        return Err(GraphError::Unsupported(
            "Timeout error is not supported on orchestration level.".into(),
        ));
    }
    Ok(())
}

/// Applies the timeout rules. With `timeout_support` off, any strategy on a
/// forward group that mentions TIMEOUT_ERROR is rejected; with it on, every
/// timeout-only strategy must name timeout-capable steps of its group.
pub fn check_timeout_strategies(
    workflow: &OrchestrationWorkflow,
    registry: &StepTypeRegistry,
    timeout_support: bool,
) -> GraphResult<()> {
    check_orchestration_strategies(workflow)?;

    if !timeout_support {
        let mut forward = iter::once(&workflow.pre_deployment_steps)
            .chain(workflow.forward_phases().flat_map(|p| p.phase_steps.iter()))
            .chain(iter::once(&workflow.post_deployment_steps));
        if forward.any(|ps| ps.failure_strategies.iter().any(FailureStrategy::contains_timeout)) {
            return Err(GraphError::Unsupported("Timeout error is not supported".into()));
        }
        return Ok(());
    }

    for step in workflow.all_phase_steps() {
        for strategy in step
            .failure_strategies
            .iter()
            .filter(|s| s.is_timeout_only())
        {
            check_timeout_steps(step, strategy, registry)?;
        }
    }
    Ok(())
}

fn check_timeout_steps(
    step: &PhaseStep,
    strategy: &FailureStrategy,
    registry: &StepTypeRegistry,
) -> GraphResult<()> {
    let allowed = || format!("[{}]", registry.timeout_capable_names().join(", "));

    if strategy.specific_steps.is_empty() {
        return Err(GraphError::Templatization(format!(
            "Specify the steps for timeout error. Allowed step types are: {}",
            allowed()
        )));
    }

    let capable = |name: &String| {
        step.steps
            .iter()
            .find(|node| node.name == *name)
            .is_some_and(|node| registry.supports_timeout_failure(&node.step_type))
    };
    if let Some(name) = strategy.specific_steps.iter().find(|name| !capable(name)) {
        debug!(phase_step = %step.name, step = %name, "step cannot handle timeout failures");
        return Err(GraphError::Templatization(format!(
            "Timeout error is allowed only for step types: {}",
            allowed()
        )));
    }
    Ok(())
}
