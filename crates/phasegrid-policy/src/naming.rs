//! Naming rules. Dots are reserved for expression paths such as
//! `${Phase.Step.output}`, so names may not contain them.

use phasegrid_model::{GraphError, GraphResult, OrchestrationWorkflow, PhaseStep, WorkflowPhase};

const PHASE_STEP_DOTS: &str = "Phase Step name should not contain dots";
const STEP_DOTS: &str = "Step name should not contain dots";

pub fn check_phase_step_names(step: &PhaseStep) -> GraphResult<()> {
    if step.name.contains('.') {
        return Err(GraphError::Naming(PHASE_STEP_DOTS.into()));
    }
    if step.steps.iter().any(|node| node.name.contains('.')) {
        return Err(GraphError::Naming(STEP_DOTS.into()));
    }
    Ok(())
}

/// Checks every group name before any node name.
pub fn check_phase_names(phase: &WorkflowPhase) -> GraphResult<()> {
    if phase.phase_steps.iter().any(|ps| ps.name.contains('.')) {
        return Err(GraphError::Naming(PHASE_STEP_DOTS.into()));
    }
    phase.phase_steps.iter().try_for_each(check_phase_step_names)
}

pub fn check_workflow_names(workflow: &OrchestrationWorkflow) -> GraphResult<()> {
    workflow.all_phase_steps().try_for_each(check_phase_step_names)
}
