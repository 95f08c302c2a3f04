//! Wait intervals must not be negative.

use phasegrid_model::{GraphError, GraphResult, OrchestrationStrategy, OrchestrationWorkflow};

/// Checks pre/post deployment, both provisioner rollback groups, phases and
/// rollback phases. Custom workflows carry no phase steps and are skipped.
pub fn check_wait_intervals(workflow: &OrchestrationWorkflow) -> GraphResult<()> {
    if workflow.strategy == OrchestrationStrategy::Custom {
        return Ok(());
    }
    let negative = workflow
        .all_phase_steps()
        .chain(workflow.rollback_provisioners.iter())
        .chain(workflow.rollback_provisioners_reverse.iter())
        .find(|ps| ps.wait_interval.is_some_and(|secs| secs < 0));
    match negative {
        Some(step) => Err(GraphError::InvalidValue(format!(
            "Negative values for wait interval not allowed: [{}]",
            step.name
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasegrid_model::{Phase, PhaseStep, PhaseStepType, WorkflowPhase};

    fn workflow_with_rollback_wait(wait: i64) -> OrchestrationWorkflow {
        let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
        let mut rollback = WorkflowPhase::new("Rollback Phase 1", None);
        let mut step = PhaseStep::new(PhaseStepType::WrapUp, "Wrap Up").as_rollback();
        step.wait_interval = Some(wait);
        rollback.phase_steps.push(step);
        workflow
            .phases
            .push(Phase::new(WorkflowPhase::new("Phase 1", None), Some(rollback)));
        workflow
    }

    #[test]
    fn negative_rollback_wait_is_rejected() {
        let err = check_wait_intervals(&workflow_with_rollback_wait(-5)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue(_)));
        assert!(err.to_string().ends_with("[Wrap Up]"));
        assert!(check_wait_intervals(&workflow_with_rollback_wait(0)).is_ok());
    }

    #[test]
    fn provisioner_rollback_is_checked() {
        let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Basic);
        let mut group = PhaseStep::new(PhaseStepType::RollbackProvisioners, "Rollback Provisioners");
        group.wait_interval = Some(-1);
        workflow.rollback_provisioners = Some(group);
        assert!(check_wait_intervals(&workflow).is_err());
    }

    #[test]
    fn custom_workflows_are_skipped() {
        let mut workflow = workflow_with_rollback_wait(-5);
        workflow.strategy = OrchestrationStrategy::Custom;
        assert!(check_wait_intervals(&workflow).is_ok());
    }
}
