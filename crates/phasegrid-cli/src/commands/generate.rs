//! `phasegrid generate`: compile one phase and print its step groups.

use tracing::info;

use phasegrid_generator::{CreationFlags, PhaseGenerator, PhaseRequest};
use phasegrid_model::{CompilerConfig, DeploymentType, OrchestrationStrategy, WorkflowPhase};

pub struct GenerateOptions {
    pub deployment_type: DeploymentType,
    pub strategy: OrchestrationStrategy,
    pub service_setup: bool,
    pub dynamic_infra: bool,
    pub daemon_set: bool,
    pub stateful_set: bool,
    pub ecs_dns: bool,
    pub alb_shift: bool,
}

pub fn generate(config: &CompilerConfig, opts: &GenerateOptions, json: bool) -> anyhow::Result<()> {
    let req = PhaseRequest::new(opts.deployment_type, opts.strategy)
        .with_account(&config.account.id)
        .with_features(config.feature_set())
        .with_service_setup(opts.service_setup)
        .with_dynamic_infra(opts.dynamic_infra)
        .with_daemon_set(opts.daemon_set)
        .with_stateful_set(opts.stateful_set)
        .with_creation_flags(CreationFlags {
            ecs_bg_dns: opts.ecs_dns,
            alb_traffic_shift: opts.alb_shift,
        });

    let generator = PhaseGenerator::default();
    let phase = generator.generate_phase(WorkflowPhase::new("Phase 1", None), &req)?;
    info!(
        deployment_type = %opts.deployment_type,
        strategy = %opts.strategy,
        "phase compiled"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&phase)?);
        return Ok(());
    }
    print!("{}", format_phase(&phase.forward));
    if let Some(rollback) = &phase.rollback {
        println!();
        print!("{}", format_phase(rollback));
    }
    Ok(())
}

fn format_phase(phase: &WorkflowPhase) -> String {
    let mut out = format!("{}\n", phase.name);
    for (i, group) in phase.phase_steps.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, group.name));
        for node in &group.steps {
            out.push_str(&format!("     - {} ({})\n", node.name, node.step_type));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasegrid_model::{Node, PhaseStep, PhaseStepType, StepType};

    #[test]
    fn text_lists_groups_and_nodes() {
        let mut phase = WorkflowPhase::new("Phase 1", None);
        phase.phase_steps.push(
            PhaseStep::new(PhaseStepType::DeployService, "Deploy Service")
                .with_step(Node::new(StepType::Http, "Ping")),
        );
        phase.phase_steps.push(PhaseStep::new(PhaseStepType::WrapUp, "Wrap Up"));
        assert_eq!(
            format_phase(&phase),
            "Phase 1\n  1. Deploy Service\n     - Ping (HTTP)\n  2. Wrap Up\n"
        );
    }
}
