//! Integration tests for phase generation through the public facade.
//!
//! Covers the Kubernetes blue/green shape, unsupported combinations and
//! provisioner rollback ordering on a whole workflow.

use serde_json::json;

use phasegrid_generator::{PhaseGenerator, PhaseRequest, provisioner_rollback};
use phasegrid_model::{
    DeploymentType, GraphError, Node, OrchestrationStrategy, OrchestrationWorkflow, PhaseStep,
    PhaseStepType, ProvisionerRollbackOrder, StepType, WorkflowPhase, names,
};

fn types(steps: &[PhaseStep]) -> Vec<PhaseStepType> {
    steps.iter().map(|s| s.phase_step_type).collect()
}

#[test]
fn kubernetes_blue_green_with_setup() {
    let generator = PhaseGenerator::default();
    let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::BlueGreen);
    let steps = generator.generate_phase_steps(&req).unwrap();

    assert_eq!(
        types(&steps),
        vec![
            PhaseStepType::ContainerSetup,
            PhaseStepType::ContainerDeploy,
            PhaseStepType::VerifyService,
            PhaseStepType::RouteUpdate,
            PhaseStepType::WrapUp,
        ]
    );
    assert_eq!(steps[0].steps[0].property("blueGreen"), Some(&json!(true)));
    assert_eq!(steps[1].steps[0].property("instanceCount"), Some(&json!(100)));
    assert_eq!(
        steps[1].steps[0].str_property("instanceUnitType"),
        Some("PERCENTAGE")
    );

    let rollback = generator.generate_rollback_phase_steps(&req).unwrap();
    assert_eq!(rollback.first().unwrap().phase_step_type, PhaseStepType::RouteUpdate);
    assert!(rollback.iter().all(|ps| ps.rollback));
}

#[test]
fn daemon_set_blue_green_is_unsupported() {
    let generator = PhaseGenerator::default();
    let req = PhaseRequest::new(DeploymentType::Kubernetes, OrchestrationStrategy::BlueGreen)
        .with_daemon_set(true);

    let err = generator
        .generate_phase(WorkflowPhase::new("Phase 1", None), &req)
        .unwrap_err();
    assert!(matches!(err, GraphError::Unsupported(_)));
}

#[test]
fn helm_blue_green_is_unsupported() {
    let generator = PhaseGenerator::default();
    let req = PhaseRequest::new(DeploymentType::Helm, OrchestrationStrategy::BlueGreen);
    let err = generator.generate_phase_steps(&req).unwrap_err();
    assert!(err.to_string().contains("not supported for deployment type Helm"));
}

#[test]
fn every_supported_pair_produces_a_phase() {
    let generator = PhaseGenerator::default();
    for (dt, strategy) in generator.rules().pairs() {
        let req = PhaseRequest::new(dt, strategy)
            .with_feature(phasegrid_model::FeatureFlag::AzureVmss)
            .with_feature(phasegrid_model::FeatureFlag::AzureWebapp);
        let phase = generator
            .generate_phase(WorkflowPhase::new("Phase 1", None), &req)
            .unwrap();
        let rollback = phase.rollback.unwrap();
        assert_eq!(rollback.phase_name_for_rollback.as_deref(), Some("Phase 1"));
        assert_eq!(
            rollback.phase_steps.last().unwrap().phase_step_type,
            PhaseStepType::WrapUp,
            "{dt} {strategy}"
        );
    }
}

#[test]
fn reverse_provisioner_rollback_is_exact_reverse() {
    let generator = PhaseGenerator::default();
    let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
    let mut plan = Node::new(StepType::TerraformProvision, "Plan")
        .with_property("provisionerId", "tf-1")
        .with_property("runPlanOnly", true)
        .with_property("workspace", "staging");
    plan.id = "n-plan".into();
    let mut apply = Node::new(StepType::TerraformProvision, "Apply")
        .with_property("provisionerId", "tf-1")
        .with_property("inheritApprovedPlan", true);
    apply.id = "n-apply".into();
    let mut stack = Node::new(StepType::CloudFormationCreateStack, "Stack")
        .with_property("provisionerId", "cf-1")
        .with_property("region", "us-east-1");
    stack.id = "n-stack".into();
    workflow.pre_deployment_steps = PhaseStep::pre_deployment().with_steps([plan, apply, stack]);

    generator.update_rollback_provisioners(&mut workflow);

    let forward = provisioner_rollback(&workflow, ProvisionerRollbackOrder::BeforePhases).unwrap();
    let reverse = provisioner_rollback(&workflow, ProvisionerRollbackOrder::AfterPhases).unwrap();
    assert_eq!(forward.name, names::ROLLBACK_PROVISIONERS);
    assert_eq!(reverse.name, names::ROLLBACK_PROVISIONERS_REVERSE);

    let ids: Vec<_> = forward.steps.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n-apply_rollback", "n-stack_rollback"]);
    assert_eq!(forward.steps[0].str_property("workspace"), Some("staging"));

    let mut reversed = forward.steps.clone();
    reversed.reverse();
    assert_eq!(reverse.steps, reversed);
}
