//! Integration tests for required-entity resolution on generated workflows.
//!
//! Phases come from the generator so the resolver sees the same node kinds
//! and properties a real workflow carries.

use phasegrid_generator::{PhaseGenerator, PhaseRequest};
use phasegrid_model::{
    DeploymentType, FeatureSet, InMemoryCatalog, Node, OrchestrationStrategy, OrchestrationWorkflow,
    StepType, StepTypeRegistry, WorkflowPhase,
};
use phasegrid_resolver::{Bindings, RequiredEntityResolver};

fn generated_workflow(deployment_type: DeploymentType, service_id: &str) -> OrchestrationWorkflow {
    let generator = PhaseGenerator::default();
    let mut forward = WorkflowPhase::new("Phase 1", None);
    forward.service_id = Some(service_id.to_string());
    let req = PhaseRequest::new(deployment_type, OrchestrationStrategy::Canary);
    let phase = generator.generate_phase(forward, &req).unwrap();

    let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
    workflow.phases.push(phase);
    workflow
}

#[test]
fn kubernetes_canary_needs_artifact() {
    let catalog = InMemoryCatalog::new();
    let flags = FeatureSet::new();
    let registry = StepTypeRegistry::builtin();
    let resolver = RequiredEntityResolver::new(&catalog, &flags, &registry).unwrap();

    let workflow = generated_workflow(DeploymentType::Kubernetes, "svc-k8s");
    let result = resolver.resolve(&workflow, &Bindings::new()).unwrap();
    assert_eq!(result.artifact_service_ids, vec!["svc-k8s"]);
    assert!(result.warnings.is_empty());
}

#[test]
fn custom_deployment_needs_nothing() {
    let catalog = InMemoryCatalog::new();
    let flags = FeatureSet::new();
    let registry = StepTypeRegistry::builtin();
    let resolver = RequiredEntityResolver::new(&catalog, &flags, &registry).unwrap();

    let workflow = generated_workflow(DeploymentType::Custom, "svc-custom");
    let result = resolver.resolve(&workflow, &Bindings::new()).unwrap();
    assert!(result.artifact_service_ids.is_empty());
    assert!(result.entity_types().is_empty());
}

#[test]
fn resolution_survives_a_json_round_trip() {
    let catalog = InMemoryCatalog::new();
    let flags = FeatureSet::new();
    let registry = StepTypeRegistry::builtin();
    let resolver = RequiredEntityResolver::new(&catalog, &flags, &registry).unwrap();

    let mut workflow = generated_workflow(DeploymentType::Custom, "svc-custom");
    workflow.post_deployment_steps.steps.push(
        Node::new(StepType::Http, "Notify").with_property("url", "https://ci/${artifact.buildNo}"),
    );
    let json = serde_json::to_string(&workflow).unwrap();
    let parsed: OrchestrationWorkflow = serde_json::from_str(&json).unwrap();

    let result = resolver.resolve(&parsed, &Bindings::new()).unwrap();
    assert_eq!(result.artifact_service_ids, vec!["svc-custom"]);
}
