//! Integration tests for editing a stored workflow end to end.
//!
//! A workflow is built through the reconciler, re-imported from JSON the way
//! an editor round-trips it, and edited again.

use phasegrid_generator::PhaseGenerator;
use phasegrid_model::{
    DeploymentType, EntityType, FeatureFlag, FeatureSet, InMemoryCatalog, InfrastructureDefinition,
    InfrastructureKind, OrchestrationStrategy, OrchestrationWorkflow, Service, TemplateExpression,
    WorkflowPhase, fields,
};
use phasegrid_policy::PolicyValidator;
use phasegrid_reconcile::{MatchMode, TemplateChange, WorkflowReconciler};

fn catalog() -> InMemoryCatalog {
    let cluster = |id: &str| InfrastructureDefinition {
        id: id.into(),
        name: id.into(),
        deployment_type: DeploymentType::Kubernetes,
        kind: InfrastructureKind::DirectKubernetes,
        cloud_provider_id: Some("k8s-cp".into()),
        env_id: Some("env-1".into()),
        scoped_to_services: Vec::new(),
        load_balancer_id: None,
        cluster_name: Some("main".into()),
        dynamic: false,
    };
    InMemoryCatalog::new()
        .with_service(Service::new("svc-api", "api", Some(DeploymentType::Kubernetes)))
        .with_infrastructure(cluster("k8s-prod"))
        .with_infrastructure(cluster("k8s-qa"))
}

fn bound_phase(name: &str, infra: &str) -> WorkflowPhase {
    let mut phase = WorkflowPhase::new(name, None);
    phase.service_id = Some("svc-api".into());
    phase.infra_definition_id = Some(infra.into());
    phase
}

#[test]
fn canary_edit_cycle_keeps_node_identity() {
    let catalog = catalog();
    let generator = PhaseGenerator::default();
    let reconciler = WorkflowReconciler::new(&catalog, &generator).for_app("app-1", "acct-1");

    let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
    reconciler
        .create_phase(&mut workflow, bound_phase("Phase 1", "k8s-qa"))
        .unwrap();
    reconciler
        .create_phase(&mut workflow, bound_phase("Phase 2", "k8s-prod"))
        .unwrap();
    assert_eq!(workflow.phases.len(), 2);

    let json = serde_json::to_string(&workflow).unwrap();
    let mut stored: OrchestrationWorkflow = serde_json::from_str(&json).unwrap();
    let node_ids: Vec<String> = stored.phases[1].forward.nodes().map(|n| n.id.clone()).collect();

    let mut incoming = stored.phases[1].forward.clone();
    incoming.name = "  Production ".into();
    for node in incoming.phase_steps.iter_mut().flat_map(|ps| ps.steps.iter_mut()) {
        node.id.clear();
    }
    let updated = reconciler
        .update_phase(&mut stored, incoming, MatchMode::ByName)
        .unwrap();
    assert_eq!(updated.name, "Production");
    let kept: Vec<String> = updated.nodes().map(|n| n.id.clone()).collect();
    assert_eq!(kept, node_ids);

    let flags = FeatureSet::new().with(FeatureFlag::TimeoutFailureSupport);
    let validator = PolicyValidator::new(&catalog, &flags, generator.registry());
    validator.validate(&stored).unwrap();
}

#[test]
fn templatizing_the_environment_templatizes_each_phase() {
    let catalog = catalog();
    let generator = PhaseGenerator::default();
    let reconciler = WorkflowReconciler::new(&catalog, &generator);

    let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
    for (name, infra) in [("Phase 1", "k8s-qa"), ("Phase 2", "k8s-prod")] {
        reconciler
            .create_phase(&mut workflow, bound_phase(name, infra))
            .unwrap();
    }

    let env = TemplateExpression::new(fields::ENV_ID, "${Env}", EntityType::Environment);
    reconciler
        .propagate(&mut workflow, &TemplateChange::new(vec![env]).env_changed(true))
        .unwrap();

    assert!(workflow.forward_phases().all(WorkflowPhase::is_infra_templatized));
    assert!(workflow.rollback_phases().all(|p| p.infra_definition_id.is_none()));
    assert!(workflow.has_user_variable("Env"));
    assert!(workflow.has_user_variable("InfraDefinition_KUBERNETES"));
    assert!(workflow.has_user_variable("InfraDefinition_KUBERNETES2"));
}
