//! Integration tests for workflow validation from JSON documents.
//!
//! Documents use the same camelCase layout the CLI reads from disk.

use serde_json::json;

use phasegrid_model::{
    DeploymentType, FeatureFlag, FeatureSet, GraphError, InMemoryCatalog, OrchestrationWorkflow,
    Service, StepTypeRegistry,
};
use phasegrid_policy::PolicyValidator;

fn helm_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new().with_service(Service::new("svc-helm", "chart", Some(DeploymentType::Helm)))
}

fn document(strategy: &str, failure_types: serde_json::Value) -> OrchestrationWorkflow {
    let doc = json!({
        "strategy": strategy,
        "phases": [{
            "forward": {
                "id": "p1",
                "name": "Phase 1",
                "deploymentType": "HELM",
                "serviceId": "svc-helm",
                "phaseSteps": [{
                    "name": "Deploy Helm",
                    "phaseStepType": "HELM_DEPLOY",
                    "steps": [{"type": "HTTP", "name": "Smoke Test"}],
                    "failureStrategies": [{
                        "failureTypes": failure_types,
                        "repairActionCode": "IGNORE",
                        "specificSteps": ["Smoke Test"]
                    }]
                }]
            }
        }]
    });
    serde_json::from_value(doc).unwrap()
}

#[test]
fn helm_canary_is_rejected_before_infrastructure_is_bound() {
    let catalog = helm_catalog();
    let flags = FeatureSet::new();
    let registry = StepTypeRegistry::builtin();
    let validator = PolicyValidator::new(&catalog, &flags, &registry).for_app("app-1", "acct-1");

    let err = validator
        .validate(&document("CANARY", json!(["APPLICATION_ERROR"])))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Workflow type CANARY is not supported for deployment type Helm"
    );
    assert!(
        validator
            .validate(&document("BASIC", json!(["APPLICATION_ERROR"])))
            .is_ok()
    );
}

#[test]
fn timeout_strategy_follows_the_toggle() {
    let catalog = helm_catalog();
    let registry = StepTypeRegistry::builtin();
    let workflow = document("BASIC", json!(["TIMEOUT_ERROR"]));

    let off = FeatureSet::new();
    let err = PolicyValidator::new(&catalog, &off, &registry)
        .validate(&workflow)
        .unwrap_err();
    assert!(matches!(err, GraphError::Unsupported(_)));

    let on = FeatureSet::new().with(FeatureFlag::TimeoutFailureSupport);
    assert!(PolicyValidator::new(&catalog, &on, &registry).validate(&workflow).is_ok());
}
