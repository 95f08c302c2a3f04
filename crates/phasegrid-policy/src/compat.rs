//! Service, infrastructure and strategy compatibility.

use tracing::debug;

use phasegrid_model::{
    Catalog, DeploymentType, GraphError, GraphResult, InfrastructureDefinition,
    OrchestrationStrategy, ReferenceKind, Service,
};

/// A service with a deployment type must match the definition's type and be
/// in its scope. Services without one predate typing and always pass.
pub fn check_service_infra(service: &Service, infra: &InfrastructureDefinition) -> GraphResult<()> {
    let Some(deployment_type) = service.deployment_type else {
        return Ok(());
    };
    if deployment_type != infra.deployment_type || !infra.is_scoped_to(&service.id) {
        return Err(GraphError::Compatibility(format!(
            "Service [{}] Infrastructure Definition[{}] are not compatible",
            service.id, infra.id
        )));
    }
    Ok(())
}

/// Looks both ids up and checks them against each other. Nothing to check
/// unless both are given.
pub fn check_service_and_infra(
    catalog: &dyn Catalog,
    app_id: &str,
    service_id: Option<&str>,
    infra_definition_id: Option<&str>,
) -> GraphResult<()> {
    let (Some(service_id), Some(infra_id)) = (service_id, infra_definition_id) else {
        return Ok(());
    };
    let service = catalog
        .service(app_id, service_id)?
        .ok_or_else(|| GraphError::missing(ReferenceKind::Service, service_id))?;
    let infra = catalog
        .infrastructure_definition(app_id, infra_id)?
        .ok_or_else(|| GraphError::missing(ReferenceKind::InfrastructureDefinition, infra_id))?;
    check_service_infra(&service, &infra)
}

/// A phase may switch services only to one with the same artifact type and
/// Kubernetes manifest generation. A deleted previous service is not checked.
pub fn check_service_compatibility(
    catalog: &dyn Catalog,
    app_id: &str,
    service_id: Option<&str>,
    old_service_id: Option<&str>,
) -> GraphResult<()> {
    let (Some(service_id), Some(old_service_id)) = (service_id, old_service_id) else {
        return Ok(());
    };
    if service_id == old_service_id || old_service_id.is_empty() {
        return Ok(());
    }
    let Some(old) = catalog.service(app_id, old_service_id)? else {
        debug!(service = %old_service_id, "previous service deleted, skipping compatibility check");
        return Ok(());
    };
    let new = catalog
        .service(app_id, service_id)?
        .ok_or_else(|| GraphError::missing(ReferenceKind::Service, service_id))?;

    if old.artifact_type.is_some() && old.artifact_type != new.artifact_type {
        return Err(GraphError::Compatibility(format!(
            "Service [{}] is not compatible with the service [{}]",
            new.name, old.name
        )));
    }
    if old.k8s_v2 != new.k8s_v2 {
        return Err(GraphError::Compatibility(format!(
            "Service [{}] is not compatible with the service [{}] due to different kubernetes version",
            new.name, old.name
        )));
    }
    Ok(())
}

/// Helm releases cannot be split into canary or blue/green phases.
pub fn check_helm_strategy(
    deployment_type: Option<DeploymentType>,
    strategy: OrchestrationStrategy,
) -> GraphResult<()> {
    let helm_unsupported = matches!(
        strategy,
        OrchestrationStrategy::BlueGreen | OrchestrationStrategy::Canary
    );
    if deployment_type == Some(DeploymentType::Helm) && helm_unsupported {
        return Err(GraphError::Compatibility(format!(
            "Workflow type {strategy} is not supported for deployment type Helm"
        )));
    }
    Ok(())
}

/// Rolling needs SSH hosts or a manifest-driven Kubernetes service;
/// blue/green needs an infrastructure kind that can hold two stacks.
pub fn check_strategy_infra(
    strategy: OrchestrationStrategy,
    infra: &InfrastructureDefinition,
    service: Option<&Service>,
) -> GraphResult<()> {
    match strategy {
        OrchestrationStrategy::Rolling => {
            let k8s_v2 = service.is_some_and(|s| s.k8s_v2);
            if !(infra.kind.supports_rolling() || k8s_v2) {
                return Err(GraphError::Compatibility(
                    "Requested Service/InfrastructureType is not supported using Rolling Deployment"
                        .into(),
                ));
            }
        }
        OrchestrationStrategy::BlueGreen => {
            if !infra.kind.supports_blue_green() {
                return Err(GraphError::Compatibility(
                    "Requested Infrastructure Type is not supported using Blue/Green Deployment".into(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasegrid_model::{InMemoryCatalog, InfrastructureKind};

    fn infra(id: &str, dt: DeploymentType, kind: InfrastructureKind) -> InfrastructureDefinition {
        InfrastructureDefinition {
            id: id.into(),
            name: id.into(),
            deployment_type: dt,
            kind,
            cloud_provider_id: None,
            env_id: None,
            scoped_to_services: Vec::new(),
            load_balancer_id: None,
            cluster_name: None,
            dynamic: false,
        }
    }

    fn service(id: &str, name: &str, artifact_type: Option<&str>, k8s_v2: bool) -> Service {
        let mut s = Service::new(id, name, Some(DeploymentType::Kubernetes));
        s.artifact_type = artifact_type.map(str::to_string);
        s.k8s_v2 = k8s_v2;
        s
    }

    #[test]
    fn deployment_type_mismatch() {
        let svc = Service::new("svc-1", "api", Some(DeploymentType::Ssh));
        let def = infra("infra-1", DeploymentType::Kubernetes, InfrastructureKind::DirectKubernetes);
        let err = check_service_infra(&svc, &def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Service [svc-1] Infrastructure Definition[infra-1] are not compatible"
        );

        let untyped = Service::new("svc-2", "legacy", None);
        assert!(check_service_infra(&untyped, &def).is_ok());
    }

    #[test]
    fn scoped_definition_rejects_other_services() {
        let svc = Service::new("svc-1", "api", Some(DeploymentType::Kubernetes));
        let mut def = infra("infra-1", DeploymentType::Kubernetes, InfrastructureKind::DirectKubernetes);
        def.scoped_to_services = vec!["svc-2".into()];
        assert!(check_service_infra(&svc, &def).is_err());
        def.scoped_to_services.push("svc-1".into());
        assert!(check_service_infra(&svc, &def).is_ok());
    }

    #[test]
    fn missing_entities_are_reported_distinctly() {
        let catalog = InMemoryCatalog::new()
            .with_service(Service::new("svc-1", "api", Some(DeploymentType::Kubernetes)));
        let err = check_service_and_infra(&catalog, "app", Some("svc-1"), Some("gone")).unwrap_err();
        assert!(err.is_missing_reference());
        assert_eq!(err.to_string(), "Infrastructure Definition [gone] does not exist");
        assert!(check_service_and_infra(&catalog, "app", Some("svc-1"), None).is_ok());
    }

    #[test]
    fn service_swap_compatibility() {
        let catalog = InMemoryCatalog::new()
            .with_service(service("old", "old-api", Some("DOCKER"), false))
            .with_service(service("jar", "jar-api", Some("JAR"), false))
            .with_service(service("v2", "v2-api", Some("DOCKER"), true))
            .with_service(service("same", "same-api", Some("DOCKER"), false));

        let err = check_service_compatibility(&catalog, "app", Some("jar"), Some("old")).unwrap_err();
        assert_eq!(err.to_string(), "Service [jar-api] is not compatible with the service [old-api]");

        let err = check_service_compatibility(&catalog, "app", Some("v2"), Some("old")).unwrap_err();
        assert!(err.to_string().ends_with("due to different kubernetes version"));

        assert!(check_service_compatibility(&catalog, "app", Some("same"), Some("old")).is_ok());
        assert!(check_service_compatibility(&catalog, "app", Some("jar"), Some("deleted")).is_ok());
        assert!(
            check_service_compatibility(&catalog, "app", Some("gone"), Some("old"))
                .unwrap_err()
                .is_missing_reference()
        );
    }

    #[test]
    fn helm_rejects_canary_and_blue_green() {
        for strategy in [OrchestrationStrategy::Canary, OrchestrationStrategy::BlueGreen] {
            assert!(check_helm_strategy(Some(DeploymentType::Helm), strategy).is_err());
        }
        assert!(check_helm_strategy(Some(DeploymentType::Helm), OrchestrationStrategy::Basic).is_ok());
        assert!(check_helm_strategy(None, OrchestrationStrategy::Canary).is_ok());
    }

    #[test]
    fn rolling_and_blue_green_infra_kinds() {
        let ssh = infra("i", DeploymentType::Ssh, InfrastructureKind::AwsSsh);
        let k8s = infra("k", DeploymentType::Kubernetes, InfrastructureKind::DirectKubernetes);
        let lambda = infra("l", DeploymentType::AwsLambda, InfrastructureKind::AwsAwsLambda);

        assert!(check_strategy_infra(OrchestrationStrategy::Rolling, &ssh, None).is_ok());
        assert!(check_strategy_infra(OrchestrationStrategy::Rolling, &k8s, None).is_err());
        let v2 = service("v2", "v2", None, true);
        assert!(check_strategy_infra(OrchestrationStrategy::Rolling, &k8s, Some(&v2)).is_ok());

        assert!(check_strategy_infra(OrchestrationStrategy::BlueGreen, &k8s, None).is_ok());
        assert!(check_strategy_infra(OrchestrationStrategy::BlueGreen, &lambda, None).is_err());
        assert!(check_strategy_infra(OrchestrationStrategy::Canary, &lambda, None).is_ok());
    }
}
