//! Inputs to phase generation.
//!
//! A [`PhaseRequest`] is a plain value: the caller resolves the service,
//! infrastructure definition and feature toggles before generation, so every
//! rule stays a pure function of its request.

use std::collections::BTreeMap;

use phasegrid_model::{
    CommandType, DeploymentType, FeatureFlag, FeatureSet, InfrastructureDefinition,
    InfrastructureKind, OrchestrationStrategy, Service,
};

/// Options picked when a workflow is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationFlags {
    /// ECS blue/green swaps Route 53 DNS weights instead of ELB target groups.
    pub ecs_bg_dns: bool,
    /// AMI/Spotinst blue/green shifts ALB traffic weights gradually.
    pub alb_traffic_shift: bool,
}

/// What generation needs to know about the target infrastructure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfraTraits {
    /// `None` when no definition is bound yet; kind checks then pass.
    pub kind: Option<InfrastructureKind>,
    pub load_balancer: bool,
    /// GKE cluster created at runtime.
    pub gke_runtime_cluster: bool,
}

const RUNTIME_CLUSTER: &str = "RUNTIME";

impl InfraTraits {
    pub fn from_definition(infra: &InfrastructureDefinition) -> Self {
        Self {
            kind: Some(infra.kind),
            load_balancer: infra
                .load_balancer_id
                .as_deref()
                .is_some_and(|lb| !lb.trim().is_empty()),
            gke_runtime_cluster: infra.kind == InfrastructureKind::GcpKubernetes
                && infra.cluster_name.as_deref() == Some(RUNTIME_CLUSTER),
        }
    }

    pub fn of_kind(kind: InfrastructureKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// True when the kind matches, or when the kind is unknown.
    pub fn is(&self, pred: impl Fn(&InfrastructureKind) -> bool) -> bool {
        self.kind.as_ref().is_none_or(pred)
    }

    pub fn is_spotinst(&self) -> bool {
        self.kind.is_some_and(|k| k.is_spotinst())
    }

    pub fn is_physical_data_center(&self) -> bool {
        self.kind.is_some_and(|k| k.is_physical_data_center())
    }
}

/// Service command names grouped by lifecycle slot, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCommands {
    by_type: BTreeMap<CommandType, Vec<String>>,
}

impl ServiceCommands {
    pub fn from_service(service: &Service) -> Self {
        let mut commands = Self::default();
        for command in &service.commands {
            commands = commands.with(command.command_type, &command.name);
        }
        commands
    }

    pub fn with(mut self, command_type: CommandType, name: &str) -> Self {
        self.by_type
            .entry(command_type)
            .or_default()
            .push(name.to_string());
        self
    }

    pub fn names(&self, command_type: CommandType) -> &[String] {
        self.by_type
            .get(&command_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Defaults for the CodeDeploy state, present when the service has an S3
/// artifact stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDefaults {
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub bundle_type: Option<String>,
}

/// Everything a rule needs to emit the step groups of one phase.
#[derive(Debug, Clone)]
pub struct PhaseRequest {
    pub account_id: String,
    pub deployment_type: DeploymentType,
    pub strategy: OrchestrationStrategy,
    pub service_setup_required: bool,
    pub dynamic_infra: bool,
    /// First phase of the workflow; Azure WebApp canary sets the slot up only there.
    pub first_phase: bool,
    pub daemon_set: bool,
    pub stateful_set: bool,
    pub creation: CreationFlags,
    pub infra: InfraTraits,
    pub commands: ServiceCommands,
    pub state_defaults: StateDefaults,
    pub features: FeatureSet,
}

impl PhaseRequest {
    pub fn new(deployment_type: DeploymentType, strategy: OrchestrationStrategy) -> Self {
        Self {
            account_id: String::new(),
            deployment_type,
            strategy,
            service_setup_required: true,
            dynamic_infra: false,
            first_phase: true,
            daemon_set: false,
            stateful_set: false,
            creation: CreationFlags::default(),
            infra: InfraTraits::default(),
            commands: ServiceCommands::default(),
            state_defaults: StateDefaults::default(),
            features: FeatureSet::default(),
        }
    }

    pub fn with_account(mut self, account_id: &str) -> Self {
        self.account_id = account_id.to_string();
        self
    }

    pub fn with_service_setup(mut self, required: bool) -> Self {
        self.service_setup_required = required;
        self
    }

    pub fn with_dynamic_infra(mut self, dynamic: bool) -> Self {
        self.dynamic_infra = dynamic;
        self
    }

    pub fn with_first_phase(mut self, first: bool) -> Self {
        self.first_phase = first;
        self
    }

    pub fn with_daemon_set(mut self, daemon_set: bool) -> Self {
        self.daemon_set = daemon_set;
        self
    }

    pub fn with_stateful_set(mut self, stateful_set: bool) -> Self {
        self.stateful_set = stateful_set;
        self
    }

    pub fn with_creation_flags(mut self, creation: CreationFlags) -> Self {
        self.creation = creation;
        self
    }

    pub fn with_infra(mut self, infra: InfraTraits) -> Self {
        self.infra = infra;
        self
    }

    pub fn with_commands(mut self, commands: ServiceCommands) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_state_defaults(mut self, defaults: StateDefaults) -> Self {
        self.state_defaults = defaults;
        self
    }

    pub fn with_feature(mut self, flag: FeatureFlag) -> Self {
        self.features = self.features.with(flag);
        self
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Binds service commands and infrastructure traits from catalog entries.
    pub fn bind(mut self, service: Option<&Service>, infra: Option<&InfrastructureDefinition>) -> Self {
        if let Some(service) = service {
            self.commands = ServiceCommands::from_service(service);
        }
        if let Some(infra) = infra {
            self.infra = InfraTraits::from_definition(infra);
            self.dynamic_infra = infra.dynamic;
        }
        self
    }

    pub fn is_blue_green(&self) -> bool {
        self.strategy == OrchestrationStrategy::BlueGreen
    }

    pub fn is_daemon_or_stateful(&self) -> bool {
        self.daemon_set || self.stateful_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasegrid_model::ServiceCommand;

    #[test]
    fn infra_traits_from_gke_runtime() {
        let mut infra = InfrastructureDefinition {
            id: "i".into(),
            name: "gke".into(),
            deployment_type: DeploymentType::Kubernetes,
            kind: InfrastructureKind::GcpKubernetes,
            cloud_provider_id: None,
            env_id: None,
            scoped_to_services: Vec::new(),
            load_balancer_id: Some("  ".into()),
            cluster_name: Some("RUNTIME".into()),
            dynamic: false,
        };
        let traits = InfraTraits::from_definition(&infra);
        assert!(traits.gke_runtime_cluster);
        assert!(!traits.load_balancer);

        infra.cluster_name = Some("prod".into());
        assert!(!InfraTraits::from_definition(&infra).gke_runtime_cluster);
    }

    #[test]
    fn unknown_infra_passes_kind_checks() {
        let traits = InfraTraits::default();
        assert!(traits.is(InfrastructureKind::is_ami));
        assert!(!traits.is_spotinst());
        let traits = InfraTraits::of_kind(InfrastructureKind::AwsEcs);
        assert!(!traits.is(InfrastructureKind::is_ami));
    }

    #[test]
    fn commands_grouped_by_type() {
        let mut service = Service::new("s", "svc", Some(DeploymentType::Ssh));
        for (name, ct) in [
            ("Install", CommandType::Install),
            ("Stop", CommandType::Stop),
            ("Install Agent", CommandType::Install),
        ] {
            service.commands.push(ServiceCommand {
                name: name.into(),
                command_type: ct,
                artifact_needed: false,
                template_uuid: None,
                template_version: None,
            });
        }
        let commands = ServiceCommands::from_service(&service);
        assert_eq!(commands.names(CommandType::Install), ["Install", "Install Agent"]);
        assert!(commands.names(CommandType::Verify).is_empty());
    }
}
