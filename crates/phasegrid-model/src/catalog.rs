//! Collaborator interfaces: service and infrastructure lookups, feature
//! toggles, and in-memory implementations of both.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::kinds::{CommandType, DeploymentType};

/// Feature toggles the compiler consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureFlag {
    TimeoutFailureSupport,
    AzureVmss,
    AzureWebapp,
    HelmChartAsArtifact,
}

impl FeatureFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFlag::TimeoutFailureSupport => "TIMEOUT_FAILURE_SUPPORT",
            FeatureFlag::AzureVmss => "AZURE_VMSS",
            FeatureFlag::AzureWebapp => "AZURE_WEBAPP",
            FeatureFlag::HelmChartAsArtifact => "HELM_CHART_AS_ARTIFACT",
        }
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait FeatureFlags {
    fn is_enabled(&self, flag: FeatureFlag, account_id: &str) -> Result<bool, CatalogError>;
}

/// A fixed set of enabled toggles, the same for every account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    enabled: BTreeSet<FeatureFlag>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: FeatureFlag) -> Self {
        self.enabled.insert(flag);
        self
    }

    pub fn contains(&self, flag: FeatureFlag) -> bool {
        self.enabled.contains(&flag)
    }
}

impl FeatureFlags for FeatureSet {
    fn is_enabled(&self, flag: FeatureFlag, _account_id: &str) -> Result<bool, CatalogError> {
        Ok(self.contains(flag))
    }
}

/// Infrastructure kind behind an infrastructure definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfrastructureKind {
    AwsSsh,
    AwsWinrm,
    PhysicalDataCenterSsh,
    PhysicalDataCenterWinrm,
    AwsAmi,
    AwsAmiSpotinst,
    AwsEcs,
    DirectKubernetes,
    GcpKubernetes,
    AzureKubernetes,
    RancherKubernetes,
    PcfPcf,
    AwsAwsLambda,
    AwsAwsCodedeploy,
    AzureInfra,
    AzureVmss,
    AzureWebapp,
    Custom,
}

impl InfrastructureKind {
    pub fn is_physical_data_center(&self) -> bool {
        matches!(
            self,
            InfrastructureKind::PhysicalDataCenterSsh | InfrastructureKind::PhysicalDataCenterWinrm
        )
    }

    pub fn is_ami(&self) -> bool {
        matches!(self, InfrastructureKind::AwsAmi | InfrastructureKind::AwsAmiSpotinst)
    }

    pub fn is_spotinst(&self) -> bool {
        *self == InfrastructureKind::AwsAmiSpotinst
    }

    /// Host-based kinds that support rolling deployments.
    pub fn supports_rolling(&self) -> bool {
        matches!(
            self,
            InfrastructureKind::AwsSsh | InfrastructureKind::PhysicalDataCenterSsh
        )
    }

    pub fn supports_blue_green(&self) -> bool {
        matches!(
            self,
            InfrastructureKind::DirectKubernetes
                | InfrastructureKind::RancherKubernetes
                | InfrastructureKind::GcpKubernetes
                | InfrastructureKind::AzureKubernetes
                | InfrastructureKind::PcfPcf
                | InfrastructureKind::AwsAmi
                | InfrastructureKind::AwsAmiSpotinst
                | InfrastructureKind::AwsEcs
                | InfrastructureKind::AzureWebapp
                | InfrastructureKind::AzureVmss
        )
    }
}

/// A command defined on a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCommand {
    pub name: String,
    pub command_type: CommandType,
    #[serde(default)]
    pub artifact_needed: bool,
    #[serde(default)]
    pub template_uuid: Option<String>,
    #[serde(default)]
    pub template_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deployment_type: Option<DeploymentType>,
    #[serde(default)]
    pub artifact_type: Option<String>,
    /// Manifest-driven Kubernetes (v2) service.
    #[serde(default)]
    pub k8s_v2: bool,
    /// The service's artifact is its helm chart.
    #[serde(default)]
    pub artifact_from_manifest: bool,
    #[serde(default)]
    pub has_artifact_streams: bool,
    #[serde(default)]
    pub commands: Vec<ServiceCommand>,
}

impl Service {
    pub fn new(id: &str, name: &str, deployment_type: Option<DeploymentType>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            deployment_type,
            artifact_type: None,
            k8s_v2: false,
            artifact_from_manifest: false,
            has_artifact_streams: false,
            commands: Vec::new(),
        }
    }

    /// Case-insensitive lookup by command name.
    pub fn command(&self, name: &str) -> Option<&ServiceCommand> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn commands_of_type(&self, command_type: CommandType) -> Vec<String> {
        self.commands
            .iter()
            .filter(|c| c.command_type == command_type)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Shared command template a service command may link to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub artifact_needed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureDefinition {
    pub id: String,
    pub name: String,
    pub deployment_type: DeploymentType,
    pub kind: InfrastructureKind,
    #[serde(default)]
    pub cloud_provider_id: Option<String>,
    #[serde(default)]
    pub env_id: Option<String>,
    /// Services allowed to use this definition. Empty means any.
    #[serde(default)]
    pub scoped_to_services: Vec<String>,
    #[serde(default)]
    pub load_balancer_id: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// Provisioned at deploy time.
    #[serde(default)]
    pub dynamic: bool,
}

impl InfrastructureDefinition {
    pub fn is_scoped_to(&self, service_id: &str) -> bool {
        self.scoped_to_services.is_empty() || self.scoped_to_services.iter().any(|s| s == service_id)
    }
}

/// Lookups the compiler needs from the surrounding system. Every call may
/// fail; a missing entity is `Ok(None)`.
pub trait Catalog {
    fn service(&self, app_id: &str, service_id: &str) -> Result<Option<Service>, CatalogError>;

    fn infrastructure_definition(
        &self,
        app_id: &str,
        infra_definition_id: &str,
    ) -> Result<Option<InfrastructureDefinition>, CatalogError>;

    fn artifact_streams_exist(&self, app_id: &str, service_id: &str) -> Result<bool, CatalogError>;

    fn manifest_references_artifact(
        &self,
        app_id: &str,
        service_id: &str,
        infra_definition_id: &str,
    ) -> Result<bool, CatalogError>;

    fn command_template(
        &self,
        template_id: &str,
        version: Option<&str>,
    ) -> Result<Option<CommandTemplate>, CatalogError>;
}

/// Manifest facts for one service on one infrastructure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub service_id: String,
    pub infra_definition_id: String,
    #[serde(default)]
    pub references_artifact: bool,
}

/// Catalog held in memory, loadable from a TOML file.
///
/// ```toml
/// [[services]]
/// id = "svc-1"
/// name = "api"
/// deployment_type = "KUBERNETES"
///
/// [[infrastructure_definitions]]
/// id = "infra-1"
/// name = "prod-cluster"
/// deployment_type = "KUBERNETES"
/// kind = "DIRECT_KUBERNETES"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub infrastructure_definitions: Vec<InfrastructureDefinition>,
    #[serde(default)]
    pub command_templates: Vec<CommandTemplate>,
    #[serde(default)]
    pub manifests: Vec<ManifestRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog: InMemoryCatalog = toml::from_str(&content)?;
        Ok(catalog)
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_infrastructure(mut self, infra: InfrastructureDefinition) -> Self {
        self.infrastructure_definitions.push(infra);
        self
    }

    pub fn with_command_template(mut self, template: CommandTemplate) -> Self {
        self.command_templates.push(template);
        self
    }

    pub fn with_manifest(mut self, record: ManifestRecord) -> Self {
        self.manifests.push(record);
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn service(&self, _app_id: &str, service_id: &str) -> Result<Option<Service>, CatalogError> {
        Ok(self.services.iter().find(|s| s.id == service_id).cloned())
    }

    fn infrastructure_definition(
        &self,
        _app_id: &str,
        infra_definition_id: &str,
    ) -> Result<Option<InfrastructureDefinition>, CatalogError> {
        Ok(self
            .infrastructure_definitions
            .iter()
            .find(|i| i.id == infra_definition_id)
            .cloned())
    }

    fn artifact_streams_exist(&self, _app_id: &str, service_id: &str) -> Result<bool, CatalogError> {
        Ok(self
            .services
            .iter()
            .any(|s| s.id == service_id && s.has_artifact_streams))
    }

    fn manifest_references_artifact(
        &self,
        _app_id: &str,
        service_id: &str,
        infra_definition_id: &str,
    ) -> Result<bool, CatalogError> {
        Ok(self.manifests.iter().any(|m| {
            m.service_id == service_id
                && m.infra_definition_id == infra_definition_id
                && m.references_artifact
        }))
    }

    fn command_template(
        &self,
        template_id: &str,
        version: Option<&str>,
    ) -> Result<Option<CommandTemplate>, CatalogError> {
        Ok(self
            .command_templates
            .iter()
            .find(|t| {
                t.id == template_id
                    && (version.is_none() || t.version.as_deref() == version)
            })
            .cloned())
    }
}
