//! phasegrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::{FeatureFlag, FeatureSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub app_id: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            app_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default)]
    pub timeout_failure_support: bool,
    #[serde(default)]
    pub azure_vmss: bool,
    #[serde(default)]
    pub azure_webapp: bool,
    #[serde(default)]
    pub helm_chart_as_artifact: bool,
    #[serde(default)]
    pub rollback_provisioner_after_phases: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "phasegrid=info".to_string(),
        }
    }
}

/// Which provisioner rollback step group runs for a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisionerRollbackOrder {
    /// Provisioners roll back before the phases, in scan order.
    #[default]
    BeforePhases,
    /// Provisioners roll back after the phases, in reverse scan order.
    AfterPhases,
}

impl CompilerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CompilerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn feature_set(&self) -> FeatureSet {
        let f = &self.features;
        [
            (f.timeout_failure_support, FeatureFlag::TimeoutFailureSupport),
            (f.azure_vmss, FeatureFlag::AzureVmss),
            (f.azure_webapp, FeatureFlag::AzureWebapp),
            (f.helm_chart_as_artifact, FeatureFlag::HelmChartAsArtifact),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(FeatureSet::new(), |set, (_, flag)| set.with(flag))
    }

    pub fn provisioner_rollback_order(&self) -> ProvisionerRollbackOrder {
        if self.features.rollback_provisioner_after_phases {
            ProvisionerRollbackOrder::AfterPhases
        } else {
            ProvisionerRollbackOrder::BeforePhases
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[account]
id = "acct-1"
app_id = "app-1"

[features]
timeout_failure_support = true
azure_vmss = true
rollback_provisioner_after_phases = true

[logging]
filter = "phasegrid=debug"
"#;
        let config: CompilerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.account.app_id, "app-1");
        let features = config.feature_set();
        assert!(features.contains(FeatureFlag::TimeoutFailureSupport));
        assert!(features.contains(FeatureFlag::AzureVmss));
        assert!(!features.contains(FeatureFlag::AzureWebapp));
        assert_eq!(config.provisioner_rollback_order(), ProvisionerRollbackOrder::AfterPhases);
        assert_eq!(config.logging.filter, "phasegrid=debug");
    }

    #[test]
    fn test_empty_uses_defaults() {
        let config: CompilerConfig = toml::from_str("").unwrap();
        assert_eq!(config.account.id, "default");
        assert_eq!(config.logging.filter, "phasegrid=info");
        assert_eq!(config.provisioner_rollback_order(), ProvisionerRollbackOrder::BeforePhases);
    }

    #[test]
    fn test_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phasegrid.toml");
        let mut config = CompilerConfig::default();
        config.features.helm_chart_as_artifact = true;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = CompilerConfig::from_file(&path).unwrap();
        assert!(loaded.feature_set().contains(FeatureFlag::HelmChartAsArtifact));
    }
}
