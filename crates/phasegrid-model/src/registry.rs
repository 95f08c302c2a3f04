//! Immutable registry of per-kind step facts.
//!
//! Built once with [`StepTypeRegistry::builtin`] and passed by reference to
//! whatever needs to classify nodes.

use std::collections::HashMap;

use crate::step_type::StepType;

/// What the compiler knows about one node kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepDescriptor {
    /// May be named by a timeout-only failure strategy.
    pub timeout_capable: bool,
    /// Always needs the phase service's artifact.
    pub consumes_artifact: bool,
    /// Needs a packaging manifest (helm chart) for the phase service.
    pub consumes_manifest: bool,
    /// Renders Kubernetes manifests; artifact need depends on the manifests.
    pub k8s_manifest: bool,
    /// Picks target hosts inside an INFRASTRUCTURE_NODE step group.
    pub node_select: bool,
    /// Rollback kind generated for a provisioner node.
    pub provisioner_rollback: Option<StepType>,
    /// Properties carried forward when a linked template rewrites the node.
    pub carried_properties: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct StepTypeRegistry {
    descriptors: HashMap<StepType, StepDescriptor>,
}

const TIMEOUT_CAPABLE: &[StepType] = &[
    StepType::ArtifactCollection,
    StepType::EcsServiceSetup,
    StepType::EcsRunTask,
    StepType::EcsDaemonServiceSetup,
    StepType::EcsBgServiceSetup,
    StepType::EcsBgServiceSetupRoute53,
    StepType::EcsServiceDeploy,
    StepType::EcsSteadyStateCheck,
    StepType::EcsListenerUpdate,
    StepType::EcsRoute53DnsWeightUpdate,
    StepType::EcsServiceSetupRollback,
    StepType::EcsServiceRollback,
    StepType::EcsRoute53DnsWeightUpdateRollback,
    StepType::EcsListenerUpdateRollback,
    StepType::K8sCanaryDeploy,
    StepType::K8sBlueGreenDeploy,
    StepType::K8sDeploymentRolling,
    StepType::K8sDeploymentRollingRollback,
    StepType::K8sScale,
    StepType::K8sDelete,
    StepType::K8sApply,
    StepType::Http,
];

const ARTIFACT_CONSUMING: &[StepType] = &[
    StepType::KubernetesSetup,
    StepType::KubernetesDeploy,
    StepType::EcsServiceDeploy,
    StepType::EcsServiceSetup,
    StepType::EcsDaemonServiceSetup,
    StepType::AzureVmssSetup,
    StepType::AzureVmssDeploy,
    StepType::AzureWebappSlotSetup,
    StepType::AzureWebappSlotSwap,
    StepType::AwsAmiServiceSetup,
    StepType::AwsAmiServiceDeploy,
    StepType::AsgAmiServiceAlbShiftSetup,
    StepType::AsgAmiServiceAlbShiftDeploy,
    StepType::SpotinstSetup,
    StepType::SpotinstDeploy,
    StepType::SpotinstAlbShiftSetup,
    StepType::SpotinstAlbShiftDeploy,
    StepType::AwsCodedeployState,
    StepType::AwsLambdaState,
    StepType::PcfSetup,
    StepType::PcfResize,
];

const K8S_MANIFEST: &[StepType] = &[
    StepType::K8sDeploymentRolling,
    StepType::K8sCanaryDeploy,
    StepType::K8sBlueGreenDeploy,
    StepType::K8sApply,
    StepType::RancherK8sDeploymentRolling,
    StepType::RancherK8sCanaryDeploy,
    StepType::RancherK8sBlueGreenDeploy,
];

const MANIFEST_CONSUMING: &[StepType] = &[
    StepType::HelmDeploy,
    StepType::K8sDeploymentRolling,
    StepType::K8sCanaryDeploy,
    StepType::K8sBlueGreenDeploy,
    StepType::K8sApply,
    StepType::K8sDelete,
    StepType::RancherK8sDeploymentRolling,
    StepType::RancherK8sCanaryDeploy,
    StepType::RancherK8sBlueGreenDeploy,
    StepType::RancherK8sDelete,
];

const NODE_SELECT: &[StepType] = &[
    StepType::AwsNodeSelect,
    StepType::DcNodeSelect,
    StepType::AzureNodeSelect,
    StepType::RollingNodeSelect,
];

impl StepTypeRegistry {
    /// The registry every compiler component uses.
    pub fn builtin() -> Self {
        let mut registry = Self {
            descriptors: StepType::known()
                .into_iter()
                .map(|kind| (kind, StepDescriptor::default()))
                .collect(),
        };
        registry.mark(TIMEOUT_CAPABLE, |d| d.timeout_capable = true);
        registry.mark(ARTIFACT_CONSUMING, |d| d.consumes_artifact = true);
        registry.mark(K8S_MANIFEST, |d| d.k8s_manifest = true);
        registry.mark(MANIFEST_CONSUMING, |d| d.consumes_manifest = true);
        registry.mark(NODE_SELECT, |d| d.node_select = true);
        registry.mark(&[StepType::HelmDeploy], |d| {
            d.carried_properties = &["helmReleaseNamePrefix"]
        });

        for (provision, rollback) in [
            (StepType::TerraformProvision, StepType::TerraformRollback),
            (StepType::CloudFormationCreateStack, StepType::CloudFormationRollbackStack),
            (StepType::ArmCreateResource, StepType::ArmRollback),
            (StepType::TerragruntProvision, StepType::TerragruntRollback),
        ] {
            registry.mark(&[provision], |d| {
                d.provisioner_rollback = Some(rollback.clone())
            });
        }
        registry
    }

    fn mark(&mut self, kinds: &[StepType], apply: impl Fn(&mut StepDescriptor)) {
        for kind in kinds {
            apply(self.descriptors.entry(kind.clone()).or_default());
        }
    }

    pub fn descriptor(&self, kind: &StepType) -> Option<&StepDescriptor> {
        self.descriptors.get(kind)
    }

    fn check(&self, kind: &StepType, pred: impl Fn(&StepDescriptor) -> bool) -> bool {
        self.descriptors.get(kind).is_some_and(pred)
    }

    pub fn supports_timeout_failure(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.timeout_capable)
    }

    pub fn consumes_artifact(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.consumes_artifact)
    }

    pub fn consumes_manifest(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.consumes_manifest)
    }

    pub fn is_k8s_manifest(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.k8s_manifest)
    }

    pub fn is_node_select(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.node_select)
    }

    pub fn is_provisioner(&self, kind: &StepType) -> bool {
        self.check(kind, |d| d.provisioner_rollback.is_some())
    }

    pub fn provisioner_rollback(&self, kind: &StepType) -> Option<&StepType> {
        self.descriptors
            .get(kind)
            .and_then(|d| d.provisioner_rollback.as_ref())
    }

    pub fn carried_properties(&self, kind: &StepType) -> &'static [&'static str] {
        self.descriptors
            .get(kind)
            .map(|d| d.carried_properties)
            .unwrap_or(&[])
    }

    /// Wire names of every timeout-capable kind, sorted.
    pub fn timeout_capable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.timeout_capable)
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for StepTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
