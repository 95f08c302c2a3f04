//! The closed set of node kinds a phase step may contain.
//!
//! Nodes are persisted with their kind as a string tag. Every tag the
//! compiler reasons about has its own variant; tags it has never heard of
//! (steps contributed by plugins, newer servers) are kept verbatim in
//! [`StepType::Unrecognized`] so documents survive a read/write cycle.

use std::fmt;

macro_rules! step_types {
    ($( $variant:ident = $name:literal, )+) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StepType {
            $( $variant, )+
            /// A tag outside the known set.
            Unrecognized(String),
        }

        impl StepType {
            /// Wire name of the kind.
            pub fn as_str(&self) -> &str {
                match self {
                    $( StepType::$variant => $name, )+
                    StepType::Unrecognized(name) => name,
                }
            }

            /// Parse a wire name; unknown names become [`StepType::Unrecognized`].
            pub fn parse(name: &str) -> StepType {
                match name {
                    $( $name => StepType::$variant, )+
                    other => StepType::Unrecognized(other.to_string()),
                }
            }

            /// Every known kind, in declaration order.
            pub fn known() -> Vec<StepType> {
                vec![$( StepType::$variant, )+]
            }
        }
    };
}

step_types! {
    // Generic
    Command = "COMMAND",
    Http = "HTTP",
    ShellScript = "SHELL_SCRIPT",
    Approval = "APPROVAL",
    Barrier = "BARRIER",
    ResourceConstraint = "RESOURCE_CONSTRAINT",
    Email = "EMAIL",
    JiraCreateUpdate = "JIRA_CREATE_UPDATE",
    ServicenowCreateUpdate = "SERVICENOW_CREATE_UPDATE",
    ElasticLoadBalancer = "ELASTIC_LOAD_BALANCER",
    ArtifactCheck = "ARTIFACT_CHECK",
    ArtifactCollection = "ARTIFACT_COLLECTION",

    // Node selection
    AwsNodeSelect = "AWS_NODE_SELECT",
    DcNodeSelect = "DC_NODE_SELECT",
    AzureNodeSelect = "AZURE_NODE_SELECT",
    RollingNodeSelect = "ROLLING_NODE_SELECT",

    // Kubernetes (v1 controllers)
    GcpClusterSetup = "GCP_CLUSTER_SETUP",
    KubernetesSetup = "KUBERNETES_SETUP",
    KubernetesDeploy = "KUBERNETES_DEPLOY",
    KubernetesSetupRollback = "KUBERNETES_SETUP_ROLLBACK",
    KubernetesDeployRollback = "KUBERNETES_DEPLOY_ROLLBACK",
    KubernetesSwapServiceSelectors = "KUBERNETES_SWAP_SERVICE_SELECTORS",

    // Kubernetes (v2 manifests)
    K8sDeploymentRolling = "K8S_DEPLOYMENT_ROLLING",
    K8sDeploymentRollingRollback = "K8S_DEPLOYMENT_ROLLING_ROLLBACK",
    K8sCanaryDeploy = "K8S_CANARY_DEPLOY",
    K8sBlueGreenDeploy = "K8S_BLUE_GREEN_DEPLOY",
    K8sScale = "K8S_SCALE",
    K8sDelete = "K8S_DELETE",
    K8sApply = "K8S_APPLY",
    K8sTrafficSplit = "K8S_TRAFFIC_SPLIT",
    RancherK8sDeploymentRolling = "RANCHER_K8S_DEPLOYMENT_ROLLING",
    RancherK8sDeploymentRollingRollback = "RANCHER_K8S_DEPLOYMENT_ROLLING_ROLLBACK",
    RancherK8sCanaryDeploy = "RANCHER_K8S_CANARY_DEPLOY",
    RancherK8sBlueGreenDeploy = "RANCHER_K8S_BLUE_GREEN_DEPLOY",
    RancherK8sDelete = "RANCHER_K8S_DELETE",

    // Helm
    HelmDeploy = "HELM_DEPLOY",
    HelmRollback = "HELM_ROLLBACK",

    // ECS
    EcsServiceSetup = "ECS_SERVICE_SETUP",
    EcsRunTask = "ECS_RUN_TASK",
    EcsDaemonServiceSetup = "ECS_DAEMON_SERVICE_SETUP",
    EcsBgServiceSetup = "ECS_BG_SERVICE_SETUP",
    EcsBgServiceSetupRoute53 = "ECS_BG_SERVICE_SETUP_ROUTE53",
    EcsServiceDeploy = "ECS_SERVICE_DEPLOY",
    EcsSteadyStateCheck = "ECS_STEADY_STATE_CHECK",
    EcsListenerUpdate = "ECS_LISTENER_UPDATE",
    EcsRoute53DnsWeightUpdate = "ECS_ROUTE53_DNS_WEIGHT_UPDATE",
    EcsServiceSetupRollback = "ECS_SERVICE_SETUP_ROLLBACK",
    EcsServiceRollback = "ECS_SERVICE_ROLLBACK",
    EcsRoute53DnsWeightUpdateRollback = "ECS_ROUTE53_DNS_WEIGHT_UPDATE_ROLLBACK",
    EcsListenerUpdateRollback = "ECS_LISTENER_UPDATE_ROLLBACK",

    // AMI autoscaling groups
    AwsAmiServiceSetup = "AWS_AMI_SERVICE_SETUP",
    AwsAmiServiceDeploy = "AWS_AMI_SERVICE_DEPLOY",
    AwsAmiServiceRollback = "AWS_AMI_SERVICE_ROLLBACK",
    AwsAmiSwitchRoutes = "AWS_AMI_SWITCH_ROUTES",
    AwsAmiRollbackSwitchRoutes = "AWS_AMI_ROLLBACK_SWITCH_ROUTES",
    AsgAmiServiceAlbShiftSetup = "ASG_AMI_SERVICE_ALB_SHIFT_SETUP",
    AsgAmiServiceAlbShiftDeploy = "ASG_AMI_SERVICE_ALB_SHIFT_DEPLOY",
    AsgAmiAlbShiftSwitchRoutes = "ASG_AMI_ALB_SHIFT_SWITCH_ROUTES",
    AsgAmiRollbackAlbShiftSwitchRoutes = "ASG_AMI_ROLLBACK_ALB_SHIFT_SWITCH_ROUTES",

    // Spotinst elastigroups
    SpotinstSetup = "SPOTINST_SETUP",
    SpotinstDeploy = "SPOTINST_DEPLOY",
    SpotinstRollback = "SPOTINST_ROLLBACK",
    SpotinstListenerUpdate = "SPOTINST_LISTENER_UPDATE",
    SpotinstListenerUpdateRollback = "SPOTINST_LISTENER_UPDATE_ROLLBACK",
    SpotinstAlbShiftSetup = "SPOTINST_ALB_SHIFT_SETUP",
    SpotinstAlbShiftDeploy = "SPOTINST_ALB_SHIFT_DEPLOY",
    SpotinstListenerAlbShift = "SPOTINST_LISTENER_ALB_SHIFT",
    SpotinstListenerAlbShiftRollback = "SPOTINST_LISTENER_ALB_SHIFT_ROLLBACK",

    // Cloud Foundry
    PcfSetup = "PCF_SETUP",
    PcfResize = "PCF_RESIZE",
    PcfRollback = "PCF_ROLLBACK",
    PcfBgMapRoute = "PCF_BG_MAP_ROUTE",
    PcfPlugin = "PCF_PLUGIN",

    // Azure
    AzureVmssSetup = "AZURE_VMSS_SETUP",
    AzureVmssDeploy = "AZURE_VMSS_DEPLOY",
    AzureVmssRollback = "AZURE_VMSS_ROLLBACK",
    AzureVmssSwitchRoutes = "AZURE_VMSS_SWITCH_ROUTES",
    AzureVmssSwitchRoutesRollback = "AZURE_VMSS_SWITCH_ROUTES_ROLLBACK",
    AzureWebappSlotSetup = "AZURE_WEBAPP_SLOT_SETUP",
    AzureWebappSlotSwap = "AZURE_WEBAPP_SLOT_SWAP",
    AzureWebappSlotShiftTraffic = "AZURE_WEBAPP_SLOT_SHIFT_TRAFFIC",
    AzureWebappSlotRollback = "AZURE_WEBAPP_SLOT_ROLLBACK",

    // Serverless and CodeDeploy
    AwsLambdaState = "AWS_LAMBDA_STATE",
    AwsLambdaRollback = "AWS_LAMBDA_ROLLBACK",
    AwsCodedeployState = "AWS_CODEDEPLOY_STATE",
    AwsCodedeployRollback = "AWS_CODEDEPLOY_ROLLBACK",

    // Custom deployment
    CustomDeploymentFetchInstances = "CUSTOM_DEPLOYMENT_FETCH_INSTANCES",

    // Provisioners
    TerraformProvision = "TERRAFORM_PROVISION",
    TerraformRollback = "TERRAFORM_ROLLBACK",
    TerraformDestroy = "TERRAFORM_DESTROY",
    CloudFormationCreateStack = "CLOUD_FORMATION_CREATE_STACK",
    CloudFormationDeleteStack = "CLOUD_FORMATION_DELETE_STACK",
    CloudFormationRollbackStack = "CLOUD_FORMATION_ROLLBACK_STACK",
    ArmCreateResource = "ARM_CREATE_RESOURCE",
    ArmRollback = "ARM_ROLLBACK",
    TerragruntProvision = "TERRAGRUNT_PROVISION",
    TerragruntRollback = "TERRAGRUNT_ROLLBACK",
    TerragruntDestroy = "TERRAGRUNT_DESTROY",
    ShellScriptProvision = "SHELL_SCRIPT_PROVISION",
}

impl StepType {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, StepType::Unrecognized(_))
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for StepType {
    fn from(name: String) -> Self {
        StepType::parse(&name)
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.as_str().to_string()
    }
}

impl serde::Serialize for StepType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for StepType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(StepType::parse(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_and_unknown() {
        assert_eq!(StepType::parse("HELM_DEPLOY"), StepType::HelmDeploy);
        assert_eq!(
            StepType::parse("NEW_RELIC_DEPLOYMENT_MARKER"),
            StepType::Unrecognized("NEW_RELIC_DEPLOYMENT_MARKER".into())
        );
    }

    #[test]
    fn every_known_name_parses_back() {
        for kind in StepType::known() {
            assert!(kind.is_recognized());
            assert_eq!(StepType::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn unknown_tag_survives_serde() {
        let kind: StepType = serde_json::from_str("\"CUSTOM_PLUGIN\"").unwrap();
        assert!(!kind.is_recognized());
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"CUSTOM_PLUGIN\"");
    }
}
