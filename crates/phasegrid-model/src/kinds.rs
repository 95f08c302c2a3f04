//! Small closed enumerations shared by every layer of the compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The deployment technology a phase targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentType {
    Ssh,
    AwsCodedeploy,
    Ecs,
    Spotinst,
    Kubernetes,
    Helm,
    AwsLambda,
    Ami,
    Winrm,
    Pcf,
    AzureVmss,
    AzureWebapp,
    Custom,
}

impl DeploymentType {
    pub const ALL: [DeploymentType; 13] = [
        DeploymentType::Ssh,
        DeploymentType::AwsCodedeploy,
        DeploymentType::Ecs,
        DeploymentType::Spotinst,
        DeploymentType::Kubernetes,
        DeploymentType::Helm,
        DeploymentType::AwsLambda,
        DeploymentType::Ami,
        DeploymentType::Winrm,
        DeploymentType::Pcf,
        DeploymentType::AzureVmss,
        DeploymentType::AzureWebapp,
        DeploymentType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentType::Ssh => "SSH",
            DeploymentType::AwsCodedeploy => "AWS_CODEDEPLOY",
            DeploymentType::Ecs => "ECS",
            DeploymentType::Spotinst => "SPOTINST",
            DeploymentType::Kubernetes => "KUBERNETES",
            DeploymentType::Helm => "HELM",
            DeploymentType::AwsLambda => "AWS_LAMBDA",
            DeploymentType::Ami => "AMI",
            DeploymentType::Winrm => "WINRM",
            DeploymentType::Pcf => "PCF",
            DeploymentType::AzureVmss => "AZURE_VMSS",
            DeploymentType::AzureWebapp => "AZURE_WEBAPP",
            DeploymentType::Custom => "CUSTOM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow orchestration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationStrategy {
    Basic,
    Canary,
    MultiService,
    BlueGreen,
    Rolling,
    Build,
    Custom,
}

impl OrchestrationStrategy {
    pub const ALL: [OrchestrationStrategy; 7] = [
        OrchestrationStrategy::Basic,
        OrchestrationStrategy::Canary,
        OrchestrationStrategy::MultiService,
        OrchestrationStrategy::BlueGreen,
        OrchestrationStrategy::Rolling,
        OrchestrationStrategy::Build,
        OrchestrationStrategy::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationStrategy::Basic => "BASIC",
            OrchestrationStrategy::Canary => "CANARY",
            OrchestrationStrategy::MultiService => "MULTI_SERVICE",
            OrchestrationStrategy::BlueGreen => "BLUE_GREEN",
            OrchestrationStrategy::Rolling => "ROLLING",
            OrchestrationStrategy::Build => "BUILD",
            OrchestrationStrategy::Custom => "CUSTOM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
    }

    /// Basic, rolling and blue/green workflows bind a single service and
    /// infrastructure at workflow level.
    pub fn is_single_target(&self) -> bool {
        matches!(
            self,
            OrchestrationStrategy::Basic
                | OrchestrationStrategy::Rolling
                | OrchestrationStrategy::BlueGreen
        )
    }

    /// Canary and multi-service workflows carry per-phase bindings.
    pub fn is_multi_phase(&self) -> bool {
        matches!(
            self,
            OrchestrationStrategy::Canary | OrchestrationStrategy::MultiService
        )
    }
}

impl fmt::Display for OrchestrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag of a phase step (a step group inside a phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStepType {
    PreDeployment,
    PostDeployment,
    ProvisionInfrastructure,
    RollbackProvisioners,
    RollbackProvisionInfrastructure,
    ClusterSetup,
    ContainerSetup,
    ContainerDeploy,
    InfrastructureNode,
    DisableService,
    DeployService,
    EnableService,
    StopService,
    VerifyService,
    WrapUp,
    PrepareSteps,
    RouteUpdate,
    HelmDeploy,
    EcsUpdateListenerBg,
    #[serde(rename = "ECS_UPDATE_ROUTE_53_DNS_WEIGHT")]
    EcsUpdateRoute53DnsWeight,
    AmiAutoscalingGroupSetup,
    AmiDeployAutoscalingGroup,
    AmiSwitchAutoscalingGroupRoutes,
    SpotinstSetup,
    SpotinstDeploy,
    SpotinstListenerUpdate,
    SpotinstRollback,
    SpotinstListenerUpdateRollback,
    PcfSetup,
    PcfResize,
    #[serde(rename = "PCF_SWICH_ROUTES")]
    PcfSwitchRoutes,
    AzureVmssSetup,
    AzureVmssDeploy,
    AzureVmssSwitchRoutes,
    AzureVmssRollback,
    AzureVmssSwitchRollback,
    AzureWebappSlotSetup,
    AzureWebappSlotTrafficShift,
    AzureWebappSlotSwap,
    AzureWebappSlotRollback,
    DeployAwsLambda,
    #[serde(rename = "DEPLOY_AWSCODEDEPLOY")]
    DeployAwsCodedeploy,
    CustomDeploymentPhaseStep,
    CollectArtifact,
    K8sPhaseStep,
}

/// Category of error a failure strategy reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    Connectivity,
    Authentication,
    VerificationFailure,
    ApplicationError,
    DelegateProvisioning,
    TimeoutError,
    InputTimeoutError,
    PolicyEvaluation,
    ApprovalRejection,
}

/// What the engine does once a failure strategy fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairAction {
    ManualIntervention,
    RollbackWorkflow,
    RollbackProvisionerAfterPhases,
    RollbackPhase,
    Ignore,
    Retry,
    EndExecution,
    AbortWorkflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionScope {
    #[default]
    Workflow,
    WorkflowPhase,
}

/// Execution status of a forward step. Rollback steps name the status that
/// triggers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Skipped,
}

/// Entity a template expression or user variable resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Service,
    Environment,
    InfrastructureDefinition,
    InfrastructureMapping,
    Artifact,
    HelmChart,
    ApmVerification,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceUnitType {
    #[default]
    Count,
    Percentage,
}

impl InstanceUnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceUnitType::Count => "COUNT",
            InstanceUnitType::Percentage => "PERCENTAGE",
        }
    }
}

/// Lifecycle slot a service command fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Start,
    Stop,
    Install,
    Enable,
    Disable,
    Verify,
    Setup,
    Resize,
    Other,
}
