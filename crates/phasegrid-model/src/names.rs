//! Display names given to generated phase steps and nodes.
//!
//! Rollback step groups point at forward groups by name, so the generator and
//! the reconciler must agree on these strings.

// Phase steps
pub const PROVISION_INFRASTRUCTURE: &str = "Provision Infrastructure";
pub const ROLLBACK_PROVISION_INFRASTRUCTURE: &str = "Rollback Provision Infrastructure";
pub const ROLLBACK_PROVISIONERS: &str = "Rollback Provisioners";
pub const ROLLBACK_PROVISIONERS_REVERSE: &str = "Rollback Provisioners Reverse";
pub const PREPARE_STEPS: &str = "Prepare Steps";
pub const SETUP_CLUSTER: &str = "Setup Cluster";
pub const SETUP_CONTAINER: &str = "Set up Container";
pub const DEPLOY_CONTAINERS: &str = "Deploy Containers";
pub const DEPLOY_SERVICE: &str = "Deploy Service";
pub const DEPLOY: &str = "Deploy";
pub const SETUP: &str = "Setup";
pub const ROLLBACK_SERVICE: &str = "Rollback Service";
pub const VERIFY_SERVICE: &str = "Verify Service";
pub const VERIFY_STAGING: &str = "Verify Staging";
pub const VERIFY_STAGE_SERVICE: &str = "Verify Stage Service";
pub const WRAP_UP: &str = "Wrap Up";
pub const PREPARE_INFRA: &str = "Prepare Infra";
pub const DISABLE_SERVICE: &str = "Disable Service";
pub const ENABLE_SERVICE: &str = "Enable Service";
pub const STOP_SERVICE: &str = "Stop Service";
pub const ROUTE_UPDATE: &str = "Route Update";
pub const ROUTE_UPDATE_ROLLBACK: &str = "Route Update Rollback";
pub const SWAP_TARGET_GROUPS: &str = "Swap Target Groups";
pub const SWAP_ROUTE53_DNS: &str = "Swap Route 53 DNS";
pub const SWAP_ROUTES: &str = "Swap Routes";
pub const UPDATE_ROUTE: &str = "Update Route";
pub const SETUP_AUTOSCALING_GROUP: &str = "Setup AutoScaling Group";
pub const COLLECT_ARTIFACT: &str = "Collect Artifact";

// Nodes
pub const SELECT_NODES: &str = "Select Nodes";
pub const ELASTIC_LOAD_BALANCER: &str = "Elastic Load Balancer";
pub const GCP_CLUSTER_SETUP: &str = "GCP Cluster Setup";
pub const KUBERNETES_SERVICE_SETUP: &str = "Kubernetes Service Setup";
pub const BLUE_GREEN_SERVICE_SETUP: &str = "Blue/Green Service Setup";
pub const UPGRADE_CONTAINERS: &str = "Upgrade Containers";
pub const ROLLBACK_CONTAINERS: &str = "Rollback Containers";
pub const ROLLBACK_KUBERNETES_SETUP: &str = "Rollback Kubernetes Setup";
pub const SWAP_PRIMARY_WITH_STAGE: &str = "Swap Primary with Stage";
pub const HELM_DEPLOY: &str = "Helm Deploy";
pub const HELM_ROLLBACK: &str = "Helm Rollback";
pub const ECS_SERVICE_SETUP: &str = "ECS Service Setup";
pub const ECS_DAEMON_SERVICE_SETUP: &str = "ECS Daemon Service Setup";
pub const SETUP_LOAD_BALANCER: &str = "Setup Load Balancer";
pub const SETUP_ROUTE53: &str = "Setup Route 53";
pub const CHANGE_ROUTE53_WEIGHTS: &str = "Change Route 53 Weights";
pub const ROLLBACK_ROUTE53_WEIGHTS: &str = "Rollback Route 53 Weights";
pub const ROLLBACK_SWAP_TARGET_GROUPS: &str = "Rollback Swap Target Groups";
pub const AWS_AUTOSCALING_GROUP_SETUP: &str = "AWS AutoScaling Group Setup";
pub const UPGRADE_AUTOSCALING_GROUP: &str = "Upgrade AutoScaling Group";
pub const ROLLBACK_AUTOSCALING_GROUP: &str = "Rollback AutoScaling Group";
pub const SWITCH_AUTOSCALING_GROUP_ROUTE: &str = "Switch AutoScaling Group Route";
pub const ROLLBACK_AUTOSCALING_GROUP_ROUTE: &str = "Rollback AutoScaling Group Route";
pub const ASG_AMI_ALB_SHIFT_SETUP: &str = "ASG AMI ALB Shift Setup";
pub const UPGRADE_TRAFFIC_SHIFT_AUTOSCALING_GROUP: &str = "Upgrade Traffic Shift AutoScaling Group";
pub const SHIFT_TRAFFIC_WEIGHT: &str = "Shift Traffic Weight";
pub const SHIFT_TRAFFIC_WEIGHT_ROLLBACK: &str = "Shift Traffic Weight Rollback";
pub const ELASTIGROUP_SETUP: &str = "Elastigroup Setup";
pub const ELASTIGROUP_ALB_SHIFT_SETUP: &str = "Elastigroup ALB Shift Setup";
pub const ELASTIGROUP_DEPLOY: &str = "Elastigroup Deploy";
pub const ELASTIGROUP_ALB_SHIFT_DEPLOY: &str = "Elastigroup ALB Shift Deploy";
pub const ELASTIGROUP_ROLLBACK: &str = "Elastigroup Rollback";
pub const SWAP_PRODUCTION_WITH_STAGE: &str = "Swap Production with Stage";
pub const APP_SETUP: &str = "App Setup";
pub const APP_RESIZE: &str = "App Resize";
pub const APP_ROLLBACK: &str = "App Rollback";
pub const AZURE_VMSS_SETUP: &str = "Azure Virtual Machine Scale Set Setup";
pub const AZURE_VMSS_DEPLOY: &str = "Upgrade Virtual Machine Scale Set";
pub const AZURE_VMSS_ROLLBACK: &str = "Azure Virtual Machine Scale Set Rollback";
pub const AZURE_VMSS_SWITCH_ROUTES: &str = "Swap Virtual Machine Scale Set Route";
pub const AZURE_VMSS_SWITCH_ROUTES_ROLLBACK: &str = "Rollback Virtual Machine Scale Set Route";
pub const SLOT_SETUP: &str = "Slot Setup";
pub const SLOT_DEPLOYMENT: &str = "Slot Deployment";
pub const SHIFT_TRAFFIC_TO_SLOT: &str = "Shift Traffic to Slot";
pub const TRAFFIC_PERCENT: &str = "Traffic %";
pub const SWAP_DEPLOYMENT_SLOTS: &str = "Swap Deployment Slots";
pub const SWAP_SLOT: &str = "Swap Slot";
pub const SLOT_ROLLBACK: &str = "Slot Rollback";
pub const AWS_LAMBDA: &str = "AWS Lambda";
pub const ROLLBACK_AWS_LAMBDA: &str = "Rollback AWS Lambda";
pub const AWS_CODEDEPLOY: &str = "AWS CodeDeploy";
pub const ROLLBACK_AWS_CODEDEPLOY: &str = "Rollback AWS CodeDeploy";
pub const FETCH_INSTANCES: &str = "Fetch Instances";
pub const ARTIFACT_COLLECTION: &str = "Artifact Collection";
pub const ARTIFACT_CHECK: &str = "Artifact Check";

/// Expressions naming the primary and stage services of a blue/green swap.
pub const PRIMARY_SERVICE_NAME_EXPR: &str = "${PRIMARY_SERVICE_NAME}";
pub const STAGE_SERVICE_NAME_EXPR: &str = "${STAGE_SERVICE_NAME}";

pub const ROLLBACK_PREFIX: &str = "Rollback ";

pub fn rollback_name(name: &str) -> String {
    format!("{ROLLBACK_PREFIX}{name}")
}
