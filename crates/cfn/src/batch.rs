//! AWS Batch resources
//!
//! Compute environments, job queues and container job definitions.

use crate::intrinsic::Expr;
use serde::Serialize;
use std::collections::BTreeMap;

/// `ENABLED` / `DISABLED`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Accepts work
    Enabled,
    /// Rejects new work
    Disabled,
}

impl From<bool> for State {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

/// Compute resource pricing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputeResourceType {
    /// On-demand EC2 instances
    Ec2,
    /// Spot instances
    Spot,
}

/// Instance allocation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStrategy {
    /// Cheapest instance type that fits, one at a time
    BestFit,
    /// Best fit, widening to other types when capacity is short
    BestFitProgressive,
    /// Spot pools with the most spare capacity
    SpotCapacityOptimized,
    /// Spot pools balancing price and capacity
    SpotPriceCapacityOptimized,
}

/// `ComputeResources` of a managed compute environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeResources {
    /// On-demand or spot
    #[serde(rename = "Type")]
    pub kind: ComputeResourceType,

    /// Allocation strategy
    pub allocation_strategy: AllocationStrategy,

    /// Maximum spot price as a percentage of on-demand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_percentage: Option<u32>,

    /// Lower vCPU bound
    pub minv_cpus: u32,

    /// Upper vCPU bound
    pub maxv_cpus: u32,

    /// Instance types or families (`optimal` lets Batch choose)
    pub instance_types: Vec<String>,

    /// Instance profile ARN
    pub instance_role: Expr,

    /// Placement subnets
    pub subnets: Vec<Expr>,

    /// Security groups for the instances
    pub security_group_ids: Vec<Expr>,
}

/// `AWS::Batch::ComputeEnvironment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeEnvironment {
    /// Physical name
    pub compute_environment_name: String,

    /// `MANAGED` or `UNMANAGED`
    #[serde(rename = "Type")]
    pub kind: String,

    /// Enabled flag
    pub state: State,

    /// Instance configuration
    pub compute_resources: ComputeResources,
}

/// Compute environment slot of a job queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeEnvironmentOrder {
    /// Compute environment ARN
    pub compute_environment: Expr,

    /// Placement preference, lower first
    pub order: u32,
}

/// `AWS::Batch::JobQueue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobQueue {
    /// Physical name
    pub job_queue_name: String,

    /// Priority across queues sharing compute environments
    pub priority: u32,

    /// Enabled flag
    pub state: State,

    /// Ordered compute environments
    pub compute_environment_order: Vec<ComputeEnvironmentOrder>,
}

/// Attempt timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timeout {
    /// Seconds after which an attempt is terminated
    pub attempt_duration_seconds: u32,
}

/// Retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetryStrategy {
    /// Total attempts
    pub attempts: u32,
}

/// Container resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Memory in MiB
    Memory,
    /// vCPUs
    Vcpu,
    /// GPUs
    Gpu,
}

/// One container resource requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRequirement {
    /// Resource kind
    #[serde(rename = "Type")]
    pub kind: ResourceType,

    /// Amount, as a string
    pub value: String,
}

/// EFS volume settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EfsVolumeConfiguration {
    /// File system to mount
    pub file_system_id: Expr,

    /// Directory of the file system mounted as the volume root
    pub root_directory: String,

    /// `ENABLED` / `DISABLED`
    pub transit_encryption: State,
}

/// Named volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    /// Volume name referenced by mount points
    pub name: String,

    /// EFS backing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efs_volume_configuration: Option<EfsVolumeConfiguration>,
}

/// Mount of a volume inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountPoint {
    /// Volume name
    pub source_volume: String,

    /// Path inside the container
    pub container_path: String,

    /// Mount read-only
    pub read_only: bool,
}

/// Container of a job definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerProperties {
    /// Image URI
    pub image: Expr,

    /// Memory/vCPU/GPU requirements
    pub resource_requirements: Vec<ResourceRequirement>,

    /// Volumes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    /// Mount points
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mount_points: Vec<MountPoint>,
}

/// `AWS::Batch::JobDefinition`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobDefinition {
    /// Physical name
    pub job_definition_name: String,

    /// `container` or `multinode`
    #[serde(rename = "Type")]
    pub kind: String,

    /// `EC2` or `FARGATE`
    pub platform_capabilities: Vec<String>,

    /// Attempt timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,

    /// Retry policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_strategy: Option<RetryStrategy>,

    /// Container
    pub container_properties: ContainerProperties,

    /// Tags (Batch takes a JSON object here, not a list)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_spelling_matches_batch_api() {
        assert_eq!(serde_json::to_value(State::Enabled).ok(), Some(json!("ENABLED")));
        assert_eq!(serde_json::to_value(ComputeResourceType::Ec2).ok(), Some(json!("EC2")));
        assert_eq!(
            serde_json::to_value(AllocationStrategy::SpotCapacityOptimized).ok(),
            Some(json!("SPOT_CAPACITY_OPTIMIZED"))
        );
        assert_eq!(serde_json::to_value(ResourceType::Vcpu).ok(), Some(json!("VCPU")));
    }

    #[test]
    fn test_compute_resources_keys() {
        let resources = ComputeResources {
            kind: ComputeResourceType::Spot,
            allocation_strategy: AllocationStrategy::SpotCapacityOptimized,
            bid_percentage: Some(100),
            minv_cpus: 0,
            maxv_cpus: 256,
            instance_types: vec!["optimal".to_string()],
            instance_role: Expr::get_att("Profile", "Arn"),
            subnets: vec![Expr::reference("Subnet")],
            security_group_ids: vec![Expr::get_att("Sg", "GroupId")],
        };
        let value = serde_json::to_value(&resources).unwrap_or_default();
        assert_eq!(value["Type"], json!("SPOT"));
        assert_eq!(value["MinvCpus"], json!(0));
        assert_eq!(value["MaxvCpus"], json!(256));
        assert_eq!(value["BidPercentage"], json!(100));
    }
}
