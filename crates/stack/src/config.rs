//! Stack configuration contract
//!
//! `StackConfig` is the single, versioned input of a synthesis run. It is
//! read from a YAML file (camelCase keys), overlaid with command-line or
//! environment overrides, and then validated in one pass. Nothing is
//! declared in the construction graph until `validate` has succeeded.

use crate::error::{ConfigError, SynthError};
use crate::provision::network::allocate_subnets;
use crate::versions::{VersionList, VersionsInput};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Only configuration contract understood by this release
pub const CONFIG_VERSION: u32 = 1;

/// Description attached to the stack when the configuration sets none
pub const DEFAULT_DESCRIPTION: &str = "BRENDER-STUDIO-STACK: This stack deploys all the essential resources to enable rendering Blender scenes in the cloud using AWS. It includes configurations for services such as AWS Batch, Amazon ECS, Amazon ECR, and Amazon EFS, providing a robust and scalable infrastructure for efficiently and reliably executing rendering jobs.";

/// Complete input of a synthesis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StackConfig {
    /// Contract version, must be 1
    pub version: u32,

    /// CloudFormation stack name
    pub stack_name: String,

    /// Stack description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Blender versions, comma-delimited or as a list; one job definition each
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blender_versions: Option<VersionsInput>,

    /// Name of the render bucket (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    /// Place compute instances in private subnets instead of public ones
    pub private: bool,

    /// VPC layout
    pub network: NetworkConfig,

    /// Shared security group
    pub security_group: SecurityGroupConfig,

    /// File system and access point
    pub storage: StorageConfig,

    /// Batch compute pools and job definitions
    pub compute: ComputeConfig,

    /// Read API
    pub api: ApiConfig,

    /// Flow logs
    pub observability: ObservabilityConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            stack_name: "BRENDER-STACK-V1".to_string(),
            description: None,
            blender_versions: None,
            bucket_name: None,
            private: false,
            network: NetworkConfig::default(),
            security_group: SecurityGroupConfig::default(),
            storage: StorageConfig::default(),
            compute: ComputeConfig::default(),
            api: ApiConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Subnet tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SubnetTier {
    /// Routed to the internet gateway
    Public,
    /// No inbound route from the internet; egress through VPC endpoints
    PrivateWithEgress,
}

impl SubnetTier {
    /// Human readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::PrivateWithEgress => "private-with-egress",
        }
    }
}

/// One subnet tier of the VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubnetConfig {
    /// Tier name, used for logical IDs and tags
    pub name: String,

    /// Prefix length of each subnet of the tier
    pub cidr_mask: u8,

    /// Public or private
    pub tier: SubnetTier,
}

/// VPC layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// VPC name
    pub name: String,

    /// VPC CIDR
    pub cidr: String,

    /// Availability zones spanned by every tier
    pub max_azs: u32,

    /// Name of the S3 gateway endpoint
    pub gateway_endpoint_name: String,

    /// Name of the EFS interface endpoint
    pub interface_endpoint_name: String,

    /// Subnet tiers, allocated in order
    pub subnets: Vec<SubnetConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "batch-vpc".to_string(),
            cidr: "10.0.0.0/16".to_string(),
            max_azs: 2,
            gateway_endpoint_name: "vpce-s3".to_string(),
            interface_endpoint_name: "vpc-interface-endpoint-efs".to_string(),
            subnets: vec![
                SubnetConfig {
                    name: "public-subnet-1".to_string(),
                    cidr_mask: 24,
                    tier: SubnetTier::Public,
                },
                SubnetConfig {
                    name: "private-subnet-1".to_string(),
                    cidr_mask: 24,
                    tier: SubnetTier::PrivateWithEgress,
                },
            ],
        }
    }
}

/// Shared security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SecurityGroupConfig {
    /// Group name
    pub name: String,
}

impl Default for SecurityGroupConfig {
    fn default() -> Self {
        Self {
            name: "batch-vpc-sg".to_string(),
        }
    }
}

/// File system, access point and bucket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StorageConfig {
    /// File system name
    pub file_system_name: String,

    /// Access point name
    pub access_point_name: String,

    /// Root path of the access point
    pub access_point_path: String,

    /// POSIX uid/gid enforced by the access point
    pub posix_id: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_system_name: "cdk-efs-batch-s3-efs".to_string(),
            access_point_name: "cdk-efs-batch-s3-access-point".to_string(),
            access_point_path: "/projects".to_string(),
            posix_id: 1001,
        }
    }
}

/// CPU or GPU instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum HardwareClass {
    /// General purpose / compute optimized
    Cpu,
    /// Accelerated (NVIDIA) instances
    Gpu,
}

impl HardwareClass {
    /// Upper-case label used in resource names
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
        }
    }
}

/// On-demand or spot pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PricingModel {
    /// On-demand instances
    OnDemand,
    /// Spot instances
    Spot,
}

impl PricingModel {
    /// Label used in resource names
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OnDemand => "OnDemand",
            Self::Spot => "Spot",
        }
    }
}

/// One compute pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComputePoolConfig {
    /// CPU or GPU
    pub hardware: HardwareClass,

    /// On-demand or spot
    pub pricing: PricingModel,

    /// Instance families; defaults depend on hardware and pricing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_families: Option<Vec<String>>,

    /// Lower vCPU bound
    #[serde(default)]
    pub min_vcpus: u32,

    /// Upper vCPU bound
    #[serde(default = "default_max_vcpus")]
    pub max_vcpus: u32,

    /// Spot bid as a percentage of the on-demand price
    #[serde(default = "default_bid_percentage")]
    pub bid_percentage: u32,

    /// Accept jobs
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_max_vcpus() -> u32 {
    256
}

fn default_bid_percentage() -> u32 {
    100
}

fn default_enabled() -> bool {
    true
}

impl ComputePoolConfig {
    /// Pool with default sizing for a hardware/pricing combination
    #[must_use]
    pub fn new(hardware: HardwareClass, pricing: PricingModel) -> Self {
        Self {
            hardware,
            pricing,
            instance_families: None,
            min_vcpus: 0,
            max_vcpus: default_max_vcpus(),
            bid_percentage: default_bid_percentage(),
            enabled: true,
        }
    }

    /// Pool name, e.g. `OnDemandCPU`
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{}", self.pricing.label(), self.hardware.label())
    }

    /// Configured families, or the defaults for the combination
    #[must_use]
    pub fn families(&self) -> Vec<String> {
        if let Some(families) = &self.instance_families {
            return families.clone();
        }
        let default = match (self.hardware, self.pricing) {
            (HardwareClass::Cpu, PricingModel::OnDemand) => "c5",
            (HardwareClass::Cpu, PricingModel::Spot) => "optimal",
            (HardwareClass::Gpu, _) => "g5",
        };
        vec![default.to_string()]
    }
}

/// Batch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ComputeConfig {
    /// Base name of job definitions, suffixed with `-<index>`
    pub job_definition_name: String,

    /// Base name of containers, suffixed with `-<index>`
    pub container_definition_name: String,

    /// Priority of every job queue
    pub queue_priority: u32,

    /// Pools to create
    pub pools: Vec<ComputePoolConfig>,

    /// Settings shared by every job definition
    pub job: JobSettings,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            job_definition_name: "batch-job-defn".to_string(),
            container_definition_name: "batch-container-defn".to_string(),
            queue_priority: 10,
            pools: vec![
                ComputePoolConfig::new(HardwareClass::Cpu, PricingModel::OnDemand),
                ComputePoolConfig::new(HardwareClass::Cpu, PricingModel::Spot),
                ComputePoolConfig::new(HardwareClass::Gpu, PricingModel::OnDemand),
                ComputePoolConfig::new(HardwareClass::Gpu, PricingModel::Spot),
            ],
            job: JobSettings::default(),
        }
    }
}

/// Job definition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct JobSettings {
    /// Attempt timeout in seconds
    pub timeout_seconds: u32,

    /// Retry attempts
    pub retry_attempts: u32,

    /// Container memory in MiB
    pub memory_mib: u32,

    /// Container vCPUs
    pub vcpus: u32,

    /// Where the file system is mounted inside job containers
    pub mount_path: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            retry_attempts: 1,
            memory_mib: 2048,
            vcpus: 1,
            mount_path: "/mnt/efs".to_string(),
        }
    }
}

impl JobSettings {
    /// Batch rejects attempt timeouts under 60 seconds and more than 10 attempts
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds < MIN_JOB_TIMEOUT_SECONDS {
            return Err(ConfigError::InvalidJobSettings {
                field: "timeoutSeconds",
                value: self.timeout_seconds,
                expected: "at least 60",
            });
        }
        if !JOB_RETRY_ATTEMPTS.contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidJobSettings {
                field: "retryAttempts",
                value: self.retry_attempts,
                expected: "1 to 10",
            });
        }
        Ok(())
    }
}

const MIN_JOB_TIMEOUT_SECONDS: u32 = 60;
const JOB_RETRY_ATTEMPTS: std::ops::RangeInclusive<u32> = 1..=10;

/// Read API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Lambda function name
    pub function_name: String,

    /// REST API name
    pub rest_api_name: String,

    /// Mount path of the access point inside the function
    pub lambda_mount_path: String,

    /// Deployment stage
    pub stage_name: String,

    /// Function memory in MiB
    pub memory_mib: u32,

    /// Function timeout in seconds
    pub timeout_seconds: u32,

    /// Default object key of the function package
    pub code_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            function_name: "list-efs-contents-fn".to_string(),
            rest_api_name: "cdk-efs-batch-s3-api".to_string(),
            lambda_mount_path: "/mnt/files".to_string(),
            stage_name: "prod".to_string(),
            memory_mib: 128,
            timeout_seconds: 30,
            code_key: "lambda/list-efs-contents.zip".to_string(),
        }
    }
}

/// Flow log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log group receiving the flow logs
    pub log_group_name: String,

    /// Name of the delivery role
    pub log_role_name: String,

    /// Retention in days
    pub retention_days: u32,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_group_name: "flow-logs-group".to_string(),
            log_role_name: "CloudWatchLogsRole".to_string(),
            retention_days: 731,
        }
    }
}

/// Values supplied on the command line or through the environment
///
/// Each `Some` replaces the corresponding file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Stack name
    pub stack_name: Option<String>,
    /// Comma-delimited versions
    pub blender_versions: Option<String>,
    /// Bucket name
    pub bucket_name: Option<String>,
    /// Private placement flag
    pub private: Option<bool>,
}

/// Configuration that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// The configuration as given
    pub config: StackConfig,
    /// Bucket name, trimmed and present
    pub bucket_name: String,
    /// Normalized version list
    pub versions: VersionList,
}

impl StackConfig {
    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let path = path.as_ref();
        debug!("Loading stack configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse a YAML configuration document
    pub fn from_yaml(raw: &str) -> Result<Self, SynthError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply command-line / environment overrides
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(stack_name) = overrides.stack_name {
            self.stack_name = stack_name;
        }
        if let Some(versions) = overrides.blender_versions {
            self.blender_versions = Some(VersionsInput::Delimited(versions));
        }
        if let Some(bucket_name) = overrides.bucket_name {
            self.bucket_name = Some(bucket_name);
        }
        if let Some(private) = overrides.private {
            self.private = private;
        }
        self
    }

    /// Run the validation phase
    ///
    /// The bucket name is checked before the version list; the first failing
    /// check is reported.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedConfigVersion(self.version));
        }
        validate_stack_name(&self.stack_name)?;

        let bucket_name = self
            .bucket_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingBucketName)?
            .to_string();

        let versions = VersionList::parse(self.blender_versions.as_ref())?;

        self.validate_network()?;
        validate_absolute("storage.accessPointPath", &self.storage.access_point_path)?;
        validate_absolute("compute.job.mountPath", &self.compute.job.mount_path)?;
        self.compute.job.validate()?;
        if !self.api.lambda_mount_path.starts_with("/mnt/") {
            return Err(ConfigError::InvalidPath {
                field: "api.lambdaMountPath",
                value: self.api.lambda_mount_path.clone(),
            });
        }
        self.validate_pools()?;

        Ok(ValidatedConfig {
            config: self,
            bucket_name,
            versions,
        })
    }

    fn validate_network(&self) -> Result<(), ConfigError> {
        let tiers: BTreeSet<SubnetTier> = self.network.subnets.iter().map(|s| s.tier).collect();
        for tier in [SubnetTier::Public, SubnetTier::PrivateWithEgress] {
            if !tiers.contains(&tier) {
                return Err(ConfigError::MissingSubnetTier(tier.label()));
            }
        }
        if self.network.max_azs == 0 {
            return Err(ConfigError::InvalidCidr {
                cidr: self.network.cidr.clone(),
                reason: "maxAzs must be at least 1".to_string(),
            });
        }
        allocate_subnets(&self.network)?;
        Ok(())
    }

    fn validate_pools(&self) -> Result<(), ConfigError> {
        if self.compute.pools.is_empty() {
            return Err(ConfigError::InvalidComputePools("at least one pool is required".to_string()));
        }
        let mut seen = BTreeSet::new();
        for pool in &self.compute.pools {
            let name = pool.name();
            if !seen.insert((pool.hardware, pool.pricing)) {
                return Err(ConfigError::InvalidComputePools(format!("{name} is declared twice")));
            }
            if pool.max_vcpus == 0 || pool.min_vcpus > pool.max_vcpus {
                return Err(ConfigError::InvalidVcpuRange {
                    pool: name,
                    min: pool.min_vcpus,
                    max: pool.max_vcpus,
                });
            }
            if pool.pricing == PricingModel::Spot && !(1..=100).contains(&pool.bid_percentage) {
                return Err(ConfigError::InvalidBidPercentage {
                    pool: name,
                    value: pool.bid_percentage,
                });
            }
            let families = pool.families();
            if families.is_empty() {
                return Err(ConfigError::InvalidComputePools(format!("{name} selects no instance family")));
            }
            for family in families {
                if is_gpu_family(&family) != (pool.hardware == HardwareClass::Gpu) {
                    return Err(ConfigError::InstanceFamilyMismatch {
                        pool: name,
                        hardware: pool.hardware.label(),
                        family,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Families carrying NVIDIA GPUs
const GPU_FAMILY_PREFIXES: &[&str] = &["p2", "p3", "p4", "p5", "g3", "g4", "g5", "g6", "gr6"];

/// True when an instance type or family (`g5`, `g5.xlarge`) is GPU accelerated
///
/// `optimal` lets Batch pick from the C, M and R families, so it counts as CPU.
#[must_use]
pub fn is_gpu_family(instance_type: &str) -> bool {
    let family = instance_type.split('.').next().unwrap_or(instance_type).to_ascii_lowercase();
    GPU_FAMILY_PREFIXES.iter().any(|prefix| family.starts_with(prefix))
}

fn validate_stack_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = name.len() <= 128
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidStackName(name.to_string()))
    }
}

fn validate_absolute(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('/') && !value.split('/').any(|segment| segment == "..") {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath {
            field,
            value: value.to_string(),
        })
    }
}
