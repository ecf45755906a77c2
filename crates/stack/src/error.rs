//! Stack synthesis errors
//!
//! `ConfigError` is raised by the validation phase, before the construction
//! graph exists. `GraphError` is raised while building or checking the graph.
//! Provider-side failures (unknown registry, IAM limits) are not modelled:
//! they surface when the deployment engine applies the template.

use thiserror::Error;

/// Invalid caller input, detected before any resource is declared
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Bucket name missing or blank
    #[error("bucket name is required")]
    MissingBucketName,

    /// Version list missing or blank
    #[error("blender version list is required")]
    MissingVersionList,

    /// An element of the version list is empty after trimming
    #[error("blender version list element {index} is empty")]
    EmptyVersionElement {
        /// Position in the list
        index: usize,
    },

    /// An element is not a valid image tag
    #[error("blender version {value:?} (element {index}) is not a valid image tag")]
    MalformedVersion {
        /// Position in the list
        index: usize,
        /// Offending value, lower-cased
        value: String,
    },

    /// Stack name is not a valid CloudFormation stack name
    #[error("invalid stack name {0:?}: must start with a letter and contain only letters, digits and hyphens (max 128)")]
    InvalidStackName(String),

    /// Subnet layout lacks a required tier
    #[error("subnet layout needs at least one {0} tier")]
    MissingSubnetTier(&'static str),

    /// CIDR block could not be parsed or used
    #[error("invalid CIDR {cidr:?}: {reason}")]
    InvalidCidr {
        /// Offending CIDR
        cidr: String,
        /// Why it was rejected
        reason: String,
    },

    /// Subnets do not fit inside the VPC CIDR
    #[error("VPC CIDR {0} has no room left for the requested subnets")]
    CidrExhausted(String),

    /// Instance family inconsistent with the pool's hardware class
    #[error("compute pool {pool} is {hardware} but selects instance family {family:?}")]
    InstanceFamilyMismatch {
        /// Pool name
        pool: String,
        /// Hardware class of the pool
        hardware: &'static str,
        /// Offending family
        family: String,
    },

    /// vCPU bounds inverted or zero
    #[error("compute pool {pool} has invalid vCPU range [{min}, {max}]")]
    InvalidVcpuRange {
        /// Pool name
        pool: String,
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },

    /// Spot bid percentage outside 1..=100
    #[error("compute pool {pool} has invalid spot bid percentage {value}")]
    InvalidBidPercentage {
        /// Pool name
        pool: String,
        /// Offending value
        value: u32,
    },

    /// No compute pool configured, or the same pool twice
    #[error("compute pools invalid: {0}")]
    InvalidComputePools(String),

    /// Path setting is not absolute or otherwise unusable
    #[error("invalid path for {field}: {value:?}")]
    InvalidPath {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Job timeout or retry count outside what Batch accepts
    #[error("compute.job.{field} is {value}, expected {expected}")]
    InvalidJobSettings {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: u32,
        /// Accepted range
        expected: &'static str,
    },

    /// Configuration file version not understood
    #[error("unsupported configuration version {0} (expected 1)")]
    UnsupportedConfigVersion(u32),
}

/// Ill-formed construction graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Logical ID declared twice
    #[error("duplicate logical ID {0}")]
    DuplicateNode(String),

    /// Logical ID is not alphanumeric or too long
    #[error("invalid logical ID {0:?}: must be 1-255 ASCII letters and digits")]
    InvalidLogicalId(String),

    /// A node references something that is not declared
    #[error("{from} references undeclared {to}")]
    DanglingReference {
        /// Referencing node (or output)
        from: String,
        /// Missing target
        to: String,
    },

    /// The graph contains a cycle through the listed nodes
    #[error("dependency cycle between {0:?}")]
    Cycle(Vec<String>),

    /// Properties could not be serialized while extracting references
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Any failure of a synthesis run
#[derive(Debug, Error)]
pub enum SynthError {
    /// Validation phase rejected the input
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Construction graph is ill-formed
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid YAML for the contract
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Template could not be rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
