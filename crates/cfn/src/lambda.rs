//! Lambda resources

use crate::intrinsic::Expr;
use serde::Serialize;
use std::collections::BTreeMap;

/// Deployment package location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    /// Bucket holding the zip
    pub s3_bucket: Expr,

    /// Key of the zip
    pub s3_key: Expr,
}

/// Function environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    /// Environment variables
    pub variables: BTreeMap<String, String>,
}

/// VPC attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConfig {
    /// Subnets for the function's network interfaces
    pub subnet_ids: Vec<Expr>,

    /// Security groups for the network interfaces
    pub security_group_ids: Vec<Expr>,
}

/// EFS access point mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSystemConfig {
    /// Access point ARN
    pub arn: Expr,

    /// Mount path, must start with `/mnt/`
    pub local_mount_path: String,
}

/// `AWS::Lambda::Function`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    /// Physical name
    pub function_name: String,

    /// Description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Runtime identifier, e.g. `provided.al2023`
    pub runtime: String,

    /// Entry point (`bootstrap` for custom runtimes)
    pub handler: String,

    /// Execution role ARN
    pub role: Expr,

    /// Deployment package
    pub code: Code,

    /// `x86_64` or `arm64`
    pub architectures: Vec<String>,

    /// Memory in MiB
    pub memory_size: u32,

    /// Timeout in seconds
    pub timeout: u32,

    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// VPC attachment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcConfig>,

    /// EFS mounts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_system_configs: Vec<FileSystemConfig>,
}

/// `AWS::Lambda::Permission`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Permission {
    /// Usually `lambda:InvokeFunction`
    pub action: String,

    /// Function name or ARN
    pub function_name: Expr,

    /// Invoking service principal
    pub principal: String,

    /// Restrict invocations to this source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_arn: Option<Expr>,
}
