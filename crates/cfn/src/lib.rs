//! CloudFormation Template Model
//!
//! Typed definitions for the subset of AWS CloudFormation used by the
//! BRender stack: the template envelope, intrinsic functions, and the
//! property structs of every resource type the synthesizer emits.
//!
//! Property structs serialize with CloudFormation's PascalCase keys, so a
//! `Template` can be written straight to JSON or YAML and handed to the
//! deployment engine.

pub mod apigateway;
pub mod batch;
pub mod ec2;
pub mod efs;
pub mod iam;
pub mod intrinsic;
pub mod lambda;
pub mod logs;
pub mod s3;
pub mod template;

pub use intrinsic::*;
pub use template::*;

use serde::{Deserialize, Serialize};

/// Key/value tag attached to a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key
    pub key: String,

    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Shorthand for the `Name` tag shown in the AWS console
    pub fn name(value: impl Into<String>) -> Self {
        Self::new("Name", value)
    }
}
