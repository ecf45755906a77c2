//! BRender Studio Stack
//!
//! Declares the render farm infrastructure (VPC, Batch pools and queues, job
//! definitions, EFS, S3, a listing Lambda behind a REST API and VPC flow logs)
//! as a construction graph and renders it to a CloudFormation template.

pub mod config;
pub mod error;
pub mod graph;
#[cfg(test)]
mod graph_test;
pub mod provision;
pub mod stack;
pub mod versions;

pub use config::{Overrides, StackConfig, ValidatedConfig};
pub use error::{ConfigError, GraphError, SynthError};
pub use graph::{Component, ConstructGraph, NodeSummary};
pub use stack::{StackGraph, build, synthesize};
pub use versions::{BlenderVersion, VersionList, VersionsInput};
