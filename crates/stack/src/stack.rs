//! Stack assembly
//!
//! `synthesize` is the whole pipeline: validate the configuration, declare
//! parameters, run every provisioner in dependency order, check the graph and
//! render the template with its outputs.

use crate::config::{DEFAULT_DESCRIPTION, StackConfig, ValidatedConfig};
use crate::error::SynthError;
use crate::graph::ConstructGraph;
use crate::provision::api::{self, CODE_BUCKET_PARAMETER, CODE_KEY_PARAMETER, FunctionHandle, RestApiHandle};
use crate::provision::compute::{self, BatchHandle, BatchInputs, ECR_IMAGE_PARAMETER};
use crate::provision::network::{self, NetworkHandle};
use crate::provision::observability::{self, FlowLogHandle};
use crate::provision::security::{self, SecurityGroupHandle};
use crate::provision::storage::{self, AccessPointHandle, BucketHandle, FileSystemHandle};
use cfn::{Expr, Output, Parameter, Template};
use std::collections::BTreeMap;
use tracing::{info, info_span};

/// Handles of every layer, kept for outputs and inspection
#[derive(Debug, Clone)]
pub struct StackHandles {
    /// VPC
    pub network: NetworkHandle,
    /// Shared group
    pub security_group: SecurityGroupHandle,
    /// EFS interface endpoint logical ID
    pub interface_endpoint: String,
    /// File system
    pub file_system: FileSystemHandle,
    /// Access point
    pub access_point: AccessPointHandle,
    /// Render bucket
    pub bucket: BucketHandle,
    /// Listing function
    pub function: FunctionHandle,
    /// REST API
    pub rest_api: RestApiHandle,
    /// Flow logs
    pub flow_logs: FlowLogHandle,
    /// Batch resources
    pub batch: BatchHandle,
}

/// A fully declared stack, not yet rendered
#[derive(Debug, Clone)]
pub struct StackGraph {
    /// Stack name
    pub stack_name: String,
    /// Stack description
    pub description: String,
    /// Declared nodes
    pub graph: ConstructGraph,
    /// Layer handles
    pub handles: StackHandles,
}

impl StackGraph {
    /// Check the graph and render the template
    pub fn into_template(self) -> Result<Template, SynthError> {
        let outputs = outputs(&self.handles);
        Ok(self.graph.into_template(Some(self.description), outputs)?)
    }
}

/// Validate, build and render in one call
pub fn synthesize(config: StackConfig) -> Result<Template, SynthError> {
    build(config)?.into_template()
}

/// Validate and declare every resource
///
/// Validation completes before the first node is declared, so a rejected
/// configuration never yields a partial graph.
pub fn build(config: StackConfig) -> Result<StackGraph, SynthError> {
    let validated = config.validate()?;
    let span = info_span!("synthesize", stack = %validated.config.stack_name);
    let _guard = span.enter();
    declare(&validated)
}

fn declare(validated: &ValidatedConfig) -> Result<StackGraph, SynthError> {
    let config = &validated.config;
    info!(
        "Synthesizing {} with {} Blender versions",
        config.stack_name,
        validated.versions.len()
    );

    let mut graph = ConstructGraph::new();
    graph.add_parameter(
        ECR_IMAGE_PARAMETER,
        Parameter::string("Name of the ECR image to use in the Batch job"),
    )?;
    graph.add_parameter(
        CODE_BUCKET_PARAMETER,
        Parameter::string("Bucket holding the list-efs-contents function package"),
    )?;
    graph.add_parameter(
        CODE_KEY_PARAMETER,
        Parameter::string("Key of the list-efs-contents function package").with_default(&config.api.code_key),
    )?;

    let network = network::create_vpc(&mut graph, &config.network)?;
    let security_group = security::create_security_group(
        &mut graph,
        &config.security_group.name,
        "Shared group of the render farm",
        &network,
    )?;
    let interface_endpoint = network::add_interface_endpoint(&mut graph, &network, &config.network, &security_group)?;

    let file_system = storage::create_file_system(&mut graph, &config.storage, &network, &security_group)?;
    let access_point = storage::create_access_point(&mut graph, &config.storage, &file_system)?;
    let bucket = storage::create_bucket(&mut graph, &validated.bucket_name)?;
    storage::allow_nfs_from(&mut graph, &file_system, &security_group)?;

    let function = api::create_list_contents_fn(&mut graph, &config.api, &network, &file_system, &access_point)?;
    let rest_api = api::create_lambda_rest_api(&mut graph, &config.api, &function)?;

    let flow_logs = observability::create_vpc_flow_logs(&mut graph, &config.observability, &network)?;

    let batch = compute::create_batch_resources(
        &mut graph,
        &config.compute,
        &BatchInputs {
            network: &network,
            security_group: &security_group,
            file_system: &file_system,
            bucket: &bucket,
            versions: &validated.versions,
            private: config.private,
        },
    )?;

    info!("Declared {} resources", graph.len());

    Ok(StackGraph {
        stack_name: config.stack_name.clone(),
        description: config
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        graph,
        handles: StackHandles {
            network,
            security_group,
            interface_endpoint,
            file_system,
            access_point,
            bucket,
            function,
            rest_api,
            flow_logs,
            batch,
        },
    })
}

fn outputs(handles: &StackHandles) -> BTreeMap<String, Output> {
    let output = |description: String, value: Expr| Output {
        description: Some(description),
        value,
    };

    let mut outputs = BTreeMap::from([
        (
            "ApiUrl".to_string(),
            output("Invoke URL of the listing API".to_string(), handles.rest_api.url()),
        ),
        (
            "BucketName".to_string(),
            output("Render bucket".to_string(), handles.bucket.name_ref()),
        ),
        (
            "FileSystemId".to_string(),
            output("Shared file system".to_string(), handles.file_system.id()),
        ),
        (
            "AccessPointId".to_string(),
            output("Access point mounted by the API".to_string(), handles.access_point.id()),
        ),
    ]);

    for queue in handles.batch.job_queues.values() {
        outputs.insert(
            format!("{queue}Arn"),
            output(format!("ARN of job queue {queue}"), Expr::reference(queue)),
        );
    }
    for definition in &handles.batch.job_definitions {
        outputs.insert(
            format!("{definition}Arn"),
            output(format!("ARN of job definition {definition}"), Expr::reference(definition)),
        );
    }
    outputs
}
