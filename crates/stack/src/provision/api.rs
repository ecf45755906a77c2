//! Read API component
//!
//! A VPC-attached Lambda that mounts the access point and lists its
//! contents, fronted by a REST API that proxies every path and method to it.

use crate::config::{ApiConfig, SubnetTier};
use crate::error::GraphError;
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::network::NetworkHandle;
use crate::provision::security::{self, SecurityGroupHandle};
use crate::provision::storage::{AccessPointHandle, FileSystemHandle, NFS_PORT};
use cfn::apigateway::{ApiResource, Deployment, Integration, Method, RestApi, Stage};
use cfn::iam::{InlinePolicy, PolicyDocument, Role, Statement, aws_managed_policy};
use cfn::lambda::{Code, Environment, FileSystemConfig, Function, Permission, VpcConfig};
use cfn::{Expr, Resource};
use std::collections::BTreeMap;
use tracing::info;

/// Parameter naming the bucket holding the function package
pub const CODE_BUCKET_PARAMETER: &str = "ListFnCodeBucket";

/// Parameter naming the key of the function package
pub const CODE_KEY_PARAMETER: &str = "ListFnCodeKey";

/// Environment variable telling the function where the access point is mounted
pub const MOUNT_PATH_ENV: &str = "EFS_MOUNT_PATH";

/// Custom runtime the function binary targets
const RUNTIME: &str = "provided.al2023";

/// The function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHandle {
    /// Logical ID
    pub logical_id: String,
    /// Execution role logical ID
    pub role: String,
    /// Security group of the function's network interfaces
    pub security_group: SecurityGroupHandle,
}

impl FunctionHandle {
    /// Function ARN
    #[must_use]
    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

/// The REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApiHandle {
    /// API logical ID
    pub logical_id: String,
    /// Stage logical ID
    pub stage: String,
    /// Stage name
    pub stage_name: String,
}

impl RestApiHandle {
    /// Invoke URL of the stage
    #[must_use]
    pub fn url(&self) -> Expr {
        Expr::sub(format!(
            "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/{}/",
            self.logical_id, self.stage_name
        ))
    }
}

/// Declare the listing function, its role and its security group
///
/// The function mounts the access point, so it waits for every mount target.
pub fn create_list_contents_fn(
    graph: &mut ConstructGraph,
    config: &ApiConfig,
    network: &NetworkHandle,
    file_system: &FileSystemHandle,
    access_point: &AccessPointHandle,
) -> Result<FunctionHandle, GraphError> {
    let id = logical_id(&config.function_name);
    info!("Creating function {} (mount {})", config.function_name, config.lambda_mount_path);

    let role = format!("{id}Role");
    graph.add(
        Component::Api,
        &role,
        Resource::new(Role {
            assume_role_policy_document: PolicyDocument::assume_role("lambda.amazonaws.com"),
            description: Some(format!("Execution role of {}", config.function_name)),
            managed_policy_arns: vec![
                aws_managed_policy("service-role/AWSLambdaBasicExecutionRole"),
                aws_managed_policy("service-role/AWSLambdaVPCAccessExecutionRole"),
            ],
            policies: vec![InlinePolicy {
                policy_name: "efs-client".to_string(),
                policy_document: PolicyDocument::new(vec![Statement::allow(
                    ["elasticfilesystem:ClientMount", "elasticfilesystem:ClientWrite"],
                    vec![file_system.arn()],
                )]),
            }],
        }),
    )?;

    let group = security::create_security_group(
        graph,
        &format!("{}-sg", config.function_name),
        "Network interfaces of the listing function",
        network,
    )?;
    security::allow_from(
        graph,
        &file_system.security_group,
        &group,
        NFS_PORT,
        "NFS from the listing function",
    )?;

    let mut function = Resource::new(Function {
        function_name: config.function_name.clone(),
        description: Some("Lists the contents of the shared file system".to_string()),
        runtime: RUNTIME.to_string(),
        handler: "bootstrap".to_string(),
        role: Expr::get_att(&role, "Arn"),
        code: Code {
            s3_bucket: Expr::reference(CODE_BUCKET_PARAMETER),
            s3_key: Expr::reference(CODE_KEY_PARAMETER),
        },
        architectures: vec!["x86_64".to_string()],
        memory_size: config.memory_mib,
        timeout: config.timeout_seconds,
        environment: Some(Environment {
            variables: BTreeMap::from([(MOUNT_PATH_ENV.to_string(), config.lambda_mount_path.clone())]),
        }),
        vpc_config: Some(VpcConfig {
            subnet_ids: network.subnet_refs(SubnetTier::PrivateWithEgress),
            security_group_ids: vec![group.group_id()],
        }),
        file_system_configs: vec![FileSystemConfig {
            arn: access_point.arn(),
            local_mount_path: config.lambda_mount_path.clone(),
        }],
    });
    for target in &file_system.mount_targets {
        function = function.depends_on(target);
    }
    graph.add(Component::Api, &id, function)?;

    Ok(FunctionHandle {
        logical_id: id,
        role,
        security_group: group,
    })
}

/// Declare the REST API proxying everything to `function`
pub fn create_lambda_rest_api(
    graph: &mut ConstructGraph,
    config: &ApiConfig,
    function: &FunctionHandle,
) -> Result<RestApiHandle, GraphError> {
    let api = logical_id(&config.rest_api_name);
    info!("Creating REST API {}", config.rest_api_name);
    graph.add(
        Component::Api,
        &api,
        Resource::new(RestApi {
            name: config.rest_api_name.clone(),
            description: Some(format!("Proxy to {}", config.function_name)),
        }),
    )?;

    let integration = || Integration {
        kind: "AWS_PROXY".to_string(),
        integration_http_method: "POST".to_string(),
        uri: Expr::sub(format!(
            "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
            function.logical_id
        )),
    };

    let root_method = format!("{api}RootAny");
    graph.add(
        Component::Api,
        &root_method,
        Resource::new(Method {
            http_method: "ANY".to_string(),
            resource_id: Expr::get_att(&api, "RootResourceId"),
            rest_api_id: Expr::reference(&api),
            authorization_type: "NONE".to_string(),
            integration: integration(),
        }),
    )?;

    let proxy = format!("{api}Proxy");
    graph.add(
        Component::Api,
        &proxy,
        Resource::new(ApiResource {
            parent_id: Expr::get_att(&api, "RootResourceId"),
            path_part: "{proxy+}".to_string(),
            rest_api_id: Expr::reference(&api),
        }),
    )?;

    let proxy_method = format!("{proxy}Any");
    graph.add(
        Component::Api,
        &proxy_method,
        Resource::new(Method {
            http_method: "ANY".to_string(),
            resource_id: Expr::reference(&proxy),
            rest_api_id: Expr::reference(&api),
            authorization_type: "NONE".to_string(),
            integration: integration(),
        }),
    )?;

    graph.add(
        Component::Api,
        format!("{api}InvokePermission"),
        Resource::new(Permission {
            action: "lambda:InvokeFunction".to_string(),
            function_name: function.arn(),
            principal: "apigateway.amazonaws.com".to_string(),
            source_arn: Some(Expr::sub(format!(
                "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{api}}}/*"
            ))),
        }),
    )?;

    let deployment = format!("{api}Deployment");
    graph.add(
        Component::Api,
        &deployment,
        Resource::new(Deployment {
            rest_api_id: Expr::reference(&api),
            description: Some("Automatically created by the stack synthesizer".to_string()),
        })
        .depends_on(&root_method)
        .depends_on(&proxy_method),
    )?;

    let stage = format!("{api}Stage");
    graph.add(
        Component::Api,
        &stage,
        Resource::new(Stage {
            rest_api_id: Expr::reference(&api),
            deployment_id: Expr::reference(&deployment),
            stage_name: config.stage_name.clone(),
        }),
    )?;

    Ok(RestApiHandle {
        logical_id: api,
        stage,
        stage_name: config.stage_name.clone(),
    })
}
