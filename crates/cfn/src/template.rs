//! Template envelope
//!
//! `Template` is the document handed to the deployment engine. Resources,
//! parameters and outputs live in ordered maps so the same input always
//! renders the same bytes.

use crate::intrinsic::Expr;
use crate::{apigateway, batch, ec2, efs, iam, lambda, logs, s3};
use serde::Serialize;
use std::collections::BTreeMap;

/// Template format version accepted by CloudFormation
pub const FORMAT_VERSION: &str = "2010-09-09";

/// A complete CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Always `2010-09-09`
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    /// Stack description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Deploy-time parameters
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,

    /// Resources keyed by logical ID
    pub resources: BTreeMap<String, Resource>,

    /// Stack outputs keyed by logical ID
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    /// Empty template with an optional description
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render as YAML (intrinsics in long form)
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Resources of a given CloudFormation type, in logical ID order
    pub fn resources_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.properties.type_name() == type_name)
    }
}

/// Deploy-time parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Parameter type, e.g. `String`
    #[serde(rename = "Type")]
    pub kind: String,

    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Minimum length of a string parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
}

impl Parameter {
    /// Required string parameter
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            kind: "String".to_string(),
            description: Some(description.into()),
            default: None,
            min_length: Some(1),
        }
    }

    /// Attach a default value
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output value
    pub value: Expr,
}

/// Resource deletion / replacement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    /// Delete the physical resource with the stack
    Delete,
    /// Keep the physical resource after stack deletion
    Retain,
}

/// A resource entry: type, properties and resource attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    /// `Type` + `Properties`
    #[serde(flatten)]
    pub properties: ResourceProperties,

    /// Explicit ordering edges that no property reference expresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Behavior on stack deletion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,

    /// Behavior on replacement during update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<DeletionPolicy>,
}

impl Resource {
    /// Resource with no explicit attributes
    pub fn new(properties: impl Into<ResourceProperties>) -> Self {
        Self {
            properties: properties.into(),
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Add an explicit `DependsOn` edge
    #[must_use]
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }

    /// Set `DeletionPolicy`
    #[must_use]
    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    /// Set both `DeletionPolicy` and `UpdateReplacePolicy` to `Retain`
    #[must_use]
    pub fn retained(mut self) -> Self {
        self.deletion_policy = Some(DeletionPolicy::Retain);
        self.update_replace_policy = Some(DeletionPolicy::Retain);
        self
    }
}

macro_rules! resource_properties {
    ($($variant:ident($ty:ty) => $type_name:literal,)+) => {
        /// Properties of every supported resource type, tagged with its CloudFormation type
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "Type", content = "Properties")]
        #[allow(missing_docs, reason = "variants mirror CloudFormation type names")]
        pub enum ResourceProperties {
            $(
                #[serde(rename = $type_name)]
                $variant($ty),
            )+
        }

        impl ResourceProperties {
            /// CloudFormation type name, e.g. `AWS::EC2::VPC`
            #[must_use]
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $type_name,)+
                }
            }
        }

        $(
            impl From<$ty> for ResourceProperties {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

resource_properties! {
    Vpc(ec2::Vpc) => "AWS::EC2::VPC",
    InternetGateway(ec2::InternetGateway) => "AWS::EC2::InternetGateway",
    VpcGatewayAttachment(ec2::VpcGatewayAttachment) => "AWS::EC2::VPCGatewayAttachment",
    Subnet(ec2::Subnet) => "AWS::EC2::Subnet",
    RouteTable(ec2::RouteTable) => "AWS::EC2::RouteTable",
    SubnetRouteTableAssociation(ec2::SubnetRouteTableAssociation) => "AWS::EC2::SubnetRouteTableAssociation",
    Route(ec2::Route) => "AWS::EC2::Route",
    VpcEndpoint(ec2::VpcEndpoint) => "AWS::EC2::VPCEndpoint",
    SecurityGroup(ec2::SecurityGroup) => "AWS::EC2::SecurityGroup",
    SecurityGroupIngress(ec2::SecurityGroupIngress) => "AWS::EC2::SecurityGroupIngress",
    FlowLog(ec2::FlowLog) => "AWS::EC2::FlowLog",
    FileSystem(efs::FileSystem) => "AWS::EFS::FileSystem",
    MountTarget(efs::MountTarget) => "AWS::EFS::MountTarget",
    AccessPoint(efs::AccessPoint) => "AWS::EFS::AccessPoint",
    Bucket(s3::Bucket) => "AWS::S3::Bucket",
    Role(iam::Role) => "AWS::IAM::Role",
    ManagedPolicy(iam::ManagedPolicy) => "AWS::IAM::ManagedPolicy",
    InstanceProfile(iam::InstanceProfile) => "AWS::IAM::InstanceProfile",
    ComputeEnvironment(batch::ComputeEnvironment) => "AWS::Batch::ComputeEnvironment",
    JobQueue(batch::JobQueue) => "AWS::Batch::JobQueue",
    JobDefinition(batch::JobDefinition) => "AWS::Batch::JobDefinition",
    Function(lambda::Function) => "AWS::Lambda::Function",
    Permission(lambda::Permission) => "AWS::Lambda::Permission",
    RestApi(apigateway::RestApi) => "AWS::ApiGateway::RestApi",
    ApiResource(apigateway::ApiResource) => "AWS::ApiGateway::Resource",
    Method(apigateway::Method) => "AWS::ApiGateway::Method",
    Deployment(apigateway::Deployment) => "AWS::ApiGateway::Deployment",
    Stage(apigateway::Stage) => "AWS::ApiGateway::Stage",
    LogGroup(logs::LogGroup) => "AWS::Logs::LogGroup",
}
