//! API Gateway (REST) resources

use crate::intrinsic::Expr;
use serde::Serialize;

/// `AWS::ApiGateway::RestApi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestApi {
    /// API name
    pub name: String,

    /// Description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `AWS::ApiGateway::Resource`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResource {
    /// Parent resource ID
    pub parent_id: Expr,

    /// Last path segment, e.g. `{proxy+}`
    pub path_part: String,

    /// Owning API
    pub rest_api_id: Expr,
}

/// Backend integration of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Integration {
    /// `AWS_PROXY` for Lambda proxy integrations
    #[serde(rename = "Type")]
    pub kind: String,

    /// Method used to call the backend (`POST` for Lambda)
    pub integration_http_method: String,

    /// Backend URI
    pub uri: Expr,
}

/// `AWS::ApiGateway::Method`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Method {
    /// HTTP verb or `ANY`
    pub http_method: String,

    /// Resource the method hangs off
    pub resource_id: Expr,

    /// Owning API
    pub rest_api_id: Expr,

    /// `NONE`, `AWS_IAM`, ...
    pub authorization_type: String,

    /// Backend
    pub integration: Integration,
}

/// `AWS::ApiGateway::Deployment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployment {
    /// API being deployed
    pub rest_api_id: Expr,

    /// Description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `AWS::ApiGateway::Stage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    /// Owning API
    pub rest_api_id: Expr,

    /// Deployment served by the stage
    pub deployment_id: Expr,

    /// Stage name, part of the invoke URL
    pub stage_name: String,
}
