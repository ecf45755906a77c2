//! IAM resources and policy documents

use crate::intrinsic::Expr;
use serde::Serialize;

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grant
    Allow,
    /// Explicit deny
    Deny,
}

/// Principal of a trust policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    /// Service principals, e.g. `ec2.amazonaws.com`
    pub service: Vec<String>,
}

/// One policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Allow or deny
    pub effect: Effect,

    /// Trusted principal (trust policies only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    /// Actions, e.g. `s3:GetObject`
    pub action: Vec<String>,

    /// Resources the actions apply to (permission policies only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Expr>,
}

impl Statement {
    /// Allow `actions` on `resources`
    pub fn allow<A: Into<String>>(actions: impl IntoIterator<Item = A>, resources: Vec<Expr>) -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: actions.into_iter().map(Into::into).collect(),
            resource: resources,
        }
    }
}

/// Policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Always `2012-10-17`
    pub version: String,

    /// Statements
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Document made of the given statements
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Trust policy letting `service` assume the role
    pub fn assume_role(service: impl Into<String>) -> Self {
        Self::new(vec![Statement {
            effect: Effect::Allow,
            principal: Some(Principal {
                service: vec![service.into()],
            }),
            action: vec!["sts:AssumeRole".to_string()],
            resource: Vec::new(),
        }])
    }
}

/// Inline policy embedded in a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InlinePolicy {
    /// Name unique within the role
    pub policy_name: String,

    /// Permissions
    pub policy_document: PolicyDocument,
}

/// `AWS::IAM::Role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    /// Trust policy
    pub assume_role_policy_document: PolicyDocument,

    /// Description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Attached managed policies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<Expr>,

    /// Inline policies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<InlinePolicy>,
}

/// `AWS::IAM::ManagedPolicy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedPolicy {
    /// Description shown in the console
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permissions
    pub policy_document: PolicyDocument,
}

/// `AWS::IAM::InstanceProfile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProfile {
    /// Roles (EC2 accepts exactly one)
    pub roles: Vec<Expr>,
}

/// ARN of an AWS managed policy, e.g. `service-role/AmazonEC2ContainerServiceforEC2Role`
pub fn aws_managed_policy(name: &str) -> Expr {
    Expr::sub(format!("arn:${{AWS::Partition}}:iam::aws:policy/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assume_role_document() {
        let doc = PolicyDocument::assume_role("ec2.amazonaws.com");
        assert_eq!(
            serde_json::to_value(&doc).ok(),
            Some(json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"Service": ["ec2.amazonaws.com"]},
                    "Action": ["sts:AssumeRole"]
                }]
            }))
        );
    }

    #[test]
    fn test_aws_managed_policy_arn() {
        assert_eq!(
            aws_managed_policy("service-role/AWSLambdaBasicExecutionRole"),
            Expr::sub("arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole")
        );
    }
}
