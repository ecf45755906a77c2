//! VPC flow logs

use crate::config::ObservabilityConfig;
use crate::error::GraphError;
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::network::NetworkHandle;
use cfn::ec2::FlowLog;
use cfn::iam::{InlinePolicy, PolicyDocument, Role, Statement};
use cfn::logs::LogGroup;
use cfn::{Expr, Resource, Tag};
use tracing::info;

/// Logical IDs of the flow log resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLogHandle {
    /// Log group
    pub log_group: String,
    /// Delivery role
    pub role: String,
    /// Flow log
    pub flow_log: String,
}

/// Send all VPC traffic records to a retained log group
pub fn create_vpc_flow_logs(
    graph: &mut ConstructGraph,
    config: &ObservabilityConfig,
    network: &NetworkHandle,
) -> Result<FlowLogHandle, GraphError> {
    let log_group = logical_id(&config.log_group_name);
    let role = logical_id(&config.log_role_name);
    let flow_log = format!("{}FlowLog", network.vpc);
    info!("Creating flow logs into {}", config.log_group_name);

    graph.add(
        Component::Observability,
        &log_group,
        Resource::new(LogGroup {
            log_group_name: Some(config.log_group_name.clone()),
            retention_in_days: Some(config.retention_days),
        })
        .retained(),
    )?;

    graph.add(
        Component::Observability,
        &role,
        Resource::new(Role {
            assume_role_policy_document: PolicyDocument::assume_role("vpc-flow-logs.amazonaws.com"),
            description: Some("Delivers VPC flow logs".to_string()),
            managed_policy_arns: Vec::new(),
            policies: vec![InlinePolicy {
                policy_name: "flow-logs-delivery".to_string(),
                policy_document: PolicyDocument::new(vec![Statement::allow(
                    [
                        "logs:CreateLogStream",
                        "logs:PutLogEvents",
                        "logs:DescribeLogGroups",
                        "logs:DescribeLogStreams",
                    ],
                    vec![Expr::get_att(&log_group, "Arn")],
                )]),
            }],
        }),
    )?;

    graph.add(
        Component::Observability,
        &flow_log,
        Resource::new(FlowLog {
            resource_id: network.vpc_ref(),
            resource_type: "VPC".to_string(),
            traffic_type: "ALL".to_string(),
            log_destination_type: "cloud-watch-logs".to_string(),
            log_group_name: Expr::reference(&log_group),
            deliver_logs_permission_arn: Expr::get_att(&role, "Arn"),
            tags: vec![Tag::name(&config.log_group_name)],
        }),
    )?;

    Ok(FlowLogHandle {
        log_group,
        role,
        flow_log,
    })
}
