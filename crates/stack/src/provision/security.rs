//! Security group provisioner

use crate::error::GraphError;
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::network::NetworkHandle;
use cfn::ec2::{EgressRule, SecurityGroup, SecurityGroupIngress};
use cfn::{Expr, Resource, Tag};
use tracing::{debug, info};

/// Logical ID of a security group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupHandle {
    /// Logical ID
    pub logical_id: String,
}

impl SecurityGroupHandle {
    /// `Fn::GetAtt GroupId`
    #[must_use]
    pub fn group_id(&self) -> Expr {
        Expr::get_att(&self.logical_id, "GroupId")
    }
}

/// Declare a group in the VPC: allow-all egress, no ingress
pub fn create_security_group(
    graph: &mut ConstructGraph,
    name: &str,
    description: &str,
    network: &NetworkHandle,
) -> Result<SecurityGroupHandle, GraphError> {
    let id = logical_id(name);
    info!("Creating security group {}", name);
    graph.add(
        Component::Security,
        &id,
        Resource::new(SecurityGroup {
            group_description: description.to_string(),
            vpc_id: network.vpc_ref(),
            security_group_egress: vec![EgressRule::allow_all()],
            tags: vec![Tag::name(name)],
        }),
    )?;
    Ok(SecurityGroupHandle { logical_id: id })
}

/// Allow TCP `port` on `target` from members of `source`
pub fn allow_from(
    graph: &mut ConstructGraph,
    target: &SecurityGroupHandle,
    source: &SecurityGroupHandle,
    port: u16,
    description: &str,
) -> Result<String, GraphError> {
    let id = format!("{}Ingress{port}From{}", target.logical_id, source.logical_id);
    debug!("{} <- {} on tcp/{}", target.logical_id, source.logical_id, port);
    graph.add(
        Component::Security,
        &id,
        Resource::new(SecurityGroupIngress {
            group_id: target.group_id(),
            ip_protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            source_security_group_id: Some(source.group_id()),
            cidr_ip: None,
            description: Some(description.to_string()),
        }),
    )?;
    Ok(id)
}

/// Allow TCP `port` on `target` from a CIDR range
pub fn allow_cidr(
    graph: &mut ConstructGraph,
    target: &SecurityGroupHandle,
    cidr: Expr,
    port: u16,
    description: &str,
) -> Result<String, GraphError> {
    let id = format!("{}Ingress{port}FromCidr", target.logical_id);
    debug!("{} <- cidr on tcp/{}", target.logical_id, port);
    graph.add(
        Component::Security,
        &id,
        Resource::new(SecurityGroupIngress {
            group_id: target.group_id(),
            ip_protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            source_security_group_id: None,
            cidr_ip: Some(cidr),
            description: Some(description.to_string()),
        }),
    )?;
    Ok(id)
}
