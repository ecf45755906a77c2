//! Network provisioner
//!
//! One VPC split into tiers of subnets across availability zones, an
//! internet gateway for the public tier, no NAT gateway, an S3 gateway
//! endpoint on every route table and, on request, the EFS interface endpoint.
//! Every resource declared here is deleted with the stack.

use crate::config::{NetworkConfig, SubnetTier};
use crate::error::{ConfigError, SynthError};
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::security::{self, SecurityGroupHandle};
use cfn::ec2::{
    InternetGateway, Route, RouteTable, Subnet, SubnetRouteTableAssociation, Vpc, VpcEndpoint, VpcEndpointType,
    VpcGatewayAttachment,
};
use cfn::{DeletionPolicy, Expr, Resource, Tag};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Smallest subnet the provider accepts
const MAX_SUBNET_PREFIX: u8 = 28;

/// HTTPS, the only port interface endpoints listen on
const HTTPS_PORT: u16 = 443;

/// Logical IDs of the network resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    /// VPC logical ID
    pub vpc: String,
    /// Internet gateway attachment; public routes wait for it
    pub gateway_attachment: String,
    /// Subnet logical IDs per tier, in AZ order
    pub subnets: BTreeMap<SubnetTier, Vec<String>>,
    /// Every route table
    pub route_tables: Vec<String>,
}

impl NetworkHandle {
    /// `Ref` to the VPC
    #[must_use]
    pub fn vpc_ref(&self) -> Expr {
        Expr::reference(&self.vpc)
    }

    /// VPC CIDR as resolved by the provider
    #[must_use]
    pub fn vpc_cidr(&self) -> Expr {
        Expr::get_att(&self.vpc, "CidrBlock")
    }

    /// Subnet logical IDs of a tier
    #[must_use]
    pub fn subnet_ids(&self, tier: SubnetTier) -> &[String] {
        self.subnets.get(&tier).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ref`s to the subnets of a tier
    #[must_use]
    pub fn subnet_refs(&self, tier: SubnetTier) -> Vec<Expr> {
        self.subnet_ids(tier).iter().map(Expr::reference).collect()
    }
}

/// Declare the VPC, its subnets, routing and the S3 gateway endpoint
pub fn create_vpc(graph: &mut ConstructGraph, config: &NetworkConfig) -> Result<NetworkHandle, SynthError> {
    let cidrs = allocate_subnets(config)?;
    let vpc = logical_id(&config.name);
    info!("Creating VPC {} ({}, {} AZs)", config.name, config.cidr, config.max_azs);

    add_network(
        graph,
        &vpc,
        Vpc {
            cidr_block: config.cidr.clone(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: "default".to_string(),
            tags: vec![Tag::name(&config.name)],
        },
    )?;

    let igw = format!("{vpc}Igw");
    let attachment = format!("{vpc}IgwAttachment");
    add_network(
        graph,
        &igw,
        InternetGateway {
            tags: vec![Tag::name(&config.name)],
        },
    )?;
    add_network(
        graph,
        &attachment,
        VpcGatewayAttachment {
            vpc_id: Expr::reference(&vpc),
            internet_gateway_id: Expr::reference(&igw),
        },
    )?;

    let mut handle = NetworkHandle {
        vpc: vpc.clone(),
        gateway_attachment: attachment.clone(),
        subnets: BTreeMap::new(),
        route_tables: Vec::new(),
    };

    let mut cidrs = cidrs.into_iter();
    for subnet in &config.subnets {
        let public = subnet.tier == SubnetTier::Public;
        for az in 0..config.max_azs {
            let Some(cidr) = cidrs.next() else {
                return Err(ConfigError::CidrExhausted(config.cidr.clone()).into());
            };
            let prefix = format!("{vpc}{}Az{}", logical_id(&subnet.name), az + 1);
            let label = format!("{}/{}-az{}", config.name, subnet.name, az + 1);
            debug!("Subnet {} ({}) -> {}", label, subnet.tier.label(), cidr);

            let subnet_id = format!("{prefix}Subnet");
            let route_table = format!("{prefix}RouteTable");
            add_network(
                graph,
                &subnet_id,
                Subnet {
                    vpc_id: Expr::reference(&vpc),
                    cidr_block: cidr,
                    availability_zone: Expr::availability_zone(az),
                    map_public_ip_on_launch: public,
                    tags: vec![Tag::name(&label), Tag::new("brender:subnet-type", subnet.tier.label())],
                },
            )?;
            add_network(
                graph,
                &route_table,
                RouteTable {
                    vpc_id: Expr::reference(&vpc),
                    tags: vec![Tag::name(&label)],
                },
            )?;
            add_network(
                graph,
                format!("{prefix}RouteTableAssociation"),
                SubnetRouteTableAssociation {
                    route_table_id: Expr::reference(&route_table),
                    subnet_id: Expr::reference(&subnet_id),
                },
            )?;
            if public {
                let route = Resource::new(Route {
                    route_table_id: Expr::reference(&route_table),
                    destination_cidr_block: "0.0.0.0/0".to_string(),
                    gateway_id: Expr::reference(&igw),
                })
                .depends_on(&attachment)
                .with_deletion_policy(DeletionPolicy::Delete);
                graph.add(Component::Network, format!("{prefix}DefaultRoute"), route)?;
            }

            handle.subnets.entry(subnet.tier).or_default().push(subnet_id);
            handle.route_tables.push(route_table);
        }
    }

    add_network(
        graph,
        format!("{vpc}{}", logical_id(&config.gateway_endpoint_name)),
        VpcEndpoint {
            vpc_id: Expr::reference(&vpc),
            service_name: Expr::sub("com.amazonaws.${AWS::Region}.s3"),
            vpc_endpoint_type: VpcEndpointType::Gateway,
            route_table_ids: handle.route_tables.iter().map(Expr::reference).collect(),
            subnet_ids: Vec::new(),
            security_group_ids: Vec::new(),
            private_dns_enabled: None,
        },
    )?;

    Ok(handle)
}

/// Declare the EFS interface endpoint in the private subnets
///
/// Interface endpoints only answer on 443, so HTTPS from the VPC CIDR is
/// opened on the guarding group.
pub fn add_interface_endpoint(
    graph: &mut ConstructGraph,
    network: &NetworkHandle,
    config: &NetworkConfig,
    group: &SecurityGroupHandle,
) -> Result<String, SynthError> {
    let endpoint = format!("{}{}", network.vpc, logical_id(&config.interface_endpoint_name));
    info!("Adding EFS interface endpoint {}", config.interface_endpoint_name);
    add_network(
        graph,
        &endpoint,
        VpcEndpoint {
            vpc_id: network.vpc_ref(),
            service_name: Expr::sub("com.amazonaws.${AWS::Region}.elasticfilesystem"),
            vpc_endpoint_type: VpcEndpointType::Interface,
            route_table_ids: Vec::new(),
            subnet_ids: network.subnet_refs(SubnetTier::PrivateWithEgress),
            security_group_ids: vec![group.group_id()],
            private_dns_enabled: Some(true),
        },
    )?;
    security::allow_cidr(graph, group, network.vpc_cidr(), HTTPS_PORT, "HTTPS from the VPC to interface endpoints")?;
    Ok(endpoint)
}

fn add_network(
    graph: &mut ConstructGraph,
    id: impl Into<String>,
    properties: impl Into<cfn::ResourceProperties>,
) -> Result<(), SynthError> {
    let resource = Resource::new(properties).with_deletion_policy(DeletionPolicy::Delete);
    graph.add(Component::Network, id, resource)?;
    Ok(())
}

/// Carve subnet CIDRs from the VPC CIDR, tier by tier, one per AZ
pub fn allocate_subnets(config: &NetworkConfig) -> Result<Vec<String>, ConfigError> {
    let (base, prefix) = parse_cidr(&config.cidr)?;
    let end = u64::from(base) + (1u64 << (32 - prefix));
    let mut cursor = u64::from(base);
    let mut cidrs = Vec::new();

    for subnet in &config.subnets {
        if subnet.cidr_mask < prefix || subnet.cidr_mask > MAX_SUBNET_PREFIX {
            return Err(ConfigError::InvalidCidr {
                cidr: config.cidr.clone(),
                reason: format!(
                    "subnet mask /{} of {} must be between /{prefix} and /{MAX_SUBNET_PREFIX}",
                    subnet.cidr_mask, subnet.name
                ),
            });
        }
        let size = 1u64 << (32 - subnet.cidr_mask);
        for _ in 0..config.max_azs {
            cursor = cursor.div_ceil(size) * size;
            if cursor + size > end {
                return Err(ConfigError::CidrExhausted(config.cidr.clone()));
            }
            let address = u32::try_from(cursor).map_err(|e| ConfigError::InvalidCidr {
                cidr: config.cidr.clone(),
                reason: e.to_string(),
            })?;
            cidrs.push(format!("{}/{}", Ipv4Addr::from(address), subnet.cidr_mask));
            cursor += size;
        }
    }
    Ok(cidrs)
}

fn parse_cidr(cidr: &str) -> Result<(u32, u8), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidCidr {
        cidr: cidr.to_string(),
        reason: reason.to_string(),
    };
    let (address, prefix) = cidr.split_once('/').ok_or_else(|| invalid("missing prefix length"))?;
    let address: Ipv4Addr = address.parse().map_err(|e: std::net::AddrParseError| invalid(&e.to_string()))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(&e.to_string()))?;
    if !(16..=MAX_SUBNET_PREFIX).contains(&prefix) {
        return Err(invalid("VPC prefix length must be between /16 and /28"));
    }
    let address = u32::from(address);
    let mask = u32::MAX << (32 - prefix);
    if address & !mask != 0 {
        return Err(invalid("host bits are set"));
    }
    Ok((address, prefix))
}
