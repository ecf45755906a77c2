//! EC2 networking resources
//!
//! VPC, subnets, routing, endpoints, security groups and flow logs.

use crate::Tag;
use crate::intrinsic::Expr;
use serde::Serialize;

/// `AWS::EC2::VPC`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    /// IPv4 CIDR of the VPC
    pub cidr_block: String,

    /// Assign public DNS hostnames to instances
    pub enable_dns_hostnames: bool,

    /// Enable the Amazon-provided DNS resolver
    pub enable_dns_support: bool,

    /// `default` or `dedicated`
    pub instance_tenancy: String,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::InternetGateway`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::VPCGatewayAttachment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    /// VPC to attach to
    pub vpc_id: Expr,

    /// Internet gateway to attach
    pub internet_gateway_id: Expr,
}

/// `AWS::EC2::Subnet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    /// Owning VPC
    pub vpc_id: Expr,

    /// IPv4 CIDR of the subnet
    pub cidr_block: String,

    /// Availability zone
    pub availability_zone: Expr,

    /// Give instances a public IPv4 address on launch
    pub map_public_ip_on_launch: bool,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::RouteTable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    /// Owning VPC
    pub vpc_id: Expr,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::SubnetRouteTableAssociation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociation {
    /// Route table
    pub route_table_id: Expr,

    /// Subnet
    pub subnet_id: Expr,
}

/// `AWS::EC2::Route`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    /// Route table receiving the route
    pub route_table_id: Expr,

    /// Destination, e.g. `0.0.0.0/0`
    pub destination_cidr_block: String,

    /// Internet gateway target
    pub gateway_id: Expr,
}

/// VPC endpoint flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VpcEndpointType {
    /// Route-table based endpoint (S3, DynamoDB)
    Gateway,
    /// ENI based endpoint (PrivateLink)
    Interface,
}

/// `AWS::EC2::VPCEndpoint`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcEndpoint {
    /// VPC hosting the endpoint
    pub vpc_id: Expr,

    /// Service name, e.g. `com.amazonaws.eu-west-1.s3`
    pub service_name: Expr,

    /// Gateway or interface
    pub vpc_endpoint_type: VpcEndpointType,

    /// Route tables (gateway endpoints)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub route_table_ids: Vec<Expr>,

    /// Subnets (interface endpoints)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<Expr>,

    /// Security groups (interface endpoints)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<Expr>,

    /// Private DNS for the service hostname (interface endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_dns_enabled: Option<bool>,
}

/// Outbound rule embedded in a security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EgressRule {
    /// Destination CIDR
    pub cidr_ip: String,

    /// Protocol, `-1` for all
    pub ip_protocol: String,

    /// Rule description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EgressRule {
    /// Allow all outbound IPv4 traffic
    pub fn allow_all() -> Self {
        Self {
            cidr_ip: "0.0.0.0/0".to_string(),
            ip_protocol: "-1".to_string(),
            description: Some("Allow all outbound traffic by default".to_string()),
        }
    }
}

/// `AWS::EC2::SecurityGroup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    /// Description (required by EC2)
    pub group_description: String,

    /// Owning VPC
    pub vpc_id: Expr,

    /// Outbound rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_egress: Vec<EgressRule>,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `AWS::EC2::SecurityGroupIngress`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupIngress {
    /// Group receiving the rule
    pub group_id: Expr,

    /// Protocol, e.g. `tcp`
    pub ip_protocol: String,

    /// First port of the range
    pub from_port: u16,

    /// Last port of the range
    pub to_port: u16,

    /// Source security group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_security_group_id: Option<Expr>,

    /// Source CIDR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<Expr>,

    /// Rule description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `AWS::EC2::FlowLog`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowLog {
    /// Monitored resource
    pub resource_id: Expr,

    /// `VPC`, `Subnet` or `NetworkInterface`
    pub resource_type: String,

    /// `ACCEPT`, `REJECT` or `ALL`
    pub traffic_type: String,

    /// `cloud-watch-logs` or `s3`
    pub log_destination_type: String,

    /// Destination log group
    pub log_group_name: Expr,

    /// Role assumed to publish the logs
    pub deliver_logs_permission_arn: Expr,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_endpoint_omits_interface_fields() {
        let endpoint = VpcEndpoint {
            vpc_id: Expr::reference("BatchVpc"),
            service_name: Expr::sub("com.amazonaws.${AWS::Region}.s3"),
            vpc_endpoint_type: VpcEndpointType::Gateway,
            route_table_ids: vec![Expr::reference("RouteTableA")],
            subnet_ids: Vec::new(),
            security_group_ids: Vec::new(),
            private_dns_enabled: None,
        };

        assert_eq!(
            serde_json::to_value(&endpoint).ok(),
            Some(json!({
                "VpcId": {"Ref": "BatchVpc"},
                "ServiceName": {"Fn::Sub": "com.amazonaws.${AWS::Region}.s3"},
                "VpcEndpointType": "Gateway",
                "RouteTableIds": [{"Ref": "RouteTableA"}]
            }))
        );
    }

    #[test]
    fn test_ingress_rule_keys() {
        let rule = SecurityGroupIngress {
            group_id: Expr::get_att("Sg", "GroupId"),
            ip_protocol: "tcp".to_string(),
            from_port: 2049,
            to_port: 2049,
            source_security_group_id: Some(Expr::get_att("Sg", "GroupId")),
            cidr_ip: None,
            description: None,
        };
        let value = serde_json::to_value(&rule).unwrap_or_default();
        assert_eq!(value["FromPort"], json!(2049));
        assert_eq!(value["SourceSecurityGroupId"], json!({"Fn::GetAtt": ["Sg", "GroupId"]}));
        assert!(value.get("CidrIp").is_none());
    }
}
