//! Unit tests for the network provisioner

#[cfg(test)]
mod tests {
    use crate::config::{NetworkConfig, SubnetConfig, SubnetTier};
    use crate::error::ConfigError;
    use crate::graph::ConstructGraph;
    use crate::provision::network::{add_interface_endpoint, allocate_subnets, create_vpc};
    use crate::provision::security::create_security_group;
    use cfn::DeletionPolicy;
    use serde_json::{Value, json};

    fn properties(graph: &ConstructGraph, id: &str) -> Value {
        let node = graph.get(id).unwrap_or_else(|| panic!("{id} not declared"));
        serde_json::to_value(&node.resource).unwrap_or_default()["Properties"].clone()
    }

    #[test]
    fn test_default_layout_carves_sequential_slash_24s() {
        let cidrs = allocate_subnets(&NetworkConfig::default()).unwrap_or_default();
        assert_eq!(cidrs, vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]);
    }

    #[test]
    fn test_mixed_masks_are_aligned() {
        let config = NetworkConfig {
            subnets: vec![
                SubnetConfig {
                    name: "small".to_string(),
                    cidr_mask: 26,
                    tier: SubnetTier::Public,
                },
                SubnetConfig {
                    name: "large".to_string(),
                    cidr_mask: 24,
                    tier: SubnetTier::PrivateWithEgress,
                },
            ],
            ..NetworkConfig::default()
        };
        let cidrs = allocate_subnets(&config).unwrap_or_default();
        assert_eq!(cidrs, vec!["10.0.0.0/26", "10.0.0.64/26", "10.0.1.0/24", "10.0.2.0/24"]);
    }

    #[test]
    fn test_unusable_cidrs_rejected() {
        let config = NetworkConfig {
            cidr: "10.0.0.1/16".to_string(),
            ..NetworkConfig::default()
        };
        assert!(matches!(allocate_subnets(&config), Err(ConfigError::InvalidCidr { .. })));

        let config = NetworkConfig {
            cidr: "not-a-cidr".to_string(),
            ..NetworkConfig::default()
        };
        assert!(matches!(allocate_subnets(&config), Err(ConfigError::InvalidCidr { .. })));

        let config = NetworkConfig {
            max_azs: 300,
            ..NetworkConfig::default()
        };
        assert!(matches!(allocate_subnets(&config), Err(ConfigError::CidrExhausted(_))));
    }

    #[test]
    fn test_vpc_resources_and_routing() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(network.vpc, "BatchVpc");
        assert_eq!(network.subnet_ids(SubnetTier::Public).len(), 2);
        assert_eq!(network.subnet_ids(SubnetTier::PrivateWithEgress).len(), 2);
        assert_eq!(network.route_tables.len(), 4);
        assert_eq!(graph.ids_of_type("AWS::EC2::Subnet").count(), 4);
        assert_eq!(graph.ids_of_type("AWS::EC2::Route").count(), 2);
        assert_eq!(graph.ids_of_type("AWS::EC2::NatGateway").count(), 0);

        let vpc = properties(&graph, "BatchVpc");
        assert_eq!(vpc["EnableDnsSupport"], json!(true));
        assert_eq!(vpc["EnableDnsHostnames"], json!(true));

        let public = &network.subnet_ids(SubnetTier::Public)[0];
        assert_eq!(properties(&graph, public)["MapPublicIpOnLaunch"], json!(true));
        let private = &network.subnet_ids(SubnetTier::PrivateWithEgress)[0];
        assert_eq!(properties(&graph, private)["MapPublicIpOnLaunch"], json!(false));
        assert_eq!(properties(&graph, private)["CidrBlock"], json!("10.0.2.0/24"));

        let route = graph
            .get("BatchVpcPublicSubnet1Az1DefaultRoute")
            .unwrap_or_else(|| panic!("default route missing"));
        assert_eq!(route.resource.depends_on, vec!["BatchVpcIgwAttachment".to_string()]);
    }

    #[test]
    fn test_gateway_endpoint_covers_every_route_table() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let endpoint = properties(&graph, "BatchVpcVpceS3");
        assert_eq!(endpoint["VpcEndpointType"], json!("Gateway"));
        assert_eq!(
            endpoint["RouteTableIds"].as_array().map(Vec::len),
            Some(network.route_tables.len())
        );
    }

    #[test]
    fn test_every_network_resource_is_deleted_with_the_stack() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let group = create_security_group(&mut graph, "batch-vpc-sg", "test", &network).unwrap_or_else(|e| panic!("{e}"));
        add_interface_endpoint(&mut graph, &network, &NetworkConfig::default(), &group).unwrap_or_else(|e| panic!("{e}"));

        for (id, node) in graph.nodes() {
            if node.component == crate::graph::Component::Network {
                assert_eq!(node.resource.deletion_policy, Some(DeletionPolicy::Delete), "{id}");
            }
        }
    }

    #[test]
    fn test_interface_endpoint_opens_https_from_vpc() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let group = create_security_group(&mut graph, "batch-vpc-sg", "test", &network).unwrap_or_else(|e| panic!("{e}"));
        let endpoint =
            add_interface_endpoint(&mut graph, &network, &NetworkConfig::default(), &group).unwrap_or_else(|e| panic!("{e}"));

        let props = properties(&graph, &endpoint);
        assert_eq!(
            props["ServiceName"],
            json!({"Fn::Sub": "com.amazonaws.${AWS::Region}.elasticfilesystem"})
        );
        assert_eq!(props["PrivateDnsEnabled"], json!(true));
        assert_eq!(props["SubnetIds"].as_array().map(Vec::len), Some(2));

        let ingress = properties(&graph, "BatchVpcSgIngress443FromCidr");
        assert_eq!(ingress["FromPort"], json!(443));
        assert_eq!(ingress["CidrIp"], json!({"Fn::GetAtt": ["BatchVpc", "CidrBlock"]}));
        assert!(graph.validate().is_ok());
    }
}
