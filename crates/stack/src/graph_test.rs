//! Unit tests for the construction graph

#[cfg(test)]
mod tests {
    use crate::error::GraphError;
    use crate::graph::{Component, ConstructGraph, logical_id};
    use cfn::ec2::{RouteTable, SecurityGroup, Vpc};
    use cfn::{Expr, Output, Parameter, Resource};
    use std::collections::BTreeMap;

    fn vpc() -> Resource {
        Resource::new(Vpc {
            cidr_block: "10.0.0.0/16".to_string(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: "default".to_string(),
            tags: Vec::new(),
        })
    }

    fn route_table(vpc_id: &str) -> Resource {
        Resource::new(RouteTable {
            vpc_id: Expr::reference(vpc_id),
            tags: Vec::new(),
        })
    }

    fn group(vpc_id: Expr) -> Resource {
        Resource::new(SecurityGroup {
            group_description: "test".to_string(),
            vpc_id,
            security_group_egress: Vec::new(),
            tags: Vec::new(),
        })
    }

    #[test]
    fn test_logical_id_from_names() {
        assert_eq!(logical_id("batch-vpc"), "BatchVpc");
        assert_eq!(logical_id("vpce-s3"), "VpceS3");
        assert_eq!(logical_id("cdk-efs-batch-s3-efs"), "CdkEfsBatchS3Efs");
        assert_eq!(logical_id("flow_logs group"), "FlowLogsGroup");
    }

    #[test]
    fn test_duplicate_and_invalid_ids_rejected() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Network, "BatchVpc", vpc()).is_ok());
        assert!(matches!(
            graph.add(Component::Network, "BatchVpc", vpc()),
            Err(GraphError::DuplicateNode(_))
        ));
        assert!(matches!(
            graph.add(Component::Network, "batch-vpc", vpc()),
            Err(GraphError::InvalidLogicalId(_))
        ));
        assert!(matches!(
            graph.add_parameter("BatchVpc", Parameter::string("clash")),
            Err(GraphError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_dependencies_skip_parameters_and_pseudo_parameters() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add_parameter("EcrImageName", Parameter::string("registry")).is_ok());
        assert!(graph.add(Component::Network, "BatchVpc", vpc()).is_ok());
        let sg = group(Expr::reference("BatchVpc")).depends_on("Extra");
        assert!(graph.add(Component::Security, "Sg", sg).is_ok());
        let named = group(Expr::sub("${EcrImageName}-${AWS::Region}-${BatchVpc}"));
        assert!(graph.add(Component::Security, "Named", named).is_ok());

        let deps = graph.dependencies("Sg").unwrap_or_default();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["BatchVpc", "Extra"]);
        let deps = graph.dependencies("Named").unwrap_or_default();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["BatchVpc"]);
    }

    #[test]
    fn test_dangling_reference_reported() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Network, "RouteTableA", route_table("Missing")).is_ok());
        match graph.validate() {
            Err(GraphError::DanglingReference { from, to }) => {
                assert_eq!(from, "RouteTableA");
                assert_eq!(to, "Missing");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_topological_order_puts_dependencies_first() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Network, "ARouteTable", route_table("ZVpc")).is_ok());
        assert!(graph.add(Component::Network, "ZVpc", vpc()).is_ok());
        assert!(graph.add(Component::Network, "BRouteTable", route_table("ZVpc")).is_ok());

        let order = graph.validate().unwrap_or_default();
        assert_eq!(order, vec!["ZVpc", "ARouteTable", "BRouteTable"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Security, "A", group(Expr::get_att("B", "GroupId"))).is_ok());
        assert!(graph.add(Component::Security, "B", group(Expr::reference("A"))).is_ok());
        assert!(graph.add(Component::Network, "C", vpc()).is_ok());

        match graph.validate() {
            Err(GraphError::Cycle(nodes)) => assert_eq!(nodes, vec!["A", "B"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_summary_lists_dependencies() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Network, "BatchVpc", vpc()).is_ok());
        assert!(graph.add(Component::Network, "Rt", route_table("BatchVpc")).is_ok());

        let summary = graph.summary().unwrap_or_default();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].logical_id, "Rt");
        assert_eq!(summary[1].type_name, "AWS::EC2::RouteTable");
        assert!(summary[1].dependencies.contains("BatchVpc"));
    }

    #[test]
    fn test_outputs_must_resolve() {
        let mut graph = ConstructGraph::new();
        assert!(graph.add(Component::Network, "BatchVpc", vpc()).is_ok());
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "Missing".to_string(),
            Output {
                description: None,
                value: Expr::get_att("Nowhere", "Arn"),
            },
        );
        assert!(matches!(
            graph.clone().into_template(None, outputs),
            Err(GraphError::DanglingReference { .. })
        ));

        let mut outputs = BTreeMap::new();
        outputs.insert(
            "VpcId".to_string(),
            Output {
                description: Some("VPC".to_string()),
                value: Expr::reference("BatchVpc"),
            },
        );
        let template = graph.into_template(Some("test".to_string()), outputs);
        let template = template.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(template.resources.len(), 1);
        assert_eq!(template.outputs.len(), 1);
    }
}
