//! Unit tests for the flow log provisioner

#[cfg(test)]
mod tests {
    use crate::config::{NetworkConfig, ObservabilityConfig};
    use crate::graph::ConstructGraph;
    use crate::provision::network::create_vpc;
    use crate::provision::observability::create_vpc_flow_logs;
    use cfn::DeletionPolicy;
    use serde_json::json;

    #[test]
    fn test_flow_logs_deliver_to_retained_group() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let handle = create_vpc_flow_logs(&mut graph, &ObservabilityConfig::default(), &network)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(handle.log_group, "FlowLogsGroup");
        assert_eq!(handle.role, "CloudWatchLogsRole");
        assert_eq!(handle.flow_log, "BatchVpcFlowLog");

        let group = graph.get(&handle.log_group).unwrap_or_else(|| panic!("log group missing"));
        assert_eq!(group.resource.deletion_policy, Some(DeletionPolicy::Retain));
        let group = serde_json::to_value(&group.resource).unwrap_or_default();
        assert_eq!(group["Properties"]["RetentionInDays"], json!(731));

        let flow_log = graph.get(&handle.flow_log).unwrap_or_else(|| panic!("flow log missing"));
        let props = serde_json::to_value(&flow_log.resource).unwrap_or_default()["Properties"].clone();
        assert_eq!(props["ResourceId"], json!({"Ref": "BatchVpc"}));
        assert_eq!(props["TrafficType"], json!("ALL"));
        assert_eq!(props["LogGroupName"], json!({"Ref": "FlowLogsGroup"}));
        assert_eq!(props["DeliverLogsPermissionArn"], json!({"Fn::GetAtt": ["CloudWatchLogsRole", "Arn"]}));

        let role = graph.get(&handle.role).unwrap_or_else(|| panic!("role missing"));
        let role = serde_json::to_value(&role.resource).unwrap_or_default();
        assert_eq!(
            role["Properties"]["AssumeRolePolicyDocument"]["Statement"][0]["Principal"],
            json!({"Service": ["vpc-flow-logs.amazonaws.com"]})
        );
        assert!(graph.validate().is_ok());
    }
}
