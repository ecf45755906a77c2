//! Unit tests for the storage provisioner

#[cfg(test)]
mod tests {
    use crate::config::{NetworkConfig, StorageConfig};
    use crate::graph::ConstructGraph;
    use crate::provision::network::create_vpc;
    use crate::provision::security::create_security_group;
    use crate::provision::storage::{allow_nfs_from, create_access_point, create_bucket, create_file_system};
    use cfn::DeletionPolicy;
    use serde_json::{Value, json};

    fn resource(graph: &ConstructGraph, id: &str) -> Value {
        let node = graph.get(id).unwrap_or_else(|| panic!("{id} not declared"));
        serde_json::to_value(&node.resource).unwrap_or_default()
    }

    #[test]
    fn test_file_system_access_point_and_bucket() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let group = create_security_group(&mut graph, "batch-vpc-sg", "test", &network).unwrap_or_else(|e| panic!("{e}"));
        let config = StorageConfig::default();

        let fs = create_file_system(&mut graph, &config, &network, &group).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(fs.logical_id, "CdkEfsBatchS3Efs");
        assert_eq!(fs.mount_targets.len(), 2);

        let fs_json = resource(&graph, &fs.logical_id);
        assert_eq!(fs_json["Properties"]["Encrypted"], json!(true));
        assert_eq!(fs_json["Properties"]["PerformanceMode"], json!("generalPurpose"));
        assert_eq!(fs_json["DeletionPolicy"], json!("Retain"));

        let target = resource(&graph, &fs.mount_targets[0]);
        assert_eq!(
            target["Properties"]["SecurityGroups"],
            json!([{"Fn::GetAtt": ["BatchVpcSg", "GroupId"]}])
        );
        assert_eq!(
            target["Properties"]["SubnetId"],
            json!({"Ref": "BatchVpcPrivateSubnet1Az1Subnet"})
        );

        let ap = create_access_point(&mut graph, &config, &fs).unwrap_or_else(|e| panic!("{e}"));
        let ap_json = resource(&graph, &ap.logical_id);
        assert_eq!(
            ap_json["Properties"]["RootDirectory"],
            json!({
                "Path": "/projects",
                "CreationInfo": {"OwnerUid": "1001", "OwnerGid": "1001", "Permissions": "750"}
            })
        );
        assert_eq!(ap_json["Properties"]["PosixUser"], json!({"Uid": "1001", "Gid": "1001"}));

        let bucket = create_bucket(&mut graph, "brender-test-bucket").unwrap_or_else(|e| panic!("{e}"));
        let node = graph
            .get(&bucket.logical_id)
            .unwrap_or_else(|| panic!("bucket missing"));
        assert_eq!(node.resource.deletion_policy, Some(DeletionPolicy::Retain));
        assert_eq!(
            serde_json::to_value(bucket.objects_arn()).unwrap_or_default(),
            json!({"Fn::Sub": "${BrenderBucket.Arn}/*"})
        );

        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_nfs_self_ingress() {
        let mut graph = ConstructGraph::new();
        let network = create_vpc(&mut graph, &NetworkConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        let group = create_security_group(&mut graph, "batch-vpc-sg", "test", &network).unwrap_or_else(|e| panic!("{e}"));
        let fs = create_file_system(&mut graph, &StorageConfig::default(), &network, &group)
            .unwrap_or_else(|e| panic!("{e}"));

        let rule = allow_nfs_from(&mut graph, &fs, &group).unwrap_or_else(|e| panic!("{e}"));
        let props = resource(&graph, &rule)["Properties"].clone();
        assert_eq!(props["FromPort"], json!(2049));
        assert_eq!(props["ToPort"], json!(2049));
        assert_eq!(props["GroupId"], props["SourceSecurityGroupId"]);
    }
}
