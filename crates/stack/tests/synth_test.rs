//! Integration tests for stack synthesis
//!
//! Run the full pipeline from configuration to rendered template and check
//! the properties the deployed stack relies on.

use brender_stack::{ConfigError, StackConfig, SynthError, VersionsInput, build, synthesize};
use cfn::{DeletionPolicy, Template, collect_references, is_pseudo_parameter};
use serde_json::{Value, json};
use std::collections::BTreeSet;

const NETWORK_TYPES: &[&str] = &[
    "AWS::EC2::VPC",
    "AWS::EC2::InternetGateway",
    "AWS::EC2::VPCGatewayAttachment",
    "AWS::EC2::Subnet",
    "AWS::EC2::RouteTable",
    "AWS::EC2::SubnetRouteTableAssociation",
    "AWS::EC2::Route",
    "AWS::EC2::VPCEndpoint",
];

fn config(versions: &str) -> StackConfig {
    StackConfig {
        stack_name: "BRENDER-STACK-TEST".to_string(),
        bucket_name: Some("brender-david-studio-test".to_string()),
        blender_versions: Some(VersionsInput::from(versions)),
        ..StackConfig::default()
    }
}

fn render(versions: &str) -> (Template, Value) {
    let template = synthesize(config(versions)).unwrap_or_else(|e| panic!("synthesis failed: {e}"));
    let value = serde_json::to_value(&template).unwrap_or_else(|e| panic!("{e}"));
    (template, value)
}

#[test]
fn test_three_versions_give_three_job_definitions() {
    let (template, value) = render("GPU-4.0.0,CPU-4.0.0,CPU-3.6.0");
    let definitions: Vec<&String> = template
        .resources_of_type("AWS::Batch::JobDefinition")
        .map(|(id, _)| id)
        .collect();
    assert_eq!(definitions, vec!["BatchJobDefn0", "BatchJobDefn1", "BatchJobDefn2"]);

    let mut registries = BTreeSet::new();
    for (index, tag) in ["gpu-4.0.0", "cpu-4.0.0", "cpu-3.6.0"].iter().enumerate() {
        let props = &value["Resources"][format!("BatchJobDefn{index}")]["Properties"];
        let image = props["ContainerProperties"]["Image"]["Fn::Sub"].as_str().unwrap_or_default();
        let (registry, image_tag) = image.rsplit_once(':').unwrap_or_default();
        assert_eq!(image_tag, *tag);
        registries.insert(registry.to_string());
        assert_eq!(props["ContainerProperties"]["MountPoints"][0]["ContainerPath"], json!("/mnt/efs"));
    }
    assert_eq!(registries.len(), 1);
}

#[test]
fn test_repeated_version_gets_a_definition_per_element() {
    let (template, value) = render("GPU-4.0.0,gpu-4.0.0");
    assert_eq!(template.resources_of_type("AWS::Batch::JobDefinition").count(), 2);
    for id in ["BatchJobDefn0", "BatchJobDefn1"] {
        let image = value["Resources"][id]["Properties"]["ContainerProperties"]["Image"]["Fn::Sub"]
            .as_str()
            .unwrap_or_default();
        assert!(image.ends_with(":gpu-4.0.0"), "{id}: {image}");
    }
}

#[test]
fn test_missing_inputs_fail_before_any_resource() {
    let mut missing_bucket = config("GPU-4.0.0");
    missing_bucket.bucket_name = None;
    assert!(matches!(
        build(missing_bucket),
        Err(SynthError::Config(ConfigError::MissingBucketName))
    ));

    let mut missing_versions = config("GPU-4.0.0");
    missing_versions.blender_versions = None;
    assert!(matches!(
        build(missing_versions),
        Err(SynthError::Config(ConfigError::MissingVersionList))
    ));

    assert!(matches!(
        build(config("")),
        Err(SynthError::Config(ConfigError::MissingVersionList))
    ));
    assert!(matches!(
        build(config("gpu-4.0.0,,cpu-3.6.0")),
        Err(SynthError::Config(ConfigError::EmptyVersionElement { index: 1 }))
    ));
}

#[test]
fn test_synthesis_is_idempotent() {
    let first = synthesize(config("GPU-4.0.0,CPU-3.6.0")).and_then(|t| Ok(t.to_json_pretty()?));
    let second = synthesize(config("GPU-4.0.0,CPU-3.6.0")).and_then(|t| Ok(t.to_json_pretty()?));
    let first = first.unwrap_or_else(|e| panic!("{e}"));
    let second = second.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(first, second);
}

#[test]
fn test_every_reference_resolves() {
    let (template, value) = render("GPU-4.0.0,CPU-4.0.0");
    let declared: BTreeSet<&String> = template.resources.keys().chain(template.parameters.keys()).collect();

    for section in ["Resources", "Outputs"] {
        for target in collect_references(&value[section]) {
            assert!(
                is_pseudo_parameter(&target) || declared.contains(&target),
                "{section} references undeclared {target}"
            );
        }
    }
    for (id, resource) in &template.resources {
        for dep in &resource.depends_on {
            assert!(template.resources.contains_key(dep), "{id} depends on undeclared {dep}");
        }
    }
}

#[test]
fn test_network_resources_are_deleted_and_data_is_retained() {
    let (template, _) = render("CPU-4.0.0");
    for type_name in NETWORK_TYPES {
        for (id, resource) in template.resources_of_type(type_name) {
            assert_eq!(resource.deletion_policy, Some(DeletionPolicy::Delete), "{id}");
        }
    }
    for type_name in ["AWS::S3::Bucket", "AWS::EFS::FileSystem", "AWS::Logs::LogGroup"] {
        for (id, resource) in template.resources_of_type(type_name) {
            assert_eq!(resource.deletion_policy, Some(DeletionPolicy::Retain), "{id}");
        }
    }
    assert_eq!(template.resources_of_type("AWS::EC2::NatGateway").count(), 0);
}

#[test]
fn test_s3_policy_is_scoped_to_the_bucket() {
    let (template, value) = render("CPU-4.0.0");
    assert_eq!(template.resources_of_type("AWS::S3::Bucket").count(), 1);

    let statements = &value["Resources"]["S3AccessPolicy"]["Properties"]["PolicyDocument"]["Statement"];
    let actions: BTreeSet<&str> = statements[0]["Action"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(
        actions,
        BTreeSet::from(["s3:GetObject", "s3:PutObject", "s3:DeleteObject", "s3:ListBucket"])
    );
    let resources = statements[0]["Resource"].as_array().cloned().unwrap_or_default();
    assert_eq!(resources.len(), 2);
    assert!(!resources.contains(&json!("*")));

    let bucket = &value["Resources"]["BrenderBucket"]["Properties"];
    assert_eq!(bucket["BucketName"], json!("brender-david-studio-test"));
}

#[test]
fn test_parameters_and_outputs() {
    let (template, value) = render("GPU-4.0.0");
    let parameters: Vec<&String> = template.parameters.keys().collect();
    assert_eq!(parameters, vec!["EcrImageName", "ListFnCodeBucket", "ListFnCodeKey"]);
    assert_eq!(
        value["Parameters"]["ListFnCodeKey"]["Default"],
        json!("lambda/list-efs-contents.zip")
    );

    for output in ["ApiUrl", "BucketName", "FileSystemId", "AccessPointId", "BatchJobDefn0Arn"] {
        assert!(template.outputs.contains_key(output), "missing output {output}");
    }
    for queue in ["OnDemandCPU", "SpotCPU", "OnDemandGPU", "SpotGPU"] {
        assert!(template.outputs.contains_key(&format!("JobQueue{queue}Arn")), "{queue}");
    }
    assert!(
        template
            .description
            .as_deref()
            .is_some_and(|d| d.starts_with("BRENDER-STUDIO-STACK"))
    );
}

#[test]
fn test_shared_group_allows_nfs_from_itself() {
    let (_, value) = render("CPU-4.0.0");
    let rule = &value["Resources"]["BatchVpcSgIngress2049FromBatchVpcSg"]["Properties"];
    assert_eq!(rule["FromPort"], json!(2049));
    assert_eq!(rule["SourceSecurityGroupId"], rule["GroupId"]);
}

#[test]
fn test_graph_summary_orders_vpc_first() {
    let stack = build(config("CPU-4.0.0")).unwrap_or_else(|e| panic!("{e}"));
    let summary = stack.graph.summary().unwrap_or_else(|e| panic!("{e}"));
    let position = |id: &str| summary.iter().position(|node| node.logical_id == id);
    assert!(position("BatchVpc") < position("BatchVpcSg"));
    assert!(position("BatchVpcSg") < position("ComputeEnvSpotCPU"));
    assert!(position("ComputeEnvSpotCPU") < position("JobQueueSpotCPU"));
    assert!(position("CdkEfsBatchS3EfsMountTarget1") < position("ListEfsContentsFn"));
}

#[test]
fn test_yaml_rendering() {
    let (template, _) = render("CPU-4.0.0");
    let yaml = template.to_yaml().unwrap_or_else(|e| panic!("{e}"));
    assert!(yaml.contains("2010-09-09"));
    assert!(yaml.contains("Type: AWS::Batch::JobQueue"));
}
