//! Compute-provisioning component
//!
//! Batch compute environments, one per configured pool, each with its own
//! instance role and job queue, plus one job definition per Blender version.
//! Images come from the registry named by the `EcrImageName` parameter and
//! are tagged with the lower-cased version.

use crate::config::{ComputeConfig, ComputePoolConfig, HardwareClass, PricingModel, SubnetTier};
use crate::error::GraphError;
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::network::NetworkHandle;
use crate::provision::security::SecurityGroupHandle;
use crate::provision::storage::{BucketHandle, FileSystemHandle};
use crate::versions::{BlenderVersion, VersionList};
use cfn::batch::{
    AllocationStrategy, ComputeEnvironment, ComputeEnvironmentOrder, ComputeResourceType, ComputeResources,
    ContainerProperties, EfsVolumeConfiguration, JobDefinition, JobQueue, MountPoint, ResourceRequirement,
    ResourceType, RetryStrategy, State, Timeout, Volume,
};
use cfn::iam::{InstanceProfile, ManagedPolicy, PolicyDocument, Role, Statement, aws_managed_policy};
use cfn::{Expr, Resource};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Parameter naming the image registry
pub const ECR_IMAGE_PARAMETER: &str = "EcrImageName";

/// Volume name of the shared file system inside job containers
const EFS_VOLUME_NAME: &str = "efs-volume";

/// Managed policy every ECS container instance needs
const ECS_INSTANCE_POLICY: &str = "service-role/AmazonEC2ContainerServiceforEC2Role";

/// Object-level access to the render bucket
pub const S3_ACTIONS: [&str; 4] = ["s3:GetObject", "s3:PutObject", "s3:DeleteObject", "s3:ListBucket"];

/// Logical ID of the shared bucket policy
pub const S3_POLICY_ID: &str = "S3AccessPolicy";

/// Logical ID of the registry pull policy
pub const ECR_POLICY_ID: &str = "EcrPullPolicy";

/// Pricing of a resolved pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing {
    /// On-demand EC2
    OnDemand {
        /// Placement strategy
        allocation_strategy: AllocationStrategy,
    },
    /// Spot EC2
    Spot {
        /// Maximum price as a percentage of on-demand
        bid_percentage: u32,
        /// Placement strategy
        allocation_strategy: AllocationStrategy,
    },
}

/// A compute pool with every default resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePoolSpec {
    /// Pool name, e.g. `SpotGPU`
    pub name: String,
    /// CPU or GPU
    pub hardware: HardwareClass,
    /// On-demand or spot
    pub pricing: Pricing,
    /// Instance families, or `optimal`
    pub instance_types: Vec<String>,
    /// Lower vCPU bound
    pub min_vcpus: u32,
    /// Upper vCPU bound
    pub max_vcpus: u32,
    /// Accept jobs
    pub enabled: bool,
    /// Subnet tier the instances launch in
    pub subnet_tier: SubnetTier,
}

impl ComputePoolSpec {
    /// Resolve a configured pool; `private` selects the private subnet tier
    #[must_use]
    pub fn from_config(pool: &ComputePoolConfig, private: bool) -> Self {
        let pricing = match pool.pricing {
            PricingModel::OnDemand => Pricing::OnDemand {
                allocation_strategy: AllocationStrategy::BestFitProgressive,
            },
            PricingModel::Spot => Pricing::Spot {
                bid_percentage: pool.bid_percentage,
                allocation_strategy: AllocationStrategy::SpotCapacityOptimized,
            },
        };
        Self {
            name: pool.name(),
            hardware: pool.hardware,
            pricing,
            instance_types: pool.families(),
            min_vcpus: pool.min_vcpus,
            max_vcpus: pool.max_vcpus,
            enabled: pool.enabled,
            subnet_tier: if private {
                SubnetTier::PrivateWithEgress
            } else {
                SubnetTier::Public
            },
        }
    }

    /// Physical compute environment name
    #[must_use]
    pub fn compute_environment_name(&self) -> String {
        format!("ComputeEnv{}", self.name)
    }

    /// Physical job queue name
    #[must_use]
    pub fn job_queue_name(&self) -> String {
        format!("JobQueue{}", self.name)
    }

    /// Instance role logical ID
    #[must_use]
    pub fn role_name(&self) -> String {
        format!("ComputeEnvironmentRole{}", self.name)
    }

    fn compute_resources(&self, instance_profile: &str, subnets: Vec<Expr>, group: &SecurityGroupHandle) -> ComputeResources {
        let (kind, allocation_strategy, bid_percentage) = match self.pricing {
            Pricing::OnDemand { allocation_strategy } => (ComputeResourceType::Ec2, allocation_strategy, None),
            Pricing::Spot {
                bid_percentage,
                allocation_strategy,
            } => (ComputeResourceType::Spot, allocation_strategy, Some(bid_percentage)),
        };
        ComputeResources {
            kind,
            allocation_strategy,
            bid_percentage,
            minv_cpus: self.min_vcpus,
            maxv_cpus: self.max_vcpus,
            instance_types: self.instance_types.clone(),
            instance_role: Expr::get_att(instance_profile, "Arn"),
            subnets,
            security_group_ids: vec![group.group_id()],
        }
    }
}

/// Resources the compute component depends on
#[derive(Debug, Clone, Copy)]
pub struct BatchInputs<'a> {
    /// VPC
    pub network: &'a NetworkHandle,
    /// Group the instances join
    pub security_group: &'a SecurityGroupHandle,
    /// Shared file system mounted by every job
    pub file_system: &'a FileSystemHandle,
    /// Render bucket
    pub bucket: &'a BucketHandle,
    /// One job definition per element
    pub versions: &'a VersionList,
    /// Launch instances in the private tier
    pub private: bool,
}

/// Logical IDs declared by the compute component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchHandle {
    /// Compute environment per pool name
    pub compute_environments: BTreeMap<String, String>,
    /// Job queue per pool name
    pub job_queues: BTreeMap<String, String>,
    /// Instance role per pool name
    pub instance_roles: BTreeMap<String, String>,
    /// Job definitions in version-list order
    pub job_definitions: Vec<String>,
}

/// Declare pools, queues, roles and job definitions
pub fn create_batch_resources(
    graph: &mut ConstructGraph,
    config: &ComputeConfig,
    inputs: &BatchInputs<'_>,
) -> Result<BatchHandle, GraphError> {
    info!(
        "Creating Batch resources: {} pools, {} job definitions",
        config.pools.len(),
        inputs.versions.len()
    );

    create_s3_policy(graph, inputs.bucket)?;
    create_ecr_pull_policy(graph)?;

    let mut handle = BatchHandle::default();
    for pool in &config.pools {
        let spec = ComputePoolSpec::from_config(pool, inputs.private);
        create_pool(graph, &spec, config.queue_priority, inputs, &mut handle)?;
    }

    for (index, version) in inputs.versions.iter().enumerate() {
        let id = create_job_definition(graph, config, index, version, inputs.file_system)?;
        handle.job_definitions.push(id);
    }

    Ok(handle)
}

fn create_pool(
    graph: &mut ConstructGraph,
    spec: &ComputePoolSpec,
    priority: u32,
    inputs: &BatchInputs<'_>,
    handle: &mut BatchHandle,
) -> Result<(), GraphError> {
    debug!(
        "Pool {}: {:?} on {:?}, vCPUs [{}, {}]",
        spec.name, spec.instance_types, spec.subnet_tier, spec.min_vcpus, spec.max_vcpus
    );

    let role = spec.role_name();
    graph.add(
        Component::Compute,
        &role,
        Resource::new(Role {
            assume_role_policy_document: PolicyDocument::assume_role("ec2.amazonaws.com"),
            description: Some(format!("Instance role of the {} compute environment", spec.name)),
            managed_policy_arns: vec![
                aws_managed_policy(ECS_INSTANCE_POLICY),
                Expr::reference(S3_POLICY_ID),
                Expr::reference(ECR_POLICY_ID),
            ],
            policies: Vec::new(),
        }),
    )?;

    let profile = format!("{role}InstanceProfile");
    graph.add(
        Component::Compute,
        &profile,
        Resource::new(InstanceProfile {
            roles: vec![Expr::reference(&role)],
        }),
    )?;

    let environment = spec.compute_environment_name();
    let state = State::from(spec.enabled);
    graph.add(
        Component::Compute,
        &environment,
        Resource::new(ComputeEnvironment {
            compute_environment_name: environment.clone(),
            kind: "MANAGED".to_string(),
            state,
            compute_resources: spec.compute_resources(
                &profile,
                inputs.network.subnet_refs(spec.subnet_tier),
                inputs.security_group,
            ),
        }),
    )?;

    let queue = spec.job_queue_name();
    graph.add(
        Component::Compute,
        &queue,
        Resource::new(JobQueue {
            job_queue_name: queue.clone(),
            priority,
            state,
            compute_environment_order: vec![ComputeEnvironmentOrder {
                compute_environment: Expr::reference(&environment),
                order: 1,
            }],
        }),
    )?;

    handle.instance_roles.insert(spec.name.clone(), role);
    handle.compute_environments.insert(spec.name.clone(), environment);
    handle.job_queues.insert(spec.name.clone(), queue);
    Ok(())
}

/// Bucket access shared by every instance role, declared once
fn create_s3_policy(graph: &mut ConstructGraph, bucket: &BucketHandle) -> Result<(), GraphError> {
    graph.add(
        Component::Compute,
        S3_POLICY_ID,
        Resource::new(ManagedPolicy {
            description: Some(format!("Object access to {}", bucket.name)),
            policy_document: PolicyDocument::new(vec![Statement::allow(
                S3_ACTIONS,
                vec![bucket.arn(), bucket.objects_arn()],
            )]),
        }),
    )
}

fn create_ecr_pull_policy(graph: &mut ConstructGraph) -> Result<(), GraphError> {
    let repository = Expr::sub(format!(
        "arn:${{AWS::Partition}}:ecr:${{AWS::Region}}:${{AWS::AccountId}}:repository/${{{ECR_IMAGE_PARAMETER}}}"
    ));
    graph.add(
        Component::Compute,
        ECR_POLICY_ID,
        Resource::new(ManagedPolicy {
            description: Some("Pull Blender images from the render registry".to_string()),
            policy_document: PolicyDocument::new(vec![
                Statement::allow(
                    ["ecr:BatchCheckLayerAvailability", "ecr:GetDownloadUrlForLayer", "ecr:BatchGetImage"],
                    vec![repository],
                ),
                Statement::allow(["ecr:GetAuthorizationToken"], vec![Expr::literal("*")]),
            ]),
        }),
    )
}

/// Image reference `<account>.dkr.ecr.<region>.<suffix>/<registry>:<tag>`
#[must_use]
pub fn image_uri(version: &BlenderVersion) -> Expr {
    Expr::sub(format!(
        "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/${{{ECR_IMAGE_PARAMETER}}}:{version}"
    ))
}

fn create_job_definition(
    graph: &mut ConstructGraph,
    config: &ComputeConfig,
    index: usize,
    version: &BlenderVersion,
    file_system: &FileSystemHandle,
) -> Result<String, GraphError> {
    let name = format!("{}-{index}", config.job_definition_name);
    let container = format!("{}-{index}", config.container_definition_name);
    let id = logical_id(&name);
    debug!("Job definition {} -> {}", name, version);

    let job = &config.job;
    let tags = BTreeMap::from([
        ("brender:container".to_string(), container),
        ("brender:blender-version".to_string(), version.to_string()),
        (
            "brender:hardware".to_string(),
            if version.is_gpu() { "gpu" } else { "cpu" }.to_string(),
        ),
    ]);

    graph.add(
        Component::Compute,
        &id,
        Resource::new(JobDefinition {
            job_definition_name: name,
            kind: "container".to_string(),
            platform_capabilities: vec!["EC2".to_string()],
            timeout: Some(Timeout {
                attempt_duration_seconds: job.timeout_seconds,
            }),
            retry_strategy: Some(RetryStrategy {
                attempts: job.retry_attempts,
            }),
            container_properties: ContainerProperties {
                image: image_uri(version),
                resource_requirements: vec![
                    ResourceRequirement {
                        kind: ResourceType::Memory,
                        value: job.memory_mib.to_string(),
                    },
                    ResourceRequirement {
                        kind: ResourceType::Vcpu,
                        value: job.vcpus.to_string(),
                    },
                ],
                volumes: vec![Volume {
                    name: EFS_VOLUME_NAME.to_string(),
                    efs_volume_configuration: Some(EfsVolumeConfiguration {
                        file_system_id: file_system.id(),
                        root_directory: "/".to_string(),
                        transit_encryption: State::Enabled,
                    }),
                }],
                mount_points: vec![MountPoint {
                    source_volume: EFS_VOLUME_NAME.to_string(),
                    container_path: job.mount_path.clone(),
                    read_only: false,
                }],
            },
            tags,
        }),
    )?;
    Ok(id)
}
