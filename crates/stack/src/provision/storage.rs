//! Storage provisioner
//!
//! The shared file system (with one mount target per private subnet), the
//! access point the Lambda mounts, and the render bucket. The file system and
//! the bucket outlive the stack.

use crate::config::{StorageConfig, SubnetTier};
use crate::error::GraphError;
use crate::graph::{Component, ConstructGraph, logical_id};
use crate::provision::network::NetworkHandle;
use crate::provision::security::{self, SecurityGroupHandle};
use cfn::efs::{AccessPoint, CreationInfo, FileSystem, MountTarget, PosixUser, RootDirectory};
use cfn::s3::Bucket;
use cfn::{Expr, Resource, Tag};
use tracing::info;

/// NFS
pub const NFS_PORT: u16 = 2049;

/// Directory mode of the access point root
const ACCESS_POINT_PERMISSIONS: &str = "750";

/// File system and its mount targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemHandle {
    /// File system logical ID
    pub logical_id: String,
    /// One mount target per private subnet
    pub mount_targets: Vec<String>,
    /// Group guarding the mount targets
    pub security_group: SecurityGroupHandle,
}

impl FileSystemHandle {
    /// File system ID (`fs-...`)
    #[must_use]
    pub fn id(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    /// File system ARN
    #[must_use]
    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

/// Access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointHandle {
    /// Logical ID
    pub logical_id: String,
    /// Root directory inside the file system
    pub path: String,
}

impl AccessPointHandle {
    /// Access point ID (`fsap-...`)
    #[must_use]
    pub fn id(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    /// Access point ARN
    #[must_use]
    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }
}

/// Render bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    /// Logical ID
    pub logical_id: String,
    /// Physical bucket name
    pub name: String,
}

impl BucketHandle {
    /// Bucket name as resolved by the provider
    #[must_use]
    pub fn name_ref(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    /// Bucket ARN
    #[must_use]
    pub fn arn(&self) -> Expr {
        Expr::get_att(&self.logical_id, "Arn")
    }

    /// ARN of every object in the bucket
    #[must_use]
    pub fn objects_arn(&self) -> Expr {
        Expr::sub(format!("${{{}.Arn}}/*", self.logical_id))
    }
}

/// Declare the encrypted file system and its mount targets
pub fn create_file_system(
    graph: &mut ConstructGraph,
    config: &StorageConfig,
    network: &NetworkHandle,
    group: &SecurityGroupHandle,
) -> Result<FileSystemHandle, GraphError> {
    let id = logical_id(&config.file_system_name);
    info!("Creating file system {}", config.file_system_name);
    graph.add(
        Component::Storage,
        &id,
        Resource::new(FileSystem {
            encrypted: true,
            performance_mode: "generalPurpose".to_string(),
            throughput_mode: "bursting".to_string(),
            file_system_tags: vec![Tag::name(&config.file_system_name)],
        })
        .retained(),
    )?;

    let mut mount_targets = Vec::new();
    for (index, subnet) in network.subnet_ids(SubnetTier::PrivateWithEgress).iter().enumerate() {
        let target = format!("{id}MountTarget{}", index + 1);
        graph.add(
            Component::Storage,
            &target,
            Resource::new(MountTarget {
                file_system_id: Expr::reference(&id),
                subnet_id: Expr::reference(subnet),
                security_groups: vec![group.group_id()],
            }),
        )?;
        mount_targets.push(target);
    }

    Ok(FileSystemHandle {
        logical_id: id,
        mount_targets,
        security_group: group.clone(),
    })
}

/// Declare the access point rooted at the configured path
pub fn create_access_point(
    graph: &mut ConstructGraph,
    config: &StorageConfig,
    file_system: &FileSystemHandle,
) -> Result<AccessPointHandle, GraphError> {
    let id = logical_id(&config.access_point_name);
    let owner = config.posix_id.to_string();
    info!("Creating access point {} at {}", config.access_point_name, config.access_point_path);
    graph.add(
        Component::Storage,
        &id,
        Resource::new(AccessPoint {
            file_system_id: file_system.id(),
            posix_user: Some(PosixUser {
                uid: owner.clone(),
                gid: owner.clone(),
            }),
            root_directory: Some(RootDirectory {
                path: config.access_point_path.clone(),
                creation_info: Some(CreationInfo {
                    owner_uid: owner.clone(),
                    owner_gid: owner,
                    permissions: ACCESS_POINT_PERMISSIONS.to_string(),
                }),
            }),
            access_point_tags: vec![Tag::name(&config.access_point_name)],
        }),
    )?;
    Ok(AccessPointHandle {
        logical_id: id,
        path: config.access_point_path.clone(),
    })
}

/// Declare the render bucket
pub fn create_bucket(graph: &mut ConstructGraph, name: &str) -> Result<BucketHandle, GraphError> {
    let id = "BrenderBucket".to_string();
    info!("Creating bucket {}", name);
    graph.add(
        Component::Storage,
        &id,
        Resource::new(Bucket {
            bucket_name: Some(name.to_string()),
            tags: vec![Tag::name(name)],
        })
        .retained(),
    )?;
    Ok(BucketHandle {
        logical_id: id,
        name: name.to_string(),
    })
}

/// Open NFS on the file system's group from `source`
pub fn allow_nfs_from(
    graph: &mut ConstructGraph,
    file_system: &FileSystemHandle,
    source: &SecurityGroupHandle,
) -> Result<String, GraphError> {
    security::allow_from(graph, &file_system.security_group, source, NFS_PORT, "NFS to the file system")
}
