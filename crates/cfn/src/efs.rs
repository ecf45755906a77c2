//! EFS resources

use crate::Tag;
use crate::intrinsic::Expr;
use serde::Serialize;

/// `AWS::EFS::FileSystem`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSystem {
    /// Encrypt data at rest
    pub encrypted: bool,

    /// `generalPurpose` or `maxIO`
    pub performance_mode: String,

    /// `bursting`, `elastic` or `provisioned`
    pub throughput_mode: String,

    /// Tags (EFS names the list `FileSystemTags`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_system_tags: Vec<Tag>,
}

/// `AWS::EFS::MountTarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountTarget {
    /// File system to expose
    pub file_system_id: Expr,

    /// Subnet hosting the mount target
    pub subnet_id: Expr,

    /// Security groups guarding NFS
    pub security_groups: Vec<Expr>,
}

/// POSIX identity enforced by an access point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PosixUser {
    /// User ID
    pub uid: String,

    /// Group ID
    pub gid: String,
}

/// Ownership applied when the access point creates its root directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreationInfo {
    /// Owner user ID
    pub owner_uid: String,

    /// Owner group ID
    pub owner_gid: String,

    /// Octal permissions, e.g. `750`
    pub permissions: String,
}

/// Root directory of an access point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootDirectory {
    /// Path inside the file system
    pub path: String,

    /// Created with this ownership when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_info: Option<CreationInfo>,
}

/// `AWS::EFS::AccessPoint`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPoint {
    /// File system the access point belongs to
    pub file_system_id: Expr,

    /// Identity enforced for every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posix_user: Option<PosixUser>,

    /// Directory exposed as `/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_directory: Option<RootDirectory>,

    /// Tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_point_tags: Vec<Tag>,
}
