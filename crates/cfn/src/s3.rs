//! S3 resources

use crate::Tag;
use serde::Serialize;

/// `AWS::S3::Bucket`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    /// Globally unique bucket name; generated by CloudFormation when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    /// Resource tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
