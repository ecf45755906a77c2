//! Blender version list
//!
//! The version list decides how many job definitions the stack carries: one
//! per element, tagged with the element. Callers hand it over either as a
//! comma-delimited string (`"GPU-4.0.0,CPU-4.0.0,CPU-3.6.0"`) or as a list.
//! Both forms go through the same normalization: trim, lower-case, then check
//! each element against the image tag grammar.

use crate::error::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Longest tag ECR accepts
const MAX_TAG_LEN: usize = 128;

/// Version list as written by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum VersionsInput {
    /// Comma-delimited string
    Delimited(String),

    /// Structured list
    List(Vec<String>),
}

impl VersionsInput {
    fn raw_elements(&self) -> Vec<&str> {
        match self {
            Self::Delimited(value) => value.split(',').collect(),
            Self::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Delimited(value) => value.trim().is_empty(),
            Self::List(values) => values.is_empty(),
        }
    }
}

impl From<&str> for VersionsInput {
    fn from(value: &str) -> Self {
        Self::Delimited(value.to_string())
    }
}

/// One normalized version, usable as an image tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlenderVersion(String);

impl BlenderVersion {
    /// Image tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for tags built for GPU rendering (`gpu-` prefix)
    #[must_use]
    pub fn is_gpu(&self) -> bool {
        self.0.starts_with("gpu-")
    }
}

impl fmt::Display for BlenderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated, non-empty, ordered list of versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionList(Vec<BlenderVersion>);

impl VersionList {
    /// Normalize and validate caller input
    ///
    /// Elements keep their original order. Rejects a missing or blank list,
    /// empty elements (`"a,,b"`) and elements that are not valid image tags.
    /// Repeated elements are kept: each one still gets its own job definition.
    pub fn parse(input: Option<&VersionsInput>) -> Result<Self, ConfigError> {
        let input = input.ok_or(ConfigError::MissingVersionList)?;
        if input.is_blank() {
            return Err(ConfigError::MissingVersionList);
        }

        let mut seen = BTreeSet::new();
        let mut versions = Vec::new();
        for (index, raw) in input.raw_elements().into_iter().enumerate() {
            let value = raw.trim().to_lowercase();
            if value.is_empty() {
                return Err(ConfigError::EmptyVersionElement { index });
            }
            if !is_valid_tag(&value) {
                return Err(ConfigError::MalformedVersion { index, value });
            }
            if !seen.insert(value.clone()) {
                warn!("Blender version {} (element {}) is listed more than once", value, index);
            }
            versions.push(BlenderVersion(value));
        }

        Ok(Self(versions))
    }

    /// Versions in caller order
    pub fn iter(&self) -> impl Iterator<Item = &BlenderVersion> {
        self.0.iter()
    }

    /// Number of versions (never zero)
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a parsed list
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ECR tag grammar restricted to lower case: `[a-z0-9_][a-z0-9._-]{0,127}`
fn is_valid_tag(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    value.len() <= MAX_TAG_LEN
        && (first.is_ascii_lowercase() || first.is_ascii_digit() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}
