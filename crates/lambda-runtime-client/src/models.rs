//! Runtime API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event handed to the function
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// `Lambda-Runtime-Aws-Request-Id`
    pub request_id: String,
    /// `Lambda-Runtime-Deadline-Ms`, as a timestamp
    pub deadline: DateTime<Utc>,
    /// `Lambda-Runtime-Invoked-Function-Arn`
    pub function_arn: Option<String>,
    /// Event body
    pub payload: serde_json::Value,
}

/// Body of `/invocation/{id}/error` and `/init/error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Human-readable message
    pub error_message: String,
    /// Short error class, also sent as `Lambda-Runtime-Function-Error-Type`
    pub error_type: String,
}

impl ErrorReport {
    /// Build a report from any displayable error
    pub fn new(error_type: impl Into<String>, error: &impl std::fmt::Display) -> Self {
        Self {
            error_message: error.to_string(),
            error_type: error_type.into(),
        }
    }
}
