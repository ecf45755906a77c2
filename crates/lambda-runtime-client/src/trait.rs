//! RuntimeApi trait for mocking
//!
//! The function's event loop is written against this trait so handlers can be
//! driven by `MockRuntimeClient` in tests.

use crate::error::RuntimeError;
use crate::models::{ErrorReport, Invocation};

/// Lambda Runtime API operations
#[async_trait::async_trait]
pub trait RuntimeApi: Send + Sync {
    /// Block until the next invocation is available
    async fn next_invocation(&self) -> Result<Invocation, RuntimeError>;

    /// Post the handler result for `request_id`
    async fn send_response(&self, request_id: &str, response: &serde_json::Value) -> Result<(), RuntimeError>;

    /// Report a failed invocation
    async fn send_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), RuntimeError>;

    /// Report a failure before the first invocation was fetched
    async fn send_init_error(&self, report: &ErrorReport) -> Result<(), RuntimeError>;
}
