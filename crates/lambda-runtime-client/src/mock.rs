//! Mock RuntimeApi for unit testing
//!
//! Queued invocations are handed out in order; every response and error the
//! function posts is recorded for assertions. Once the queue is empty,
//! `next_invocation` fails with a 410 `Api` error so event loops terminate.
//! `reject_responses` makes `send_response` fail with a chosen status.

use crate::error::RuntimeError;
use crate::models::{ErrorReport, Invocation};
use crate::runtime_trait::RuntimeApi;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock Runtime API client
#[derive(Debug, Clone, Default)]
pub struct MockRuntimeClient {
    pending: Arc<Mutex<VecDeque<Invocation>>>,
    responses: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    errors: Arc<Mutex<Vec<(String, ErrorReport)>>>,
    init_errors: Arc<Mutex<Vec<ErrorReport>>>,
    reject_status: Arc<Mutex<Option<u16>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockRuntimeClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an invocation (for test setup)
    pub fn push_invocation(&self, invocation: Invocation) {
        lock(&self.pending).push_back(invocation);
    }

    /// Fail every following `send_response` with `status` (for test setup)
    pub fn reject_responses(&self, status: u16) {
        *lock(&self.reject_status) = Some(status);
    }

    /// Responses posted so far, as `(request_id, body)`
    pub fn responses(&self) -> Vec<(String, serde_json::Value)> {
        lock(&self.responses).clone()
    }

    /// Invocation errors posted so far
    pub fn errors(&self) -> Vec<(String, ErrorReport)> {
        lock(&self.errors).clone()
    }

    /// Initialization errors posted so far
    pub fn init_errors(&self) -> Vec<ErrorReport> {
        lock(&self.init_errors).clone()
    }
}

#[async_trait::async_trait]
impl RuntimeApi for MockRuntimeClient {
    async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        lock(&self.pending).pop_front().ok_or_else(|| RuntimeError::Api {
            status: 410,
            body: "no more invocations".to_string(),
        })
    }

    async fn send_response(&self, request_id: &str, response: &serde_json::Value) -> Result<(), RuntimeError> {
        if let Some(status) = *lock(&self.reject_status) {
            return Err(RuntimeError::Api {
                status,
                body: "response rejected".to_string(),
            });
        }
        lock(&self.responses).push((request_id.to_string(), response.clone()));
        Ok(())
    }

    async fn send_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), RuntimeError> {
        lock(&self.errors).push((request_id.to_string(), report.clone()));
        Ok(())
    }

    async fn send_init_error(&self, report: &ErrorReport) -> Result<(), RuntimeError> {
        lock(&self.init_errors).push(report.clone());
        Ok(())
    }
}
