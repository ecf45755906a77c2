//! AWS Lambda Runtime API client
//!
//! A small client for functions built as custom runtimes (`provided.al2023`).
//! The function binary owns the event loop: fetch the next invocation, run the
//! handler, post the response or the error, repeat.
//!
//! # Example
//!
//! ```no_run
//! use lambda_runtime_client::{RuntimeApi, RuntimeClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RuntimeClient::from_env()?;
//! loop {
//!     let invocation = client.next_invocation().await?;
//!     let response = serde_json::json!({"statusCode": 200, "body": "ok"});
//!     client.send_response(&invocation.request_id, &response).await?;
//! }
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod runtime_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::RuntimeClient;
pub use error::RuntimeError;
pub use models::{ErrorReport, Invocation};
pub use runtime_trait::RuntimeApi;
#[cfg(feature = "test-util")]
pub use mock::MockRuntimeClient;
