//! Invocation loop

use crate::handler::{ProxyResponse, handle};
use lambda_runtime_client::{ErrorReport, Invocation, RuntimeApi, RuntimeError};
use std::path::Path;
use tracing::{Instrument, error, info_span, warn};

/// Serve invocations one at a time until the Runtime API fails
///
/// Handler errors and rejected responses are reported for the invocation and
/// do not stop the loop. Only a failed `next_invocation` ends it.
pub async fn run<R: RuntimeApi>(client: &R, root: &Path) -> Result<(), RuntimeError> {
    loop {
        let invocation = client.next_invocation().await?;
        let span = info_span!(
            "invocation",
            request_id = %invocation.request_id,
            deadline = %invocation.deadline
        );
        serve(client, invocation, root).instrument(span).await;
    }
}

async fn serve<R: RuntimeApi>(client: &R, invocation: Invocation, root: &Path) {
    let request_id = invocation.request_id;
    let report = match handle(invocation.payload, root) {
        Ok(response) => match post_response(client, &request_id, &response).await {
            Ok(()) => return,
            Err(e) => {
                warn!("Response for {} was not accepted: {}", request_id, e);
                ErrorReport::new(response_error_type(&e), &e)
            }
        },
        Err(e) => {
            error!("Invocation failed: {}", e);
            ErrorReport::new(e.error_type(), &e)
        }
    };
    if let Err(e) = client.send_error(&request_id, &report).await {
        error!("Failed to report error for {}: {}", request_id, e);
    }
}

async fn post_response<R: RuntimeApi>(client: &R, request_id: &str, response: &ProxyResponse) -> Result<(), RuntimeError> {
    let body = serde_json::to_value(response)?;
    client.send_response(request_id, &body).await
}

/// Error type reported when the Runtime API refuses a response
fn response_error_type(error: &RuntimeError) -> &'static str {
    match error {
        RuntimeError::Api { status: 413, .. } => "Runtime.ResponseTooLarge",
        RuntimeError::Serialization(_) => "Runtime.SerializationError",
        _ => "Runtime.ResponseRejected",
    }
}
