//! Runtime API client
//!
//! Implements the Lambda Runtime API used by custom runtimes:
//! `/2018-06-01/runtime/invocation/next`, `/invocation/{id}/response`,
//! `/invocation/{id}/error` and `/init/error`.

use crate::error::RuntimeError;
use crate::models::{ErrorReport, Invocation};
use crate::runtime_trait::RuntimeApi;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Runtime API version prefix
const API_VERSION: &str = "2018-06-01";

/// Environment variable holding `host:port` of the Runtime API
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ARN_HEADER: &str = "lambda-runtime-invoked-function-arn";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

/// Lambda Runtime API client
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: Client,
    base_url: String,
}

impl RuntimeClient {
    /// Create a client for the given endpoint
    ///
    /// # Arguments
    /// * `endpoint` - `host:port` as found in `AWS_LAMBDA_RUNTIME_API`, or a full
    ///   `http://` URL
    pub fn new(endpoint: &str) -> Result<Self, RuntimeError> {
        if endpoint.trim().is_empty() {
            return Err(RuntimeError::Configuration("empty Runtime API endpoint".to_string()));
        }
        // `next` long-polls until an event arrives, so only connecting is bounded
        let client = Client::builder().connect_timeout(Duration::from_secs(5)).build()?;

        let endpoint = endpoint.trim().trim_end_matches('/');
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            format!("{endpoint}/{API_VERSION}/runtime")
        } else {
            format!("http://{endpoint}/{API_VERSION}/runtime")
        };
        Ok(Self { client, base_url })
    }

    /// Create a client from `AWS_LAMBDA_RUNTIME_API`
    pub fn from_env() -> Result<Self, RuntimeError> {
        let endpoint = std::env::var(RUNTIME_API_ENV)
            .map_err(|e| RuntimeError::Configuration(format!("{RUNTIME_API_ENV}: {e}")))?;
        Self::new(&endpoint)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        error_type: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let mut request = self.client.post(url).json(body);
        if let Some(error_type) = error_type {
            request = request.header(ERROR_TYPE_HEADER, error_type);
        }
        let response = request.send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> Result<Response, RuntimeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Runtime API returned {}: {}", status, body);
    Err(RuntimeError::Api {
        status: status.as_u16(),
        body,
    })
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Read the invocation metadata out of the `next` response headers
pub(crate) fn parse_invocation(headers: &HeaderMap, payload: serde_json::Value) -> Result<Invocation, RuntimeError> {
    let request_id = header(headers, REQUEST_ID_HEADER)
        .filter(|id| !id.is_empty())
        .ok_or(RuntimeError::MissingHeader(REQUEST_ID_HEADER))?
        .to_string();
    let deadline = header(headers, DEADLINE_HEADER)
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or(RuntimeError::MissingHeader(DEADLINE_HEADER))?;

    Ok(Invocation {
        request_id,
        deadline,
        function_arn: header(headers, FUNCTION_ARN_HEADER).map(str::to_string),
        payload,
    })
}

#[async_trait::async_trait]
impl RuntimeApi for RuntimeClient {
    async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        let url = format!("{}/invocation/next", self.base_url);
        debug!("Waiting for next invocation");

        let response = check_status(self.client.get(&url).send().await?).await?;
        let headers = response.headers().clone();
        let body = response.text().await?;
        let payload = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body)?
        };

        let invocation = parse_invocation(&headers, payload)?;
        debug!("Received invocation {}", invocation.request_id);
        Ok(invocation)
    }

    async fn send_response(&self, request_id: &str, response: &serde_json::Value) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/response", self.base_url, request_id);
        debug!("Posting response for {}", request_id);
        self.post_json(&url, response, None).await
    }

    async fn send_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/error", self.base_url, request_id);
        debug!("Posting error for {}: {}", request_id, report.error_message);
        self.post_json(&url, report, Some(report.error_type.as_str())).await
    }

    async fn send_init_error(&self, report: &ErrorReport) -> Result<(), RuntimeError> {
        let url = format!("{}/init/error", self.base_url);
        debug!("Posting init error: {}", report.error_message);
        self.post_json(&url, report, Some(report.error_type.as_str())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_base_url_from_host_port() {
        let client = RuntimeClient::new("127.0.0.1:9001").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(client.base_url(), "http://127.0.0.1:9001/2018-06-01/runtime");

        let client = RuntimeClient::new("http://localhost:9001/").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(client.base_url(), "http://localhost:9001/2018-06-01/runtime");

        assert!(matches!(RuntimeClient::new("  "), Err(RuntimeError::Configuration(_))));
    }

    #[test]
    fn test_parse_invocation_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        headers.insert(DEADLINE_HEADER, HeaderValue::from_static("1700000000000"));

        let invocation = parse_invocation(&headers, serde_json::json!({"a": 1})).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(invocation.request_id, "req-1");
        assert_eq!(invocation.deadline.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(invocation.function_arn, None);
    }

    #[test]
    fn test_parse_invocation_requires_id_and_deadline() {
        let mut headers = HeaderMap::new();
        headers.insert(DEADLINE_HEADER, HeaderValue::from_static("1700000000000"));
        assert!(matches!(
            parse_invocation(&headers, serde_json::Value::Null),
            Err(RuntimeError::MissingHeader(REQUEST_ID_HEADER))
        ));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        headers.insert(DEADLINE_HEADER, HeaderValue::from_static("soon"));
        assert!(matches!(
            parse_invocation(&headers, serde_json::Value::Null),
            Err(RuntimeError::MissingHeader(DEADLINE_HEADER))
        ));
    }
}
