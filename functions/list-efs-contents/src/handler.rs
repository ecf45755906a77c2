//! API Gateway proxy handling
//!
//! The REST API forwards every method and path to the function. The directory
//! comes from the `path` query parameter, falling back to the `{proxy+}` path
//! parameter, then to the mount root.

use crate::error::ListingError;
use crate::listing::list_directory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Subset of the API Gateway proxy event the function reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    /// HTTP method
    pub http_method: Option<String>,
    /// Request path
    pub path: Option<String>,
    /// Query string parameters, absent when there are none
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    /// Path parameters (`proxy` for the catch-all route)
    pub path_parameters: Option<BTreeMap<String, String>>,
}

impl ProxyRequest {
    /// Directory requested by the caller, relative to the mount
    pub fn requested_path(&self) -> &str {
        lookup(self.query_string_parameters.as_ref(), "path")
            .or_else(|| lookup(self.path_parameters.as_ref(), "proxy"))
            .unwrap_or("")
    }
}

fn lookup<'a>(params: Option<&'a BTreeMap<String, String>>, key: &str) -> Option<&'a str> {
    params.and_then(|p| p.get(key)).map(String::as_str)
}

/// Response shape API Gateway expects from a proxy integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status
    pub status_code: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// JSON body, as a string
    pub body: String,
    /// Always false
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    fn json(status_code: u16, body: &impl Serialize) -> Result<Self, ListingError> {
        Ok(Self {
            status_code,
            headers: BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body: serde_json::to_string(body)?,
            is_base64_encoded: false,
        })
    }
}

/// Serve one invocation
///
/// Caller mistakes become 400/404 responses. Anything else is returned as an
/// error so the runtime loop reports it as a failed invocation.
pub fn handle(payload: serde_json::Value, root: &Path) -> Result<ProxyResponse, ListingError> {
    let request: ProxyRequest = serde_json::from_value(payload)?;
    let requested = request.requested_path();
    debug!(
        "{} {} -> {:?}",
        request.http_method.as_deref().unwrap_or("-"),
        request.path.as_deref().unwrap_or("-"),
        requested
    );

    match list_directory(root, requested) {
        Ok(listing) => {
            info!("Listed {:?}: {} entries", listing.path, listing.entries.len());
            ProxyResponse::json(200, &listing)
        }
        Err(e) => match e.status_code() {
            Some(status) => {
                info!("Rejected {:?}: {}", requested, e);
                ProxyResponse::json(status, &serde_json::json!({ "error": e.to_string() }))
            }
            None => Err(e),
        },
    }
}
