//! HTTP wire transport for the remote endpoint.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;

use crate::error::{Result, RudderError};

/// Default per-request timeout; generous because a navigate against a slow
/// page can legitimately take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A raw wire exchange result: HTTP status plus the decoded JSON body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
}

/// Issues HTTP requests with JSON bodies against a base URL.
///
/// Network-level failures (connection refused, timeout, a body that is not
/// JSON) come back as [`RudderError::Transport`], never as an empty success.
/// No retries happen here; retry policy belongs to callers that know which
/// operations are idempotent.
#[derive(Debug, Clone)]
pub struct WireTransport {
    base_url: String,
    http: Client,
}

impl WireTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request. `path` must already be fully resolved (placeholders
    /// substituted); `body`, if present, is serialized as the JSON payload.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<WireResponse> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "wire request");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| RudderError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| RudderError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            message: format!("failed reading response body: {e}"),
        })?;

        // Several drivers answer interaction commands with an empty body.
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| RudderError::Transport {
                method: method.to_string(),
                path: path.to_string(),
                message: format!("response body is not JSON: {e}"),
            })?
        };

        tracing::debug!(status, "wire response");
        Ok(WireResponse { status, body })
    }
}
