//! HTTP transport
//!
//! The transport executes one HTTP request with the current
//! [`TransportConfig`] and returns the raw body with its metadata as a
//! [`RequestOutcome`]. Nothing about the call is kept afterwards.
//!
//! [`ReqwestTransport`] is the default implementation. Implement
//! [`HttpTransport`] to route requests elsewhere, e.g. through a shared
//! connection pool or a test double.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

use crate::config::TransportConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode, Version};
use std::collections::BTreeMap;
use std::time::Duration;

/// A request handed to a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Headers to send, already merged with the provider's headers
    pub headers: HeaderMap,
    /// Request body, if any
    pub body: Option<String>,
}

/// Executes HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request`, applying every option of `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the call fails at the transport level.
    /// HTTP error statuses are not failures.
    async fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> Result<RequestOutcome, TransportError>;
}

/// Metadata captured for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    /// Response status
    pub status: StatusCode,
    /// URL the response came from; redirects are not followed
    pub effective_url: String,
    /// Protocol version of the response
    pub http_version: Version,
    /// Time from sending the request until the body was read
    pub total_time: Duration,
    /// Approximate size of the response header block in bytes
    pub header_size: usize,
}

/// Body and metadata of one completed HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// Raw response body
    pub body: String,
    /// Status, timing and effective URL
    pub info: ResponseInfo,
    /// Normalized response headers, see [`normalize_headers`]
    pub headers: BTreeMap<String, String>,
}

impl RequestOutcome {
    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.info.status
    }

    /// Look up a header by its normalized name, e.g. `content_type`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Normalize a header name: lower-case, `-` replaced by `_`.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Normalize response headers into a name-value map.
///
/// Names go through [`normalize_header_name`], values are trimmed, and the
/// last value wins when a header repeats. Values that are not valid UTF-8 are
/// converted lossily.
pub fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                normalize_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).trim().to_string(),
            )
        })
        .collect()
}

/// Approximate size of a header block as it appears on the wire.
pub fn header_block_size(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum()
}
