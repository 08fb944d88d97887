use super::{header_block_size, normalize_headers, HttpRequest, HttpTransport, RequestOutcome, ResponseInfo};
use crate::config::{HttpVersion, TransportConfig};
use crate::error::{TransportError, TransportErrorCode};
use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::Instant;

/// Default transport backed by [`reqwest`].
///
/// A client is built per call from the configuration in effect, so config
/// changes apply to the next request without further bookkeeping. Redirects
/// are returned to the caller rather than followed, and `gzip`/`deflate`
/// bodies are decoded.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    /// Create a new transport.
    pub fn new() -> Self {
        Self
    }

    fn build_client(config: &TransportConfig) -> Result<reqwest::Client, TransportError> {
        let builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .deflate(true)
            .danger_accept_invalid_certs(!config.verify_tls);

        let builder = match config.http_version {
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Http10 | HttpVersion::Http11 => builder.http1_only(),
        };

        builder.build().map_err(classify)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> Result<RequestOutcome, TransportError> {
        let client = Self::build_client(config)?;

        let mut builder = client
            .request(request.method, request.url.as_str())
            .version(config.http_version.as_http())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        let http_version = response.version();
        let effective_url = response.url().to_string();
        let headers = normalize_headers(response.headers());
        let header_size = header_block_size(response.headers());

        let body = response.text().await.map_err(classify)?;

        Ok(RequestOutcome {
            body,
            info: ResponseInfo {
                status,
                effective_url,
                http_version,
                total_time: started.elapsed(),
                header_size,
            },
            headers,
        })
    }
}

/// Map a reqwest failure onto a transport error code.
fn classify(err: reqwest::Error) -> TransportError {
    let code = if err.is_timeout() {
        TransportErrorCode::Timeout
    } else if is_tls_failure(&err) {
        TransportErrorCode::Tls
    } else if err.is_connect() {
        TransportErrorCode::Connect
    } else if err.is_builder() {
        TransportErrorCode::InvalidRequest
    } else if err.is_body() || err.is_decode() {
        TransportErrorCode::Body
    } else {
        TransportErrorCode::Other
    };

    TransportError::new(code, error_chain(&err))
}

// rustls errors surface only through the source chain.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return true;
        }
        source = cause.source();
    }
    false
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.1.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_error_chain() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer(
                "client error (Connect)",
                Some(Box::new(Layer("Connection refused", None))),
            ))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_text() {
        let err = Layer("timed out: operation timed out", Some(Box::new(Layer("operation timed out", None))));
        assert_eq!(error_chain(&err), "timed out: operation timed out");
    }

    #[test]
    fn test_build_client_for_every_version() {
        for version in [HttpVersion::Http10, HttpVersion::Http11, HttpVersion::Http2] {
            let config = TransportConfig {
                http_version: version,
                ..TransportConfig::default()
            };
            assert!(ReqwestTransport::build_client(&config).is_ok());
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_invalid_request() {
        let request = HttpRequest {
            method: http::Method::GET,
            url: "not a url".to_string(),
            headers: http::HeaderMap::new(),
            body: None,
        };
        let err = ReqwestTransport::new()
            .execute(request, &TransportConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, TransportErrorCode::InvalidRequest);
    }
}
