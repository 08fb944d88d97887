//! Simulated transport

use crate::request::RecordedRequest;
use crate::response::MockResponse;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use zen_oauth2::transport::{header_block_size, normalize_headers};
use zen_oauth2::{
    HttpRequest, HttpTransport, RequestOutcome, ResponseInfo, TransportConfig, TransportError,
    TransportErrorCode,
};

/// A transport that never touches the network.
///
/// Replies are consumed in the order they were queued; once the queue is
/// empty the fallback set with [`respond_always`](Self::respond_always) is
/// used, and without one the call fails. Clones share state, so keep a clone
/// to inspect what the client sent.
///
/// A response whose delay exceeds the configured total timeout fails with a
/// timeout error, like a real transport would.
#[derive(Debug, Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

#[derive(Debug, Default)]
struct StubState {
    replies: VecDeque<Reply>,
    fallback: Option<MockResponse>,
    requests: Vec<RecordedRequest>,
    configs: Vec<TransportConfig>,
}

#[derive(Debug)]
enum Reply {
    Respond(MockResponse),
    Fail(TransportError),
}

impl StubTransport {
    /// Create a stub with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub transport state poisoned")
    }

    /// Queue a response for one call.
    pub fn respond_with(&self, response: MockResponse) -> &Self {
        self.state().replies.push_back(Reply::Respond(response));
        self
    }

    /// Queue a `200 OK` with a raw body for one call.
    pub fn respond_body(&self, body: impl Into<String>) -> &Self {
        let body: String = body.into();
        self.respond_with(MockResponse::new().body(body))
    }

    /// Queue a failure for one call.
    pub fn fail_with(&self, error: TransportError) -> &Self {
        self.state().replies.push_back(Reply::Fail(error));
        self
    }

    /// Answer every call with `response` once the queue is empty.
    pub fn respond_always(&self, response: MockResponse) -> &Self {
        self.state().fallback = Some(response);
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state().requests.last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    /// The transport configuration seen by each call.
    pub fn configs(&self) -> Vec<TransportConfig> {
        self.state().configs.clone()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> Result<RequestOutcome, TransportError> {
        let reply = {
            let mut state = self.state();
            state.requests.push(RecordedRequest {
                method: request.method.clone(),
                target: request.url.clone(),
                headers: request.headers.clone(),
                body: request.body.clone().unwrap_or_default(),
            });
            state.configs.push(config.clone());
            match state.replies.pop_front() {
                Some(reply) => Some(reply),
                None => state.fallback.clone().map(Reply::Respond),
            }
        };

        let response = match reply {
            Some(Reply::Respond(response)) => response,
            Some(Reply::Fail(error)) => return Err(error),
            None => {
                return Err(TransportError::new(
                    TransportErrorCode::Other,
                    format!("no stubbed response for {} {}", request.method, request.url),
                ))
            }
        };

        let elapsed = response.delay.unwrap_or(Duration::ZERO);
        if elapsed > config.total_timeout {
            tokio::time::sleep(config.total_timeout).await;
            return Err(TransportError::timeout(format!(
                "operation timed out after {} ms",
                config.total_timeout.as_millis()
            )));
        }
        if !elapsed.is_zero() {
            tokio::time::sleep(elapsed).await;
        }

        Ok(RequestOutcome {
            info: ResponseInfo {
                status: response.status,
                effective_url: request.url,
                http_version: config.http_version.as_http(),
                total_time: elapsed,
                header_size: header_block_size(&response.headers),
            },
            headers: normalize_headers(&response.headers),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        })
    }
}
