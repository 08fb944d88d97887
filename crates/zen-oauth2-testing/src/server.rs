//! Local mock token server

use crate::request::RecordedRequest;
use crate::response::MockResponse;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

type GenericError = Box<dyn std::error::Error + Send + Sync>;

/// A mock HTTP server standing in for a provider's endpoints.
///
/// Speaks HTTP/1.x and HTTP/2, over plain TCP or TLS. Every request is
/// recorded; the last route registered for a method and path wins. Unmatched
/// requests get a `404`.
pub struct MockTokenServer {
    addr: SocketAddr,
    scheme: &'static str,
    state: Arc<Mutex<ServerState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Default)]
struct ServerState {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

struct Route {
    method: Option<Method>,
    path: String,
    response: MockResponse,
}

impl MockTokenServer {
    /// Start a new plain HTTP server on a random local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::spawn(None).await
    }

    /// Start a new HTTPS server on a random local port.
    ///
    /// The certificate is self-signed for `localhost` and `127.0.0.1`, so a
    /// client only gets through with certificate verification turned off.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start_tls() -> Self {
        let acceptor = tls_acceptor().expect("invalid mock token server certificate");
        Self::spawn(Some(acceptor)).await
    }

    async fn spawn(acceptor: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock token server");
        let addr = listener
            .local_addr()
            .expect("mock token server has no local address");
        let scheme = if acceptor.is_some() { "https" } else { "http" };

        let state = Arc::new(Mutex::new(ServerState::default()));
        let accept_state = state.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = listener.accept() => {
                        let stream = match res {
                            Ok((stream, _)) => stream,
                            Err(e) => {
                                tracing::warn!(error = %e, "mock token server accept failed");
                                continue;
                            }
                        };
                        let state = accept_state.clone();
                        let acceptor = acceptor.clone();
                        tokio::spawn(async move {
                            match acceptor {
                                Some(acceptor) => match acceptor.accept(stream).await {
                                    Ok(stream) => serve_connection(stream, state).await,
                                    Err(e) => {
                                        tracing::debug!(error = %e, "mock token server TLS handshake failed");
                                    }
                                },
                                None => serve_connection(stream, state).await,
                            }
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            addr,
            scheme,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    /// Absolute URL of `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Answer `method` requests to `path` with `response`.
    pub fn route(&self, method: Method, path: impl Into<String>, response: MockResponse) -> &Self {
        self.add_route(Some(method), path.into(), response)
    }

    /// Answer requests to `path` with `response`, whatever the method.
    pub fn any(&self, path: impl Into<String>, response: MockResponse) -> &Self {
        self.add_route(None, path.into(), response)
    }

    fn add_route(&self, method: Option<Method>, path: String, response: MockResponse) -> &Self {
        self.state
            .lock()
            .expect("mock token server state poisoned")
            .routes
            .push(Route {
                method,
                path,
                response,
            });
        self
    }

    /// All requests received so far, matched or not.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .expect("mock token server state poisoned")
            .requests
            .clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock token server state poisoned")
            .requests
            .len()
    }
}

impl Drop for MockTokenServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

const CERT_DER: &[u8] = include_bytes!("../fixtures/localhost.cert.der");
const KEY_DER: &[u8] = include_bytes!("../fixtures/localhost.key.der");

fn tls_acceptor() -> Result<TlsAcceptor, rustls::Error> {
    let cert = CertificateDer::from(CERT_DER.to_vec());
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(KEY_DER.to_vec()));

    let mut config = ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

async fn serve_connection<S>(stream: S, state: Arc<Mutex<ServerState>>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| handle_request(req, state.clone()));
    if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        tracing::debug!(error = %err, "mock token server connection closed");
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<Mutex<ServerState>>,
) -> Result<Response<Full<Bytes>>, GenericError> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let matched = {
        let mut state = state.lock().map_err(|e| e.to_string())?;
        state.requests.push(RecordedRequest {
            method: parts.method.clone(),
            target: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| parts.uri.path().to_string()),
            headers: parts.headers.clone(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });

        // Later routes override earlier ones
        state
            .routes
            .iter()
            .rev()
            .find(|route| {
                route.path == parts.uri.path()
                    && route.method.as_ref().map_or(true, |m| *m == parts.method)
            })
            .map(|route| route.response.clone())
    };

    let Some(mock) = matched else {
        return Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("No route matched")))?);
    };

    if let Some(delay) = mock.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::builder().status(mock.status);
    for (name, value) in &mock.headers {
        response = response.header(name, value);
    }
    Ok(response.body(Full::new(mock.body))?)
}
