//! OAuth2 client implementation

use crate::config::{TransportConfig, TransportOptions};
use crate::error::{Result, TransportError};
use crate::grant::GrantRequest;
use crate::provider::AuthEndpointProvider;
use crate::token::TokenResult;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport, RequestOutcome};
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace, warn};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client ID and secret issued by the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Create a credential pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Get the client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

/// OAuth2 client for one provider.
///
/// Credentials are fixed at construction. The transport configuration can be
/// changed between requests with [`set_transport_config`](Self::set_transport_config).
/// Every call returns its own result; the client keeps no per-request state,
/// so a shared reference can be used from several tasks at once.
#[derive(Debug, Clone)]
pub struct OAuth2Client<P, T = ReqwestTransport> {
    credentials: ClientCredentials,
    provider: P,
    transport: T,
    config: TransportConfig,
}

impl<P: AuthEndpointProvider> OAuth2Client<P> {
    /// Create a client using the default [`ReqwestTransport`].
    pub fn new(provider: P, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            credentials: ClientCredentials::new(client_id, client_secret),
            provider,
            transport: ReqwestTransport::new(),
            config: TransportConfig::default(),
        }
    }
}

impl<P: AuthEndpointProvider, T: HttpTransport> OAuth2Client<P, T> {
    /// Replace the transport.
    pub fn with_transport<U: HttpTransport>(self, transport: U) -> OAuth2Client<P, U> {
        OAuth2Client {
            credentials: self.credentials,
            provider: self.provider,
            transport,
            config: self.config,
        }
    }

    /// Builder-style variant of [`set_transport_config`](Self::set_transport_config).
    pub fn with_transport_config(mut self, options: TransportOptions) -> Self {
        self.set_transport_config(options);
        self
    }

    /// Merge options into the transport configuration.
    ///
    /// Keys present in `options` overwrite; all others are kept.
    pub fn set_transport_config(&mut self, options: TransportOptions) {
        self.config.merge(options);
    }

    /// The transport configuration in effect.
    pub fn transport_config(&self) -> &TransportConfig {
        &self.config
    }

    /// The client credentials.
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The provider's token endpoint.
    pub fn access_token_url(&self) -> &str {
        self.provider.access_token_url()
    }

    /// The provider's authorization endpoint, without query.
    pub fn authorize_endpoint(&self) -> &str {
        self.provider.authorize_url()
    }

    /// Build the URL the user is sent to for authorization.
    ///
    /// The query starts with `client_id` and `response_type=code`. Caller
    /// parameters replace a default of the same name in place; other keys are
    /// appended in the order given.
    ///
    /// ```rust
    /// use zen_oauth2::{Endpoints, OAuth2Client};
    ///
    /// let client = OAuth2Client::new(
    ///     Endpoints::new("https://auth.example.com/authorize", "https://auth.example.com/token"),
    ///     "abc",
    ///     "secret",
    /// );
    /// let url = client.authorize_url([("state", "xyz")]);
    /// assert_eq!(
    ///     url,
    ///     "https://auth.example.com/authorize?client_id=abc&response_type=code&state=xyz"
    /// );
    /// ```
    pub fn authorize_url<I, K, V>(&self, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query: Vec<(String, String)> = vec![
            ("client_id".to_string(), self.credentials.client_id.clone()),
            ("response_type".to_string(), "code".to_string()),
        ];

        for (key, value) in params {
            let (key, value) = (key.into(), value.into());
            match query.iter_mut().find(|(name, _)| *name == key) {
                Some(entry) => entry.1 = value,
                None => query.push((key, value)),
            }
        }

        let endpoint = self.authorize_endpoint();
        let separator = if endpoint.ends_with('?') || endpoint.ends_with('&') {
            ""
        } else if endpoint.contains('?') {
            "&"
        } else {
            "?"
        };

        format!(
            "{}{}{}",
            endpoint,
            separator,
            encode_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        )
    }

    /// Exchange credentials for an access token.
    ///
    /// `grant_type` is one of `"code"`, `"password"` or `"token"`; `keys`
    /// carries the fields that grant requires (`code` and `redirect_uri`,
    /// `username` and `password`, or `refresh_token`). Other keys are ignored.
    ///
    /// # Errors
    ///
    /// - [`OAuthError::InvalidGrantType`](crate::OAuthError::InvalidGrantType) and
    ///   [`OAuthError::MissingParameter`](crate::OAuthError::MissingParameter)
    ///   before any network call
    /// - [`OAuthError::Transport`](crate::OAuthError::Transport) if the HTTP call fails
    /// - [`OAuthError::TokenParse`](crate::OAuthError::TokenParse) if the
    ///   response is not a JSON object
    pub async fn get_access_token<I, K, V>(&self, grant_type: &str, keys: I) -> Result<TokenResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let keys: BTreeMap<String, String> = keys
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let grant = GrantRequest::from_keys(grant_type, &keys)?;
        self.request_token(&grant).await
    }

    /// Exchange a typed grant for an access token.
    ///
    /// The form body holds `client_id`, `client_secret` and the grant's own
    /// parameters, nothing else.
    pub async fn request_token(&self, grant: &GrantRequest) -> Result<TokenResult> {
        let mut params = vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        params.extend(grant.params());

        debug!(
            grant_type = grant.grant_type().grant_type(),
            url = self.access_token_url(),
            "Requesting access token"
        );
        trace!(
            params = ?params.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            "Token request parameters"
        );

        let body = encode_pairs(params);
        let outcome = self
            .http(self.access_token_url(), "POST", Some(body), HeaderMap::new())
            .await?;

        self.provider.filter_token(&outcome.body).map_err(|e| {
            warn!(
                status = outcome.info.status.as_u16(),
                error = %e,
                "Token endpoint returned an unusable response"
            );
            e
        })
    }

    /// Make an HTTP request with the current transport configuration.
    ///
    /// `POST` sends `body` as a form; `GET` sends no body; any other method
    /// is sent as a custom verb with the body if there is one. The provider's
    /// additional headers are merged over `extra_headers`.
    ///
    /// HTTP error statuses are returned as normal outcomes.
    pub async fn http(
        &self,
        url: &str,
        method: &str,
        body: Option<String>,
        extra_headers: HeaderMap,
    ) -> Result<RequestOutcome> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|e| {
            TransportError::invalid_request(format!("invalid HTTP method {:?}: {}", method, e))
        })?;

        let body = if method == Method::GET { None } else { body };

        let mut headers = extra_headers;
        headers.extend(self.provider.additional_headers());
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }

        debug!(method = %method, url = url, "Sending request");

        let request = HttpRequest {
            method: method.clone(),
            url: url.to_string(),
            headers,
            body,
        };

        let outcome = self
            .transport
            .execute(request, &self.config)
            .await
            .map_err(|e| {
                warn!(method = %method, url = url, code = %e.code, error = %e.message, "Request failed");
                e
            })?;

        debug!(
            method = %method,
            url = url,
            status = outcome.info.status.as_u16(),
            elapsed_ms = outcome.info.total_time.as_millis() as u64,
            "Received response"
        );
        trace!(body = %outcome.body, "Response body");

        Ok(outcome)
    }
}

/// URL-encode key-value pairs as `k=v&k=v`.
fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
