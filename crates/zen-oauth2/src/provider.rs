//! OAuth2 provider endpoints
//!
//! Every provider supplies its authorize and token URLs through
//! [`AuthEndpointProvider`]. The trait also carries two optional hooks: extra
//! headers sent with every request, and the conversion of a token response
//! body into a [`TokenResult`].

use crate::error::Result;
use crate::token::TokenResult;
use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Endpoints and request hooks of one OAuth2 provider.
///
/// # Example
///
/// ```rust
/// use zen_oauth2::AuthEndpointProvider;
///
/// struct Weibo;
///
/// impl AuthEndpointProvider for Weibo {
///     fn authorize_url(&self) -> &str {
///         "https://api.weibo.com/oauth2/authorize"
///     }
///
///     fn access_token_url(&self) -> &str {
///         "https://api.weibo.com/oauth2/access_token"
///     }
/// }
/// ```
pub trait AuthEndpointProvider: Send + Sync {
    /// The authorization endpoint the user is sent to.
    fn authorize_url(&self) -> &str;

    /// The token endpoint credentials are exchanged at.
    fn access_token_url(&self) -> &str;

    /// Headers added to every request. None by default.
    fn additional_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Turn a token endpoint response body into a [`TokenResult`].
    ///
    /// The default parses a JSON object.
    fn filter_token(&self, body: &str) -> Result<TokenResult> {
        TokenResult::from_json(body)
    }
}

/// A provider described by two fixed URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    authorize_url: String,
    token_url: String,
    headers: HeaderMap,
}

impl Endpoints {
    /// Create a provider from its authorize and token endpoint URLs.
    pub fn new(authorize_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl AuthEndpointProvider for Endpoints {
    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn access_token_url(&self) -> &str {
        &self.token_url
    }

    fn additional_headers(&self) -> HeaderMap {
        self.headers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ACCEPT;

    #[test]
    fn test_endpoints() {
        let provider = Endpoints::new(
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        );
        assert_eq!(provider.authorize_url(), "https://auth.example.com/authorize");
        assert_eq!(provider.access_token_url(), "https://auth.example.com/token");
        assert!(provider.additional_headers().is_empty());
    }

    #[test]
    fn test_endpoint_headers() {
        let provider = Endpoints::new("https://a/authorize", "https://a/token")
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        let headers = provider.additional_headers();
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_default_token_filter() {
        let provider = Endpoints::new("https://a/authorize", "https://a/token");
        let token = provider.filter_token(r#"{"access_token":"T"}"#).unwrap();
        assert_eq!(token.access_token(), Some("T"));
        assert!(provider.filter_token("not json").is_err());
    }
}
