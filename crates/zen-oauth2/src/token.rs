//! Token endpoint responses

use crate::error::{OAuthError, Result};
use serde_json::{Map, Value};
use std::time::Duration;

/// Parsed token endpoint response.
///
/// The JSON object is kept as returned by the server; no field is required.
/// JSON numbers stay [`serde_json::Number`], so `"expires_in": 3600` reads
/// back through `get("expires_in").and_then(Value::as_u64)` as `Some(3600)`.
/// The typed accessors below cover the standard OAuth2 fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenResult(Map<String, Value>);

impl TokenResult {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// [`OAuthError::TokenParse`] if the body is not valid JSON or is not a
    /// JSON object.
    pub fn from_json(body: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(OAuthError::TokenParse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(OAuthError::TokenParse(e.to_string())),
        }
    }

    /// Get a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The access token, if present.
    pub fn access_token(&self) -> Option<&str> {
        self.get_str("access_token")
    }

    /// The token type, if present (usually "Bearer").
    pub fn token_type(&self) -> Option<&str> {
        self.get_str("token_type")
    }

    /// The refresh token, if present.
    pub fn refresh_token(&self) -> Option<&str> {
        self.get_str("refresh_token")
    }

    /// Granted scopes, split on spaces.
    pub fn scopes(&self) -> Option<Vec<&str>> {
        self.get_str("scope")
            .map(|scope| scope.split(' ').filter(|s| !s.is_empty()).collect())
    }

    /// Lifetime in seconds.
    ///
    /// Accepts a JSON integer or a string of digits, which some providers
    /// send instead.
    pub fn expires_in(&self) -> Option<u64> {
        match self.0.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Lifetime as a [`Duration`].
    pub fn expires_in_duration(&self) -> Option<Duration> {
        self.expires_in().map(Duration::from_secs)
    }

    /// The OAuth2 `error` code, for error responses.
    pub fn error(&self) -> Option<&str> {
        self.get_str("error")
    }

    /// The `Authorization` header value, if an access token is present.
    ///
    /// Falls back to the `Bearer` scheme when no token type was returned.
    pub fn authorization_header(&self) -> Option<String> {
        let token = self.access_token()?;
        Some(format!("{} {}", self.token_type().unwrap_or("Bearer"), token))
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TokenResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
