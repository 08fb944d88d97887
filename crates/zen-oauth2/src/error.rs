//! Error types for zen-oauth2

use std::fmt;
use thiserror::Error;

/// Result type alias for OAuth2 operations
pub type Result<T, E = OAuthError> = std::result::Result<T, E>;

/// Errors that can occur during OAuth2 operations.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The HTTP call itself failed (connection, timeout, TLS, ...).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The requested grant type is not one of `code`, `password`, `token`.
    #[error("Invalid grant type: {0:?} (expected one of \"code\", \"password\", \"token\")")]
    InvalidGrantType(String),

    /// A field required by the selected grant type was not supplied.
    #[error("Missing required parameter: {field}")]
    MissingParameter {
        /// Name of the absent field
        field: String,
    },

    /// The token endpoint answered with something that is not a JSON object.
    #[error("Invalid token response: {0}")]
    TokenParse(String),
}

impl OAuthError {
    /// Create a missing parameter error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingParameter {
            field: field.into(),
        }
    }

    /// Returns the transport error code, if this is a transport failure.
    pub fn transport_code(&self) -> Option<TransportErrorCode> {
        match self {
            Self::Transport(err) => Some(err.code),
            _ => None,
        }
    }

    /// Check if the failure happened before any network call was made.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGrantType(_) | Self::MissingParameter { .. }
        )
    }
}

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    /// The connection could not be established
    Connect,
    /// The connect or total timeout expired
    Timeout,
    /// TLS handshake or certificate verification failed
    Tls,
    /// The request could not be built (bad URL, method, header)
    InvalidRequest,
    /// The response body could not be read
    Body,
    /// Anything else
    Other,
}

impl TransportErrorCode {
    /// Stable, lower-case name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::InvalidRequest => "invalid_request",
            Self::Body => "body",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed HTTP call.
///
/// The in-flight call is aborted; no partial response is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Transport error ({code}): {message}")]
pub struct TransportError {
    /// Human-readable description, including the underlying cause chain
    pub message: String,
    /// Failure classification
    pub code: TransportErrorCode,
}

impl TransportError {
    /// Create a new transport error
    pub fn new(code: TransportErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Timeout, message)
    }

    /// Create a connection error
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Connect, message)
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::InvalidRequest, message)
    }

    /// Check if this error was caused by a timeout
    pub fn is_timeout(&self) -> bool {
        self.code == TransportErrorCode::Timeout
    }
}
