//! Transport configuration
//!
//! [`TransportConfig`] is the effective option set applied to every HTTP call.
//! It starts from safe defaults and is changed by merging [`TransportOptions`]
//! into it: keys present in the options overwrite, all others are retained.
//!
//! Options can be built in code, deserialized from any string-keyed mapping
//! (timeouts are given in seconds), or read from `ZEN_OAUTH2_*` environment
//! variables.
//!
//! # Example
//!
//! ```rust
//! use zen_oauth2::{TransportConfig, TransportOptions};
//! use std::time::Duration;
//!
//! let mut config = TransportConfig::default();
//! let options = TransportOptions::from_json(serde_json::json!({ "timeout": 10 })).unwrap();
//! config.merge(options);
//!
//! assert_eq!(config.total_timeout, Duration::from_secs(10));
//! assert_eq!(config.connect_timeout, Duration::from_secs(30));
//! ```

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("ZenOAuth2/", env!("CARGO_PKG_VERSION"));

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for a whole request, body included.
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of the environment variables read by [`TransportOptions::from_env`].
pub const ENV_PREFIX: &str = "ZEN_OAUTH2_";

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),

    /// A mapping could not be turned into options.
    #[error("Invalid transport options: {0}")]
    Mapping(#[from] serde_json::Error),
}

/// HTTP protocol version used for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum HttpVersion {
    /// HTTP/1.0
    #[serde(rename = "1.0", alias = "HTTP/1.0")]
    Http10,
    /// HTTP/1.1
    #[default]
    #[serde(rename = "1.1", alias = "HTTP/1.1")]
    Http11,
    /// HTTP/2 with prior knowledge
    #[serde(rename = "2", alias = "2.0", alias = "HTTP/2")]
    Http2,
}

impl HttpVersion {
    /// The matching protocol-level version.
    pub fn as_http(&self) -> http::Version {
        match self {
            Self::Http10 => http::Version::HTTP_10,
            Self::Http11 => http::Version::HTTP_11,
            Self::Http2 => http::Version::HTTP_2,
        }
    }
}

/// Effective options applied to every HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Protocol version.
    pub http_version: HttpVersion,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed for the whole request.
    pub total_timeout: Duration,
    /// Whether TLS peer certificates are verified.
    pub verify_tls: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_version: HttpVersion::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            verify_tls: true,
        }
    }
}

impl TransportConfig {
    /// Merge options into this configuration.
    ///
    /// Keys set in `options` overwrite the current values; everything else is
    /// kept. There is no way to unset a key.
    pub fn merge(&mut self, options: TransportOptions) {
        if let Some(version) = options.http_version {
            self.http_version = version;
        }
        if let Some(user_agent) = options.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(timeout) = options.connect_timeout {
            self.connect_timeout = timeout;
        }
        if let Some(timeout) = options.total_timeout {
            self.total_timeout = timeout;
        }
        if let Some(verify) = options.verify_tls {
            self.verify_tls = verify;
        }
    }

    /// Builder-style variant of [`merge`](Self::merge).
    pub fn with(mut self, options: TransportOptions) -> Self {
        self.merge(options);
        self
    }
}

/// A partial set of transport options.
///
/// Recognized keys are `http_version`, `user_agent`, `connect_timeout`,
/// `total_timeout` (alias `timeout`) and `verify_tls`. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportOptions {
    /// Protocol version.
    #[serde(default)]
    pub http_version: Option<HttpVersion>,
    /// Value of the `User-Agent` header.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Connect timeout, in seconds when deserialized.
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub connect_timeout: Option<Duration>,
    /// Total timeout, in seconds when deserialized.
    #[serde(default, alias = "timeout", deserialize_with = "deserialize_seconds")]
    pub total_timeout: Option<Duration>,
    /// Whether TLS peer certificates are verified.
    #[serde(default)]
    pub verify_tls: Option<bool>,
}

impl TransportOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the protocol version.
    pub fn http_version(mut self, version: HttpVersion) -> Self {
        self.http_version = Some(version);
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the total request timeout.
    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Check if no option is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build options from a string-keyed JSON mapping.
    ///
    /// ```rust
    /// use zen_oauth2::TransportOptions;
    ///
    /// let options = TransportOptions::from_json(serde_json::json!({
    ///     "user_agent": "my-app/1.0",
    ///     "verify_tls": false,
    /// })).unwrap();
    /// assert_eq!(options.user_agent.as_deref(), Some("my-app/1.0"));
    /// ```
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(ConfigError::from)
    }

    /// Read options from `ZEN_OAUTH2_*` environment variables.
    ///
    /// For example `ZEN_OAUTH2_USER_AGENT`, `ZEN_OAUTH2_TIMEOUT=10` or
    /// `ZEN_OAUTH2_VERIFY_TLS=false`. Unset variables leave the option unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or if an unknown
    /// `ZEN_OAUTH2_*` variable is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .map_err(ConfigError::from)
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
        .transpose()
}

/// Load environment variables from a `.env` file.
///
/// A missing file is not an error. Existing environment variables take
/// precedence over `.env` values.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "ZEN_OAUTH2_HTTP_VERSION",
            "ZEN_OAUTH2_USER_AGENT",
            "ZEN_OAUTH2_CONNECT_TIMEOUT",
            "ZEN_OAUTH2_TOTAL_TIMEOUT",
            "ZEN_OAUTH2_TIMEOUT",
            "ZEN_OAUTH2_VERIFY_TLS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.http_version, HttpVersion::Http11);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.user_agent.starts_with("ZenOAuth2/"));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.total_timeout, Duration::from_secs(30));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_merge_timeout_retains_other_keys() {
        let mut config = TransportConfig::default();
        config.merge(TransportOptions::from_json(json!({ "timeout": 10 })).unwrap());

        let expected = TransportConfig {
            total_timeout: Duration::from_secs(10),
            ..TransportConfig::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_later_merges_override_earlier() {
        let config = TransportConfig::default()
            .with(TransportOptions::new().user_agent("first").verify_tls(false))
            .with(TransportOptions::new().user_agent("second"));

        assert_eq!(config.user_agent, "second");
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_empty_merge_is_noop() {
        let options = TransportOptions::new();
        assert!(options.is_empty());

        let config = TransportConfig::default().with(options);
        assert_eq!(config, TransportConfig::default());
    }

    #[test]
    fn test_from_json_all_keys() {
        let options = TransportOptions::from_json(json!({
            "http_version": "1.0",
            "user_agent": "agent",
            "connect_timeout": 1.5,
            "total_timeout": 5,
            "verify_tls": false,
        }))
        .unwrap();

        assert_eq!(options.http_version, Some(HttpVersion::Http10));
        assert_eq!(options.user_agent.as_deref(), Some("agent"));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.total_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.verify_tls, Some(false));
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(TransportOptions::from_json(json!({ "proxy": "x" })).is_err());
        assert!(TransportOptions::from_json(json!({ "timeout": -1 })).is_err());
        assert!(TransportOptions::from_json(json!({ "http_version": "3" })).is_err());
    }

    #[test]
    fn test_http_version_mapping() {
        assert_eq!(HttpVersion::Http10.as_http(), http::Version::HTTP_10);
        assert_eq!(HttpVersion::Http11.as_http(), http::Version::HTTP_11);
        assert_eq!(HttpVersion::Http2.as_http(), http::Version::HTTP_2);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("ZEN_OAUTH2_USER_AGENT", "env-agent");
        std::env::set_var("ZEN_OAUTH2_TIMEOUT", "12");
        std::env::set_var("ZEN_OAUTH2_VERIFY_TLS", "false");

        let options = TransportOptions::from_env().unwrap();
        clear_env();

        assert_eq!(options.user_agent.as_deref(), Some("env-agent"));
        assert_eq!(options.total_timeout, Some(Duration::from_secs(12)));
        assert_eq!(options.verify_tls, Some(false));
        assert_eq!(options.connect_timeout, None);
    }

    #[test]
    #[serial]
    fn test_from_env_empty() {
        clear_env();
        let options = TransportOptions::from_env().unwrap();
        assert!(options.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_dotenv_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ZEN_OAUTH2_USER_AGENT=from-dotenv\nZEN_OAUTH2_HTTP_VERSION=1.0\n").unwrap();

        load_dotenv_from(&path);
        let options = TransportOptions::from_env().unwrap();
        clear_env();

        assert_eq!(options.user_agent.as_deref(), Some("from-dotenv"));
        assert_eq!(options.http_version, Some(HttpVersion::Http10));
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        std::env::set_var("ZEN_OAUTH2_CONNECT_TIMEOUT", "soon");
        let result = TransportOptions::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::Env(_))));
    }
}
