//! # zen-oauth2
//!
//! A minimal OAuth2 client.
//!
//! The crate does three things:
//!
//! - builds authorization URLs for the user to visit
//! - exchanges an authorization code, a username/password pair, or a refresh
//!   token for an access token
//! - performs the underlying HTTP calls over a configurable transport
//!
//! Each OAuth2 provider plugs in through [`AuthEndpointProvider`], which
//! supplies the authorize and token endpoints. [`Endpoints`] covers the
//! common case of two fixed URLs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zen_oauth2::{Endpoints, OAuth2Client, TransportOptions};
//! use std::time::Duration;
//!
//! # async fn run() -> zen_oauth2::Result<()> {
//! let provider = Endpoints::new(
//!     "https://auth.example.com/authorize",
//!     "https://auth.example.com/token",
//! );
//! let mut client = OAuth2Client::new(provider, "client_id", "client_secret");
//! client.set_transport_config(TransportOptions::new().total_timeout(Duration::from_secs(10)));
//!
//! // Send the user here
//! let url = client.authorize_url([("redirect_uri", "https://myapp.com/callback")]);
//!
//! // Then exchange the code from the callback
//! let token = client
//!     .get_access_token(
//!         "code",
//!         [("code", "abc"), ("redirect_uri", "https://myapp.com/callback")],
//!     )
//!     .await?;
//! println!("{url} -> {:?}", token.access_token());
//! # Ok(())
//! # }
//! ```
//!
//! ## Diagnostics
//!
//! Requests are reported through [`tracing`] at the `debug` level, request
//! parameter names and response bodies at `trace`. Secrets are never logged.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod client;
pub mod config;
mod error;
mod grant;
mod provider;
mod token;
pub mod transport;

pub use client::{ClientCredentials, OAuth2Client};
pub use config::{ConfigError, HttpVersion, TransportConfig, TransportOptions};
pub use error::{OAuthError, Result, TransportError, TransportErrorCode};
pub use grant::{GrantRequest, GrantType};
pub use provider::{AuthEndpointProvider, Endpoints};
pub use token::TokenResult;
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport, RequestOutcome, ResponseInfo};
