//! Testing utilities for zen-oauth2
//!
//! - [`StubTransport`] replaces the HTTP transport of an `OAuth2Client`,
//!   records every request and answers with scripted responses or errors.
//! - [`MockTokenServer`] is a local HTTP or HTTPS server for exercising the real
//!   transport end to end.

pub mod request;
pub mod response;
pub mod server;
pub mod stub;

pub use request::RecordedRequest;
pub use response::MockResponse;
pub use server::MockTokenServer;
pub use stub::StubTransport;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a test-friendly tracing subscriber once.
///
/// Honors `RUST_LOG`; defaults to `zen_oauth2=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zen_oauth2=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
