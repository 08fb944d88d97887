use http::{HeaderMap, Method};
use std::collections::{BTreeMap, BTreeSet};

/// A request seen by a [`StubTransport`](crate::StubTransport) or a
/// [`MockTokenServer`](crate::MockTokenServer).
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Full URL for the stub transport, path and query for the mock server
    pub target: String,
    /// Request headers as sent
    pub headers: HeaderMap,
    /// Request body, empty if none was sent
    pub body: String,
}

impl RecordedRequest {
    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode the body as a URL-encoded form.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a valid form.
    pub fn form(&self) -> BTreeMap<String, String> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(&self.body)
            .expect("request body is not a URL-encoded form")
            .into_iter()
            .collect()
    }

    /// Names of the form fields in the body.
    pub fn form_keys(&self) -> BTreeSet<String> {
        self.form().into_keys().collect()
    }

    /// Decode the query string of the target.
    pub fn query(&self) -> BTreeMap<String, String> {
        let query = self.target.split_once('?').map(|(_, q)| q).unwrap_or("");
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .expect("request target has an invalid query string")
            .into_iter()
            .collect()
    }
}
