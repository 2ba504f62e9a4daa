//! Per-request options for [`RequestExecutor::send`](crate::RequestExecutor::send).

use reqwest::Method;
use serde_json::Value;

/// Method, extra headers and optional JSON body of one logical request.
///
/// Headers given here are merged over the default
/// `Content-Type: application/json`; a stored access token always wins over
/// a caller-supplied `Authorization`.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    #[must_use]
    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header. A later header with the same name replaces an earlier one.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
