use reqwest::Method;
use serde_json::Value;

use super::ApiError;

/// A single REST call, relative to the configured API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Transport to the HR backend.
///
/// `ApiClient` is the network implementation; tests script responses
/// through the same seam.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Send a request, attaching `access_token` as a bearer credential when
    /// present, and return the interpreted JSON payload.
    async fn send(&self, request: &ApiRequest, access_token: Option<&str>)
        -> Result<Value, ApiError>;
}
