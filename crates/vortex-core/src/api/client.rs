//! API client for communicating with the HR REST backend.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use super::backend::{ApiRequest, Backend};
use super::{response, ApiError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP client for the HR backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a relative API path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// One round trip, body read but not yet interpreted.
    async fn fetch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        let response = self.build(request, access_token).send().await?;
        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        let body = response.text().await?;

        debug!(method = %request.method, path = %request.path, status, "API response");
        Ok(RawResponse {
            status,
            is_json,
            body,
        })
    }

    fn build(&self, request: &ApiRequest, access_token: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header(header::ACCEPT, "application/json");
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        builder
    }
}

impl Backend for ApiClient {
    async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let initial_backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
        with_rate_limit_retry(&request.path, initial_backoff, move || {
            self.fetch(request, access_token)
        })
        .await
    }
}

/// Status, content type flag and body of a response.
#[derive(Debug, Clone)]
struct RawResponse {
    status: u16,
    is_json: bool,
    body: String,
}

/// Run `attempt` until it is not rate limited, doubling the wait each time,
/// then interpret the response. Gives up with `RateLimited` after
/// `MAX_RATE_LIMIT_RETRIES` retries.
async fn with_rate_limit_retry<F, Fut>(
    path: &str,
    initial_backoff: Duration,
    mut attempt: F,
) -> Result<Value, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RawResponse, ApiError>>,
{
    let mut retries = 0;
    let mut backoff = initial_backoff;

    loop {
        let raw = attempt().await?;

        if raw.status == 429 {
            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(
                path,
                retry = retries,
                backoff_ms = backoff.as_millis() as u64,
                "Rate limited, backing off"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2; // Exponential backoff
            continue;
        }

        return response::interpret(raw.status, raw.is_json, &raw.body);
    }
}
