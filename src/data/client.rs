//! Jolpica F1 API request executor
//!
//! Issues a single logical GET request with a per-attempt timeout, bounded
//! retries with exponential backoff, and classification of failures into
//! retryable (timeouts, connection errors, 5xx) and terminal (4xx, malformed
//! bodies) errors.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::rate_limit::RateLimiter;

/// Top-level field every well-formed API response carries
pub const ENVELOPE_FIELD: &str = "MRData";

/// Query parameters as key/value pairs
pub type QueryParams = [(&'static str, String)];

/// Raw HTTP response handed back by a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Failure to obtain any HTTP response at all
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),
}

/// Performs one HTTP GET
///
/// The seam between the retry logic and the network. [`ReqwestTransport`] is
/// the production implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(e.to_string())
    }
}

/// Why a retryable attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Connection(String),
    Server(u16),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Timeout => write!(f, "request timed out"),
            TransportFailure::Connection(msg) => write!(f, "connection failed: {}", msg),
            TransportFailure::Server(status) => write!(f, "server error {}", status),
        }
    }
}

/// Errors surfaced by [`ApiClient::request`]
#[derive(Debug, Error)]
pub enum FetchError {
    /// Timeouts, connection failures and 5xx responses, after all retries
    #[error("request to {url} failed after {attempts} attempt(s): {failure}")]
    Transport {
        url: String,
        attempts: u32,
        failure: TransportFailure,
    },

    /// 4xx response; never retried
    #[error("client error {status} for {url}")]
    ClientRequest { url: String, status: u16 },

    /// Successful status but the body is not a usable API response
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

/// Timeout and retry budget for a request
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Bound on a single attempt
    pub timeout: Duration,
    /// Unit of the exponential backoff
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Delay slept after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(10),
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Rate-limited, retrying request executor
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url` and returns the parsed JSON body
    ///
    /// # Returns
    /// * `Ok(Value)` - A JSON object containing the `MRData` envelope
    /// * `Err(FetchError::ClientRequest)` - On the first 4xx response
    /// * `Err(FetchError::MalformedResponse)` - On the first unusable 2xx body
    /// * `Err(FetchError::Transport)` - When every attempt timed out, failed to
    ///   connect, or got a server error
    pub async fn request(&self, url: &str, params: &QueryParams) -> Result<Value, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;
            debug!(url, attempt, "sending request");

            let failure = match self.transport.get(url, params, self.policy.timeout).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    return validate_envelope(url, &response.body);
                }
                Ok(response) if (400..500).contains(&response.status) => {
                    error!(url, status = response.status, "client error, not retrying");
                    return Err(FetchError::ClientRequest {
                        url: url.to_string(),
                        status: response.status,
                    });
                }
                Ok(response) => TransportFailure::Server(response.status),
                Err(TransportError::Timeout) => TransportFailure::Timeout,
                Err(TransportError::Connection(msg)) => TransportFailure::Connection(msg),
            };

            warn!(url, attempt, max_attempts, %failure, "request attempt failed");

            if attempt >= max_attempts {
                error!(url, attempts = attempt, "request failed, retries exhausted");
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    attempts: attempt,
                    failure,
                });
            }

            tokio::time::sleep(self.policy.backoff(attempt)).await;
        }
    }
}

/// Parses a response body and checks for the `MRData` envelope
fn validate_envelope(url: &str, body: &str) -> Result<Value, FetchError> {
    let malformed = |reason: String| {
        error!(url, %reason, "invalid response from API");
        FetchError::MalformedResponse {
            url: url.to_string(),
            reason,
        }
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

    match value.as_object() {
        None => Err(malformed("response is not a JSON object".to_string())),
        Some(map) if !map.contains_key(ENVELOPE_FIELD) => Err(malformed(format!(
            "response missing '{}' field",
            ENVELOPE_FIELD
        ))),
        Some(_) => Ok(value),
    }
}
