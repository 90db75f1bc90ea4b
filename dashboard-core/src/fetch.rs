//! HTTP GET with bounded retries and exponential backoff.
//!
//! The client is deliberately silent: it neither logs nor touches shared
//! state. Callers decide what a failure means and how to report it.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::{FetchError, TransportError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// How many attempts to make and how long to wait after each failed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles on every further one.
    pub base_delay: Duration,
    /// Optional ceiling. `None` keeps the backoff uncapped.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Option<Duration>) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// `base_delay * 2^attempt`, clamped to `max_delay` when one is set.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base_delay.saturating_mul(factor);
        match self.max_delay {
            Some(ceiling) => delay.min(ceiling),
            None => delay,
        }
    }
}

/// Raw outcome of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything able to perform a single HTTP GET.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport. No timeout is configured: the retry loop is the
/// only bound on how long a fetch may take.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

/// Resilient JSON fetcher.
#[derive(Debug, Clone)]
pub struct FetchClient<T = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl FetchClient<HttpTransport> {
    pub fn http(policy: RetryPolicy) -> Self {
        Self::new(HttpTransport::new(), policy)
    }
}

impl<T: Transport> FetchClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// Every failed attempt (transport error, non-2xx status, unparsable body)
    /// is followed by `delay_for_attempt(i)`; once `max_retries` attempts have
    /// failed the call ends with [`FetchError::MaxRetriesExceeded`].
    ///
    /// A body that parses but describes an application error is returned as
    /// is. Interpreting it is the caller's job.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut last_error = None;

        for attempt in 0..self.policy.max_retries {
            match self.attempt(url).await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }

            tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
        }

        Err(FetchError::MaxRetriesExceeded {
            attempts: self.policy.max_retries,
            last_error,
        })
    }

    /// Same as [`fetch_json`](Self::fetch_json), building the URL from a base
    /// and URL-encoded query parameters.
    pub async fn fetch_json_with_params(
        &self,
        base: &str,
        params: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let url = Url::parse_with_params(base, params)
            .map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
        self.fetch_json(url.as_str()).await
    }

    async fn attempt(&self, url: &str) -> Result<Value, TransportError> {
        let res = self.transport.get(url).await?;

        if !res.is_ok() {
            return Err(TransportError::Status(res.status));
        }

        serde_json::from_str(&res.body).map_err(|e| TransportError::InvalidJson(e.to_string()))
    }
}
