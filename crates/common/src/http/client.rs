use std::time::Duration;

use kickstream_domain::HttpSettings;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use thiserror::Error;
use tracing::debug;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Errors produced while sending a request. HTTP status codes are not errors
/// at this layer; callers inspect the returned [`Response`].
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request body cannot be cloned; buffer the body to enable retries")]
    NotCloneable,

    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    #[error("HTTP transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl ErrorClassification for HttpError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Build(_) | Self::NotCloneable => ErrorSeverity::Error,
            Self::Timeout(_) | Self::Transport(_) => ErrorSeverity::Warning,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Attempt budget and backoff shared by every request a client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryPolicy {
    attempts: usize,
    backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), doubling each time and
    /// capped at 256x the base.
    fn delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(8) as u32;
        self.backoff.saturating_mul(1 << exponent)
    }

    fn has_retry_after(&self, attempt: usize) -> bool {
        attempt < self.attempts
    }
}

/// Shared reqwest client for the Kick token, profile and relay calls.
///
/// Every request gets the configured timeout. Transport failures and 5xx
/// responses are retried with exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Build a client from the `[http]` configuration section.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, HttpError> {
        Self::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .max_attempts(settings.max_attempts)
            .base_backoff(Duration::from_millis(settings.retry_backoff_ms))
            .user_agent(concat!("kickstream-helper/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, retrying within the attempt budget.
    ///
    /// Status codes are not errors here: once the budget is spent the last
    /// 5xx response is handed back to the caller.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, HttpError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = builder.try_clone().ok_or(HttpError::NotCloneable)?.build()?;
            let method = request.method().clone();
            let path = request.url().path().to_owned();

            match self.inner.execute(request).await {
                Ok(response)
                    if response.status().is_server_error()
                        && self.retry.has_retry_after(attempt) =>
                {
                    debug!(attempt, %method, %path, status = %response.status(), "server error, retrying");
                }
                Ok(response) => {
                    debug!(attempt, %method, %path, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Err(err) if is_transient(&err) && self.retry.has_retry_after(attempt) => {
                    debug!(attempt, %method, %path, error = %err, "transport failure, retrying");
                }
                Err(err) => {
                    debug!(attempt, %method, %path, error = %err, "HTTP request failed");
                    return Err(err.into());
                }
            }

            let delay = self.retry.delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry: RetryPolicy { attempts: 2, backoff: Duration::from_millis(200) },
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first one; zero is treated as one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, HttpError> {
        let builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        let builder = match self.user_agent {
            Some(agent) => builder.user_agent(agent),
            None => builder,
        };
        let inner = builder.build().map_err(|err| HttpError::Build(err.to_string()))?;

        Ok(HttpClient { inner, retry: self.retry })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
