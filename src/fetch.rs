//! Per-origin fetch with bounded retries and exponential backoff.
//!
//! A single attempt lives behind [`PageFetcher`] so the resolver and the
//! cycle can be exercised with fakes. [`fetch_with_retry`] owns the retry
//! budget: retryable failures burn an attempt and back off, terminal
//! failures abort the origin immediately.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::StatusCode;

pub const USER_AGENT: &str = "KolkataFFWatcher/0.1 (+https://kolkataff.tv)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One origin attempt, classified.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Timeouts, connect/DNS errors, 5xx, 429: worth another attempt.
    #[error("retryable fetch failure: {0}")]
    Retryable(String),
    /// Other 4xx or an exhausted budget: give this origin up.
    #[error("terminal fetch failure: {0}")]
    Terminal(String),
}

/// Backoff knobs; see `Config::from_env` for the env mapping.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given 1-based failed attempt:
    /// base doubling per attempt, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt - 1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the raw body of `url` once.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher over reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        // A client without the timeout would let one attempt hang a whole
        // cycle; builder failure here is unrecoverable misconfiguration.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("http client with bounded timeout");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Some(FetchError::Retryable(format!("upstream status {status}")));
    }
    if status.is_client_error() {
        return Some(FetchError::Terminal(format!("upstream status {status}")));
    }
    None
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                FetchError::Retryable(e.to_string())
            } else {
                FetchError::Terminal(e.to_string())
            }
        })?;

        if let Some(err) = classify_status(resp.status()) {
            return Err(err);
        }

        resp.text()
            .await
            .map_err(|e| FetchError::Retryable(e.to_string()))
    }
}

/// Fetch `url` with up to `policy.max_attempts` attempts.
///
/// Returns the terminal error as-is; an exhausted budget comes back as
/// `Terminal` so the resolver advances to the next origin either way.
pub async fn fetch_with_retry<F: PageFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let mut last_err = String::new();
    for attempt in 1..=policy.max_attempts.max(1) {
        counter!("fetch_attempts_total").increment(1);
        match fetcher.get(url).await {
            Ok(body) => return Ok(body),
            Err(FetchError::Terminal(msg)) => {
                tracing::warn!(url, attempt, error = %msg, "terminal fetch failure");
                return Err(FetchError::Terminal(msg));
            }
            Err(FetchError::Retryable(msg)) => {
                let backoff = policy.delay_after(attempt);
                tracing::warn!(
                    url,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %msg,
                    "fetch failed"
                );
                last_err = msg;
                if attempt < policy.max_attempts {
                    counter!("fetch_retries_total").increment(1);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
    Err(FetchError::Terminal(format!(
        "retries exhausted for {url}: {last_err}"
    )))
}
