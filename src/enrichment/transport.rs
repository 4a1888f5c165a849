//! Rate-limited HTTP transport shared by catalog clients.
//!
//! Wraps a `reqwest::Client` with the safeguards upstream APIs expect
//! from a polite client:
//!
//! - a concurrency gate capping in-flight requests
//! - a sliding 60-second window bounding request rate
//! - exponential-backoff retries for transient network failures
//!
//! HTTP error statuses are returned to the caller untouched; only
//! timeouts and connection-level failures are retried.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Length of the sliding rate-limit window.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Transport failure after the retry budget is spent, or a
/// non-retryable request error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("network error after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    #[error("request failed: {0}")]
    Request(String),
}

/// Connection and pacing settings for one upstream API.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub rate_limit_per_minute: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub max_concurrent_requests: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            rate_limit_per_minute: 100,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            max_concurrent_requests: 10,
        }
    }
}

/// HTTP transport with a concurrency gate, sliding-window rate limiter,
/// and retry-with-backoff on transient failures.
pub struct RateLimitedTransport {
    http: reqwest::Client,
    base_url: String,
    gate: Semaphore,
    window: Mutex<VecDeque<Instant>>,
    window_span: Duration,
    rate_limit: usize,
    max_retries: u32,
}

impl RateLimitedTransport {
    pub fn new(config: TransportConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            // OpenLibrary serves gzip-compressed JSON
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gate: Semaphore::new(config.max_concurrent_requests),
            window: Mutex::new(VecDeque::new()),
            window_span: RATE_WINDOW,
            rate_limit: config.rate_limit_per_minute,
            max_retries: config.max_retries,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path under the base URL, holding a concurrency permit for
    /// the whole retry loop so retries never multiply in-flight load.
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, TransportError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| TransportError::Request("concurrency gate closed".to_string()))?;

        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                tracing::info!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    url = %url,
                    "retrying request after network error"
                );
                tokio::time::sleep(delay).await;
            }

            self.pace().await;

            match self.http.get(&url).query(params).send().await {
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status().as_u16(), attempt, "request completed");
                    return Ok(response);
                }
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(url = %url, attempt, error = %e, "request failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(TransportError::Request(e.to_string())),
            }
        }

        let message = last_error.map(|e| e.to_string()).unwrap_or_default();
        tracing::error!(url = %url, max_retries = self.max_retries, "all retry attempts exhausted");
        Err(TransportError::Exhausted {
            attempts: self.max_retries + 1,
            message,
        })
    }

    /// GET the API root; anything other than a clean 200 counts as down.
    pub async fn health_check(&self) -> bool {
        match self.get("/", &[]).await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                false
            }
        }
    }

    /// Block until this request fits in the rate window, then record it.
    ///
    /// The window lock is held across the pacing sleep so queued callers
    /// drain strictly one at a time once the limit is reached.
    async fn pace(&self) {
        let mut window = self.window.lock().await;

        let now = Instant::now();
        while window
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window_span)
        {
            window.pop_front();
        }

        if window.len() >= self.rate_limit
            && let Some(oldest) = window.front().copied()
        {
            let wait = self.window_span.saturating_sub(now.duration_since(oldest));
            if !wait.is_zero() {
                tracing::info!(
                    wait_ms = wait.as_millis() as u64,
                    in_window = window.len(),
                    "rate limit reached, pacing request"
                );
                tokio::time::sleep(wait).await;
            }
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|t| now.duration_since(*t) >= self.window_span)
            {
                window.pop_front();
            }
        }

        window.push_back(Instant::now());
    }
}

/// Exponential backoff: 1s, 2s, 4s, ... before retry `attempt`.
fn backoff_delay(attempt: u32) -> Duration {
    // Shift capped at 63; a u64 shift by 64+ overflows
    Duration::from_secs(1u64 << (attempt - 1).min(63))
}

/// Transient network failures worth retrying. Builder and redirect
/// errors are deterministic and propagate immediately.
fn is_retryable(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}
