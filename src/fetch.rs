//! HTTP page fetching with bounded retries and exponential backoff.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: core trait, one URL in, one page body out
//! - [`HttpFetcher`]: a single reqwest GET with a browser-like identity
//! - [`RetryFetch`]: decorator adding retry logic to any [`PageFetcher`]
//!
//! # Client identity
//!
//! Every attempt picks a user-agent from a small pool of common browsers and
//! sends the headers a browser would. This only reduces trivial bot blocking on
//! listing pages; it is a resilience measure, not a security or evasion feature.
//!
//! # Retry Strategy
//!
//! - `max_attempts` attempts in total (network errors and non-2xx responses)
//! - Exponential backoff `base_delay * 2^(attempt-1)`, capped at 10 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::error::FetchError;
use crate::models::FetchSettings;
use rand::seq::IndexedRandom;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

const MAX_BACKOFF: Duration = Duration::from_secs(10);
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Trait for fetching one page body.
///
/// Implementors never panic on network trouble; every failure is a [`FetchError`].
pub trait PageFetcher {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Pick a user-agent string from the pool.
pub fn pick_user_agent() -> &'static str {
    USER_AGENTS.choose(&mut rng()).copied().unwrap_or(USER_AGENTS[0])
}

/// A single-attempt HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, pick_user_agent())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "tr-TR,tr;q=0.9,en;q=0.8")
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageFetcher`].
///
/// The delay before attempt `n + 1` follows this formula:
/// ```text
/// delay = min(base_delay * 2^(n-1), 10s) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_attempts: usize,
    base_delay: Duration,
    max_jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Wrap `inner`, allowing `max_attempts` attempts in total (at least one).
    pub fn new(inner: T, max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter: MAX_JITTER,
        }
    }

    /// Override the random jitter added to every backoff delay.
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1) as u32)
            .unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(MAX_BACKOFF);
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    let total_dt = total_t0.elapsed();
                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(FetchError::Exhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Build the production fetcher for a run: HTTP with retries.
///
/// # Arguments
///
/// * `settings` - Per-attempt timeout, attempt count and base backoff delay
///
/// # Returns
///
/// An [`HttpFetcher`] wrapped in [`RetryFetch`], or a [`FetchError`] if the
/// HTTP client cannot be built.
pub fn http_fetcher(settings: &FetchSettings) -> Result<RetryFetch<HttpFetcher>, FetchError> {
    let inner = HttpFetcher::new(settings.timeout)?;
    Ok(RetryFetch::new(
        inner,
        settings.max_attempts,
        settings.base_delay,
    ))
}
