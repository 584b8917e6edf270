//! Resilient HTTP fetch layer.
//!
//! Every provider call in the monitor goes through [`ResilientFetcher`]:
//! bounded retries with exponential backoff, rate-limit-aware extra delay on
//! 429, a fixed per-request timeout, and a process-wide cap on concurrent
//! requests so one slow provider cannot starve the rest of a poll cycle.

use crate::error::FetchError;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// Configuration for the shared fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Attempts per request, including the first.
    pub max_retries: u32,
    /// Hard timeout per HTTP request.
    pub request_timeout: Duration,
    /// Cap on concurrent in-flight requests across all providers.
    pub max_connections: usize,
    /// Idle pool size kept per host.
    pub max_connections_per_host: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: Duration::from_secs(15),
            max_connections: 100,
            max_connections_per_host: 30,
        }
    }
}

/// Result of one HTTP attempt, before retry policy is applied.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx with a JSON body.
    Body(Value),
    /// 404: nothing to report, never retried.
    NotFound,
    /// 429: retried with rate-limit-aware backoff.
    RateLimited,
    /// Any other status: retried with plain exponential backoff.
    Status(u16),
    /// Request timeout: retried.
    TimedOut,
    /// Connection/parse failure: retried after a short flat delay.
    Failed(String),
}

/// Drive `attempt` up to `max_retries` times, applying the backoff policy.
///
/// Attempt `i` (0-indexed) sleeps `2^i` seconds before the next try; a 429
/// adds `i * 0.5` seconds on top. Exhausting retries yields `None` - this
/// layer never raises to the caller.
pub async fn run_with_retry<F, Fut>(max_retries: u32, mut attempt: F) -> Option<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchOutcome>,
{
    for i in 0..max_retries {
        let last = i + 1 == max_retries;
        match attempt().await {
            FetchOutcome::Body(body) => return Some(body),
            FetchOutcome::NotFound => return None,
            FetchOutcome::RateLimited => {
                let wait = Duration::from_secs_f64(f64::powi(2.0, i as i32) + i as f64 * 0.5);
                warn!(attempt = i, wait_secs = wait.as_secs_f64(), "rate limited, backing off");
                if !last {
                    tokio::time::sleep(wait).await;
                }
            }
            FetchOutcome::Status(status) => {
                warn!(attempt = i, status, "provider returned error status");
                if !last {
                    tokio::time::sleep(Duration::from_secs(1 << i)).await;
                }
            }
            FetchOutcome::TimedOut => {
                if !last {
                    tokio::time::sleep(Duration::from_secs(1 << i)).await;
                }
            }
            FetchOutcome::Failed(reason) => {
                error!(attempt = i, reason = %reason, "fetch failed");
                if last {
                    return None;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
    None
}

/// Shared HTTP client with retry, backoff and connection limiting.
///
/// Built once at startup and passed by handle into every component that
/// performs provider I/O.
pub struct ResilientFetcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    max_retries: u32,
}

impl ResilientFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            max_retries: config.max_retries,
        })
    }

    /// GET a JSON document. `None` means "no data": 404, exhausted retries,
    /// or an unrecoverable provider error.
    pub async fn fetch(&self, url: &str) -> Option<Value> {
        self.fetch_with_headers(url, &[]).await
    }

    /// GET with extra request headers (e.g. provider API tokens).
    pub async fn fetch_with_headers(&self, url: &str, headers: &[(&str, &str)]) -> Option<Value> {
        run_with_retry(self.max_retries, || self.attempt(url, headers)).await
    }

    async fn attempt(&self, url: &str, headers: &[(&str, &str)]) -> FetchOutcome {
        // Closed only on shutdown; treat as a plain failure.
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return FetchOutcome::Failed("connection limiter closed".to_string()),
        };

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchOutcome::TimedOut,
            Err(e) => return FetchOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<Value>().await {
                Ok(body) => FetchOutcome::Body(body),
                Err(e) => FetchOutcome::Failed(e.to_string()),
            }
        } else if status.as_u16() == 404 {
            FetchOutcome::NotFound
        } else if status.as_u16() == 429 {
            FetchOutcome::RateLimited
        } else {
            FetchOutcome::Status(status.as_u16())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct Script {
        outcomes: Mutex<VecDeque<FetchOutcome>>,
        attempts_at: Mutex<Vec<Instant>>,
    }

    impl Script {
        fn new(outcomes: Vec<FetchOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                attempts_at: Mutex::new(Vec::new()),
            })
        }

        async fn next(self: &Arc<Self>) -> FetchOutcome {
            self.attempts_at.lock().unwrap().push(Instant::now());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| FetchOutcome::Failed("script exhausted".to_string()))
        }

        fn gaps(&self) -> Vec<Duration> {
            let at = self.attempts_at.lock().unwrap();
            at.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn attempts(&self) -> usize {
            self.attempts_at.lock().unwrap().len()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_backs_off_then_succeeds() {
        let script = Script::new(vec![
            FetchOutcome::RateLimited,
            FetchOutcome::RateLimited,
            FetchOutcome::Body(json!({"ok": true})),
        ]);

        let s = script.clone();
        let body = run_with_retry(3, move || {
            let s = s.clone();
            async move { s.next().await }
        })
        .await;

        assert_eq!(body, Some(json!({"ok": true})));
        assert_eq!(script.attempts(), 3);

        // Two sleeps, strictly increasing: 2^0 + 0*0.5 = 1s, 2^1 + 1*0.5 = 2.5s.
        let gaps = script.gaps();
        assert_eq!(gaps.len(), 2);
        assert!(gaps[1] > gaps[0]);
        assert_eq!(gaps[0], Duration::from_secs_f64(1.0));
        assert_eq!(gaps[1], Duration::from_secs_f64(2.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_exhaust_retries() {
        let script = Script::new(vec![
            FetchOutcome::Status(500),
            FetchOutcome::Status(500),
            FetchOutcome::Status(500),
        ]);

        let s = script.clone();
        let body = run_with_retry(3, move || {
            let s = s.clone();
            async move { s.next().await }
        })
        .await;

        assert!(body.is_none());
        assert_eq!(script.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_short_circuits() {
        let script = Script::new(vec![FetchOutcome::NotFound]);

        let s = script.clone();
        let body = run_with_retry(3, move || {
            let s = s.clone();
            async move { s.next().await }
        })
        .await;

        assert!(body.is_none());
        assert_eq!(script.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success() {
        let script = Script::new(vec![
            FetchOutcome::TimedOut,
            FetchOutcome::Body(json!([1, 2, 3])),
        ]);

        let s = script.clone();
        let body = run_with_retry(3, move || {
            let s = s.clone();
            async move { s.next().await }
        })
        .await;

        assert_eq!(body, Some(json!([1, 2, 3])));
        assert_eq!(script.gaps(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_fetcher_config_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.max_connections_per_host, 30);
    }
}
