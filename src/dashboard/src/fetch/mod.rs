//! Fetch orchestration: per-attempt timeout, bounded retry with exponential
//! backoff, and normalization into [`FetchError`].

pub mod http;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use common::config::FetchConfig;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use transport::{Request, Transport, TransportError};

/// Retry policy for transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: config.initial_backoff,
            max_delay: config.max_backoff,
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

/// Wraps a [`Transport`] with the timeout/retry/normalization contract.
///
/// Stateless apart from its configuration: it never touches panel state,
/// callers apply the result.
#[derive(Clone)]
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl FetchOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, config: &FetchConfig) -> Self {
        Self::with_policy(transport, config.timeout, RetryPolicy::from(config))
    }

    pub fn with_policy(
        transport: Arc<dyn Transport>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            timeout,
            retry,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch and decode a JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &Request) -> Result<T, FetchError> {
        let body = self.fetch_raw(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            log::error!("Invalid response body from {}: {}", request.path, e);
            FetchError::unknown(format!("invalid response body from {}: {e}", request.path))
        })
    }

    /// Fetch the raw body, retrying transient failures.
    pub async fn fetch_raw(&self, request: &Request) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            log::debug!(
                "GET {} {:?} (attempt {}/{})",
                request.path,
                request.params,
                attempt,
                max_attempts
            );

            let outcome = tokio::time::timeout(self.timeout, self.transport.get(request))
                .await
                .unwrap_or(Err(TransportError::Timeout));

            match outcome {
                Ok(body) => {
                    if attempt > 1 {
                        log::info!("GET {} succeeded after {} attempts", request.path, attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    log::warn!(
                        "GET {} failed (attempt {}/{}): {}, retrying after {:?}",
                        request.path,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "GET {} failed after {} attempt(s): {}",
                        request.path,
                        attempt,
                        e
                    );
                    return Err(FetchError::from_transport(e, attempt, &request.path));
                }
            }
        }
    }
}
