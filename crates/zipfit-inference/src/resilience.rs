//! Retry and circuit-breaker decoration for external service calls.
//!
//! Every OCR and generation call is wrapped in a [`ResiliencePolicy`]:
//! a bounded per-call timeout, a small bounded retry with exponential
//! backoff, and a named circuit breaker shared process-wide. Repeated
//! failures open the breaker and later calls fail fast with
//! [`Error::Unavailable`] until a cooldown passes, after which a single
//! probe call decides whether the breaker closes again.
//!
//! Core logic never branches on breaker state: call sites only see a
//! distinguishable error and apply their own fallback (the OCR detection
//! probe fails open toward "needs OCR"; everything else surfaces the
//! error).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use zipfit_core::{defaults, Error, Result};

/// Retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Per-attempt timeout.
    pub call_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::RETRY_MAX_RETRIES,
            base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
            call_timeout: Duration::from_secs(defaults::GEN_TIMEOUT_SECS),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Recorded failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long an open breaker short-circuits calls.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::BREAKER_FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(defaults::BREAKER_COOLDOWN_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

/// Named circuit breaker guarding one external service.
pub struct CircuitBreaker {
    service: String,
    config: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker for a service.
    pub fn new(service: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            service: service.into(),
            config,
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
        }
    }

    /// Admit or short-circuit a call. An open breaker whose cooldown has
    /// elapsed transitions to half-open and admits a probe.
    pub async fn acquire(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match *state {
            BreakerState::Closed { .. } | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open { until } => {
                if Instant::now() >= until {
                    debug!(
                        service = %self.service,
                        "Circuit breaker cooldown elapsed, admitting probe"
                    );
                    *state = BreakerState::HalfOpen;
                    Ok(())
                } else {
                    Err(Error::Unavailable(self.service.clone()))
                }
            }
        }
    }

    /// Record a successful call; closes the breaker.
    pub async fn record_success(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, BreakerState::HalfOpen) {
            info!(service = %self.service, "Circuit breaker closed after successful probe");
        }
        *state = BreakerState::Closed { failures: 0 };
    }

    /// Record a failed call (after retries were exhausted).
    pub async fn record_failure(&self) {
        let mut state = self.state.lock().await;
        let next = match *state {
            BreakerState::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.config.failure_threshold {
                    warn!(
                        service = %self.service,
                        failures,
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "Circuit breaker opened"
                    );
                    BreakerState::Open {
                        until: Instant::now() + self.config.cooldown,
                    }
                } else {
                    BreakerState::Closed { failures }
                }
            }
            BreakerState::HalfOpen => {
                warn!(service = %self.service, "Probe failed, circuit breaker re-opened");
                BreakerState::Open {
                    until: Instant::now() + self.config.cooldown,
                }
            }
            open @ BreakerState::Open { .. } => open,
        };
        *state = next;
    }

    /// Whether calls are currently short-circuited.
    pub async fn is_open(&self) -> bool {
        matches!(*self.state.lock().await, BreakerState::Open { until } if Instant::now() < until)
    }
}

/// Composable retry + breaker decorator for one external service.
#[derive(Clone)]
pub struct ResiliencePolicy {
    retry: RetryConfig,
    breaker: Arc<CircuitBreaker>,
}

impl ResiliencePolicy {
    /// Create a policy with default retry and breaker configuration.
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_config(service, RetryConfig::default(), BreakerConfig::default())
    }

    /// Create a policy with custom configuration.
    pub fn with_config(
        service: impl Into<String>,
        retry: RetryConfig,
        breaker: BreakerConfig,
    ) -> Self {
        Self {
            retry,
            breaker: Arc::new(CircuitBreaker::new(service, breaker)),
        }
    }

    /// The breaker guarding this policy's service.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run an operation under the policy.
    ///
    /// Retryable errors (transport-class, see [`Error::is_retryable`]) are
    /// retried up to the configured bound with jittered exponential backoff;
    /// one breaker failure is recorded only once the retry budget is
    /// exhausted. Non-retryable errors return immediately and do not count
    /// toward the breaker.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.breaker.acquire().await?;

        let mut last_err = None;
        for attempt in 0..=self.retry.max_retries {
            let result = tokio::time::timeout(self.retry.call_timeout, op()).await;

            let err = match result {
                Ok(Ok(value)) => {
                    self.breaker.record_success().await;
                    return Ok(value);
                }
                Ok(Err(e)) if !e.is_retryable() => return Err(e),
                Ok(Err(e)) => e,
                Err(_) => Error::Request(format!(
                    "Call timed out after {}ms",
                    self.retry.call_timeout.as_millis()
                )),
            };

            debug!(
                attempt,
                max_retries = self.retry.max_retries,
                error = %err,
                "External call attempt failed"
            );
            last_err = Some(err);

            if attempt < self.retry.max_retries {
                tokio::time::sleep(self.backoff_delay(attempt)).await;
            }
        }

        self.breaker.record_failure().await;
        Err(last_err.unwrap_or_else(|| Error::Internal("Retry loop yielded no error".to_string())))
    }

    /// Jittered exponential backoff: base × 2^attempt plus up to half the
    /// base of random jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.retry.base_delay * 2u32.saturating_pow(attempt);
        let jitter_cap = (self.retry.base_delay.as_millis() as u64 / 2).max(1);
        let jitter = rand::thread_rng().gen_range(0..jitter_cap);
        base + Duration::from_millis(jitter)
    }
}
