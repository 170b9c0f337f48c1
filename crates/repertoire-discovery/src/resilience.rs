//! Resilience primitives for collaborator calls.

use std::future::Future;
use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

use crate::error::{DiscoveryError, DiscoveryResult};

/// Attempts made after the first failure of a transient call.
const MAX_RETRIES: usize = 3;

/// Per-source rate limiter using a token-bucket approach.
///
/// Limits throughput to a configurable number of requests per second by
/// combining a single-permit [`Semaphore`] with a fixed sleep interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter` that allows at most
    /// `requests_per_second` requests per second.
    pub fn new(requests_per_second: u32) -> Self {
        Self::with_interval(Duration::from_millis(
            1000 / u64::from(requests_per_second.max(1)),
        ))
    }

    /// Creates a `RateLimiter` that spaces requests by `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval,
        }
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval to enforce the rate limit.
    pub async fn acquire(&self) {
        // The semaphore is never closed; a closed one degrades to a plain sleep.
        let _permit = self.semaphore.acquire().await.ok();
        sleep(self.interval).await;
    }
}

/// Fixed pause between consecutive items of a sequential loop.
///
/// The first [`tick`](Throttle::tick) returns immediately; every later one
/// sleeps for the configured delay.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    primed: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }

    pub async fn tick(&mut self) {
        if self.primed && !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.primed = true;
    }
}

/// Run `operation`, retrying with exponential backoff while it fails with a
/// transient error.
pub async fn retry_transient<T, F, Fut>(source_name: &str, operation: F) -> DiscoveryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DiscoveryResult<T>>,
{
    operation
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(MAX_RETRIES),
        )
        .when(DiscoveryError::is_transient)
        .notify(|err: &DiscoveryError, delay: Duration| {
            log::warn!("{} call failed ({}), retrying in {:?}", source_name, err, delay);
        })
        .await
}
