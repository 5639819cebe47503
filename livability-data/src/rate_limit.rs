//! Minimum-spacing rate limiter for the geocoder.
//!
//! Work items run one at a time, in submission order, and each start is at
//! least `min_interval` after the previous start. The queue is the waiter
//! list of a fair [`tokio::sync::Mutex`], so ordering is FIFO and a failing
//! or cancelled item releases the slot for the next caller.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between geocoder requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Serialises asynchronous work with an enforced gap between starts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use livability_data::RateLimiter;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(Duration::from_millis(10));
/// let value = limiter.submit(|| async { 7 }).await;
/// assert_eq!(value, 7);
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter enforcing `min_interval` between starts.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Configured spacing.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for this caller's turn, then run `work` and return its output.
    ///
    /// Errors are carried in `T` and reach only this caller.
    pub async fn submit<F, Fut, T>(&self, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last_start = Some(Instant::now());
        work().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
