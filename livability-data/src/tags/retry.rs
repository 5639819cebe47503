//! Retry budget applied to each failover endpoint.

use std::time::Duration;

/// Default attempts per endpoint, counting the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Exponential backoff settings for one endpoint.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use livability_data::tags::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.backoff(1), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per endpoint, including the first; zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each later retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Set the attempts per endpoint.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the first retry delay.
    #[must_use]
    pub const fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Attempts per endpoint, at least one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (1-based), saturating on overflow.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 500)]
    #[case(2, 1000)]
    #[case(3, 2000)]
    fn backoff_doubles(#[case] retry: u32, #[case] millis: u64) {
        let policy = RetryPolicy::default().with_initial_backoff(Duration::from_millis(500));
        assert_eq!(policy.backoff(retry), Duration::from_millis(millis));
    }

    #[rstest]
    fn backoff_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(u32::MAX),
            Duration::from_secs(u64::from(u32::MAX))
        );
    }

    #[rstest]
    fn zero_attempts_still_try_once() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).attempts(), 1);
    }
}
