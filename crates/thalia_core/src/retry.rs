//! Retry policies as pure functions of the attempt number.
//!
//! Instead of ad hoc mutable counters at each call site, a policy answers
//! one question: given that attempt `n` just failed, should we try again,
//! and after how long?

use std::time::Duration;

/// A bounded retry schedule, independent of the operation being retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before retry `k` is `base * k` (linear ramp).
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy for text generator calls: attempt k waits k x 1000 ms.
    pub fn generator(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1000),
        }
    }

    /// Decide whether to retry after failed attempt `attempt` (1-based).
    /// Returns the delay to wait before the next attempt, or None to give up.
    pub fn decide(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.base_delay * attempt)
        }
    }
}

/// Exponential backoff for a recurring cycle: starts at `initial`, doubles
/// on each consecutive failure, caps at `max`, resets on success.
#[derive(Debug, Clone)]
pub struct CycleBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl CycleBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Defaults for the engagement monitoring cycle: 1s doubling to 5 min.
    pub fn monitoring() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(300))
    }

    /// Record a failed cycle and return the delay to wait before the next one.
    pub fn on_failure(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Record a successful cycle; the next failure starts over at `initial`.
    pub fn on_success(&mut self) {
        self.current = self.initial;
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_policy_linear_ramp() {
        let policy = RetryPolicy::generator(3);
        assert_eq!(policy.decide(1), Some(Duration::from_millis(1000)));
        assert_eq!(policy.decide(2), Some(Duration::from_millis(2000)));
        assert_eq!(policy.decide(3), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = CycleBackoff::monitoring();
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
        assert_eq!(backoff.on_failure(), Duration::from_secs(2));
        assert_eq!(backoff.on_failure(), Duration::from_secs(4));
        for _ in 0..10 {
            backoff.on_failure();
        }
        assert_eq!(backoff.current(), Duration::from_secs(300));
    }

    #[test]
    fn test_backoff_resets_on_success() {
        let mut backoff = CycleBackoff::monitoring();
        backoff.on_failure();
        backoff.on_failure();
        backoff.on_success();
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
    }
}
