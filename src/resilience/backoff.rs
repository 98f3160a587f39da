//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Delay schedule between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    // Up to 10% jitter
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = BackoffPolicy::new(100, 1000);

        let first = policy.delay(1).as_millis();
        assert!((100..110).contains(&first));

        let second = policy.delay(2).as_millis();
        assert!((200..220).contains(&second));

        let capped = policy.delay(10).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_zero_attempt_has_no_delay() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let delay = calculate_backoff(200, u64::MAX / 2, 5000);
        assert!(delay.as_millis() >= 5000);
    }
}
