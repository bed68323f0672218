//! Login throttle - fixed-window attempt limiting per client key.
//!
//! Runs before credential verification so throttled clients never reach
//! the password-hashing cost. Every attempt counts, successful or not: a
//! legitimate user who mistypes repeatedly is throttled the same as an
//! attacker, which keeps the design stateless about outcomes.

use std::sync::Arc;

use crate::errors::AppResult;
use crate::infra::CounterStore;

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// The attempt may proceed to credential verification
    Allowed { remaining: u64 },
    /// Too many attempts in the current window
    Throttled { retry_after: u64 },
}

/// Fixed-window login throttle over an injected counter store.
pub struct LoginThrottle {
    store: Arc<dyn CounterStore>,
    max_attempts: u64,
    window_seconds: u64,
}

impl LoginThrottle {
    pub fn new(store: Arc<dyn CounterStore>, max_attempts: u64, window_seconds: u64) -> Self {
        Self {
            store,
            max_attempts,
            window_seconds,
        }
    }

    /// Attempts allowed per window.
    pub fn limit(&self) -> u64 {
        self.max_attempts
    }

    /// Record an attempt for `client_key` and decide whether it may
    /// proceed. Counter-store failures propagate as infrastructure errors;
    /// they are never reported as `Throttled`.
    pub async fn check_and_record(&self, client_key: &str) -> AppResult<ThrottleDecision> {
        let key = format!("login:{}", client_key);
        let counted = self.store.increment(&key, self.window_seconds).await?;

        if counted.count > self.max_attempts {
            tracing::warn!(client = %client_key, count = counted.count, "Login attempt throttled");
            // Retry-After reflects the actual time left in the window
            return Ok(ThrottleDecision::Throttled {
                retry_after: counted.resets_in,
            });
        }

        Ok(ThrottleDecision::Allowed {
            remaining: self.max_attempts - counted.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{ManualClock, MemoryCounterStore};
    use chrono::{Duration, Utc};

    fn throttle_with_clock() -> (LoginThrottle, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryCounterStore::new(clock.clone()));
        // 5 attempts per 15 minutes (the production defaults)
        (LoginThrottle::new(store, 5, 900), clock)
    }

    #[tokio::test]
    async fn test_exactly_limit_attempts_allowed() {
        let (throttle, _clock) = throttle_with_clock();

        for attempt in 1..=5u64 {
            let decision = throttle.check_and_record("1.2.3.4").await.unwrap();
            assert_eq!(
                decision,
                ThrottleDecision::Allowed {
                    remaining: 5 - attempt
                }
            );
        }

        // The limit+1th attempt in the same window is rejected
        assert_eq!(
            throttle.check_and_record("1.2.3.4").await.unwrap(),
            ThrottleDecision::Throttled { retry_after: 900 }
        );
    }

    #[tokio::test]
    async fn test_retry_after_reflects_remaining_window() {
        let (throttle, clock) = throttle_with_clock();

        for _ in 0..5 {
            throttle.check_and_record("1.2.3.4").await.unwrap();
        }

        // 600s into the window only 300s remain
        clock.advance(Duration::seconds(600));
        assert_eq!(
            throttle.check_and_record("1.2.3.4").await.unwrap(),
            ThrottleDecision::Throttled { retry_after: 300 }
        );
    }

    #[tokio::test]
    async fn test_window_elapse_unthrottles() {
        let (throttle, clock) = throttle_with_clock();

        for _ in 0..6 {
            throttle.check_and_record("1.2.3.4").await.unwrap();
        }
        assert!(matches!(
            throttle.check_and_record("1.2.3.4").await.unwrap(),
            ThrottleDecision::Throttled { .. }
        ));

        clock.advance(Duration::seconds(901));
        assert_eq!(
            throttle.check_and_record("1.2.3.4").await.unwrap(),
            ThrottleDecision::Allowed { remaining: 4 }
        );
    }

    #[tokio::test]
    async fn test_clients_throttle_independently() {
        let (throttle, _clock) = throttle_with_clock();

        for _ in 0..6 {
            throttle.check_and_record("1.2.3.4").await.unwrap();
        }

        assert!(matches!(
            throttle.check_and_record("1.2.3.4").await.unwrap(),
            ThrottleDecision::Throttled { .. }
        ));
        assert!(matches!(
            throttle.check_and_record("5.6.7.8").await.unwrap(),
            ThrottleDecision::Allowed { .. }
        ));
    }
}
