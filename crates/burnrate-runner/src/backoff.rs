// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff after transient failures.
//!
//! The capped delay for the n-th consecutive failure is
//! `min(max_delay, base_delay * 2^n)`; the actual sleep is drawn uniformly
//! from `[capped / 2, capped]` so workers that failed together spread out.

use std::time::Duration;

use burnrate_config::model::RetryConfig;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_retries,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_retries,
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before jitter for the given zero-based failure index.
    pub fn capped_delay(&self, failure_index: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        let max_ms = self.max_delay.as_millis();
        let multiplier = 1u128.checked_shl(failure_index.min(63)).unwrap_or(u128::MAX);
        let capped = base_ms.saturating_mul(multiplier).min(max_ms);
        Duration::from_millis(capped.min(u128::from(u64::MAX)) as u64)
    }

    /// Jittered delay for the given zero-based failure index.
    pub fn delay(&self, failure_index: u32) -> Duration {
        let capped = self.capped_delay(failure_index).as_millis() as u64;
        if capped == 0 {
            return Duration::ZERO;
        }
        let jittered = rand::thread_rng().gen_range(capped / 2..=capped);
        Duration::from_millis(jittered)
    }

    /// Whether `consecutive_failures` has used up the retry allowance.
    pub fn exhausted(&self, consecutive_failures: u32) -> bool {
        consecutive_failures > self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(60), 5)
    }

    #[test]
    fn capped_delay_doubles_then_caps() {
        let p = policy();
        assert_eq!(p.capped_delay(0), Duration::from_secs(1));
        assert_eq!(p.capped_delay(1), Duration::from_secs(2));
        assert_eq!(p.capped_delay(5), Duration::from_secs(32));
        assert_eq!(p.capped_delay(6), Duration::from_secs(60));
        assert_eq!(p.capped_delay(200), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_in_upper_half() {
        let p = policy();
        for index in 0..8 {
            let capped = p.capped_delay(index);
            for _ in 0..50 {
                let d = p.delay(index);
                assert!(d >= capped / 2 && d <= capped, "{d:?} outside [{:?}, {capped:?}]", capped / 2);
            }
        }
    }

    #[test]
    fn zero_base_means_no_wait() {
        let p = RetryPolicy::new(Duration::ZERO, Duration::ZERO, 3);
        assert_eq!(p.delay(4), Duration::ZERO);
    }

    #[test]
    fn exhausted_after_max_retries() {
        let p = policy();
        assert!(!p.exhausted(5));
        assert!(p.exhausted(6));
    }

    #[test]
    fn from_config_reads_millis() {
        let config = RetryConfig {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 1_000,
        };
        let p = RetryPolicy::from_config(&config);
        assert_eq!(p.capped_delay(0), Duration::from_millis(250));
        assert_eq!(p.capped_delay(3), Duration::from_millis(1_000));
        assert_eq!(p.max_retries(), 2);
    }
}
