// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global call pacing shared by all workers.
//!
//! Slots are handed out at a fixed interval of `60s / calls_per_minute`.
//! Each caller reserves the next free slot under a mutex and then sleeps
//! until it arrives, so callers are served in arrival order and no two
//! slots are closer together than the interval. The first slot is free
//! immediately.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// A limiter admitting `calls_per_minute` attempts per minute (minimum 1).
    pub fn per_minute(calls_per_minute: u32) -> Self {
        Self::with_interval(Duration::from_secs(60) / calls_per_minute.max(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn reserve(&self) -> Instant {
        let mut next = self.next_slot.lock().await;
        let slot = (*next).max(Instant::now());
        *next = slot + self.interval;
        slot
    }

    /// Wait for the next slot.
    pub async fn acquire_slot(&self) {
        let slot = self.reserve().await;
        tokio::time::sleep_until(slot).await;
    }

    /// Wait for the next slot unless `cancel` fires first.
    ///
    /// Returns `false` when cancelled. A slot reserved by a cancelled waiter
    /// is not handed to anyone else.
    pub async fn acquire_slot_cancellable(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        let slot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            slot = self.reserve() => slot,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(slot) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interval_from_calls_per_minute() {
        assert_eq!(RateLimiter::per_minute(60).interval(), Duration::from_secs(1));
        assert_eq!(
            RateLimiter::per_minute(120).interval(),
            Duration::from_millis(500)
        );
        assert_eq!(RateLimiter::per_minute(0).interval(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn first_slot_is_immediate() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();
        limiter.acquire_slot().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn ten_slots_at_sixty_per_minute_take_nine_seconds() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire_slot().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(9), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_are_spaced() {
        let limiter = Arc::new(RateLimiter::per_minute(120));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire_slot().await;
                Instant::now()
            }));
        }
        let mut times = Vec::new();
        for h in handles {
            times.push(h.await.unwrap());
        }
        times.sort();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
        assert!(times[5] - start >= Duration::from_millis(2_500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_wait() {
        let limiter = Arc::new(RateLimiter::per_minute(1));
        let cancel = CancellationToken::new();
        assert!(limiter.acquire_slot_cancellable(&cancel).await);

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.acquire_slot_cancellable(&cancel).await })
        };
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
        assert!(!waiter.await.unwrap());
        assert!(!limiter.acquire_slot_cancellable(&cancel).await);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_limiter_does_not_bank_slots() {
        let limiter = RateLimiter::per_minute(60);
        limiter.acquire_slot().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        let start = Instant::now();
        limiter.acquire_slot().await;
        limiter.acquire_slot().await;
        // Only one slot is available immediately after idling.
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
