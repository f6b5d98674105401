// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted billing source.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use burnrate_core::{BillingSource, BurnrateError};

/// Returns queued month-to-date figures, then repeats the last successful one.
///
/// A queued `Err` produces a billing error for that call.
pub struct MockBilling {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<String>>,
    calls: AtomicU64,
    delay: Duration,
}

impl MockBilling {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            last: Mutex::new(None),
            calls: AtomicU64::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Always reports `amount`.
    pub fn fixed(amount: &str) -> Self {
        Self::new(vec![Ok(amount.to_string())])
    }

    /// Always fails.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    /// Sleep this long before answering each lookup.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingSource for MockBilling {
    fn name(&self) -> &str {
        "mock-billing"
    }

    async fn month_to_date(&self) -> Result<String, BurnrateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Ok(amount)) => {
                *self.last.lock().await = Some(amount.clone());
                Ok(amount)
            }
            Some(Err(message)) => Err(BurnrateError::billing(message)),
            None => self
                .last
                .lock()
                .await
                .clone()
                .ok_or_else(|| BurnrateError::billing("billing unavailable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeats_last_success() {
        let billing = MockBilling::new(vec![Ok("1.5".into()), Err("boom".into())]);
        assert_eq!(billing.month_to_date().await.unwrap(), "1.5");
        assert!(billing.month_to_date().await.is_err());
        assert_eq!(billing.month_to_date().await.unwrap(), "1.5");
        assert_eq!(billing.calls(), 3);
    }

    #[tokio::test]
    async fn unavailable_always_errors() {
        let billing = MockBilling::unavailable();
        assert!(matches!(
            billing.month_to_date().await,
            Err(BurnrateError::Billing { .. })
        ));
    }
}
