// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where the "spent so far" figure comes from.
//!
//! A run starts either from an authoritative month-to-date billing figure or
//! from a locally persisted baseline. Billing data lags real usage by hours,
//! so the spent figure is always the larger of the latest billing amount and
//! the baseline plus this run's estimated cost. Once billing becomes
//! unavailable the source degrades to estimates for the rest of the run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::warn;

use crate::usd::Usd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CostMode {
    /// Spend is anchored to billing data.
    Authoritative,
    /// Spend is baseline plus local token-count estimates.
    Estimated,
}

#[derive(Debug)]
pub struct CostSource {
    authoritative: AtomicBool,
    baseline_nanos: u64,
    latest_billing_nanos: AtomicU64,
}

impl CostSource {
    /// Estimate-only source starting from `baseline` (persisted prior spend or zero).
    pub fn estimated(baseline: Usd) -> Self {
        Self {
            authoritative: AtomicBool::new(false),
            baseline_nanos: baseline.nanos(),
            latest_billing_nanos: AtomicU64::new(0),
        }
    }

    /// Billing-anchored source starting from a month-to-date figure.
    pub fn authoritative(month_to_date: Usd) -> Self {
        Self {
            authoritative: AtomicBool::new(true),
            baseline_nanos: month_to_date.nanos(),
            latest_billing_nanos: AtomicU64::new(month_to_date.nanos()),
        }
    }

    pub fn mode(&self) -> CostMode {
        if self.authoritative.load(Ordering::Acquire) {
            CostMode::Authoritative
        } else {
            CostMode::Estimated
        }
    }

    pub fn baseline(&self) -> Usd {
        Usd::from_nanos(self.baseline_nanos)
    }

    /// Latest billing figure seen, or zero in estimated mode.
    pub fn latest_billing(&self) -> Usd {
        Usd::from_nanos(self.latest_billing_nanos.load(Ordering::Acquire))
    }

    /// Fold in a fresh billing figure. Ignored once degraded.
    ///
    /// Billing amounts only grow within a month, so a smaller figure than one
    /// already seen is dropped.
    pub fn observe_billing(&self, amount: Usd) {
        if self.mode() == CostMode::Authoritative {
            self.latest_billing_nanos
                .fetch_max(amount.nanos(), Ordering::AcqRel);
        }
    }

    /// Switch to estimated mode. Logs a warning on the first call only.
    ///
    /// Returns `true` when this call performed the switch.
    pub fn degrade(&self, reason: &str) -> bool {
        let switched = self.authoritative.swap(false, Ordering::AcqRel);
        if switched {
            warn!(
                reason,
                baseline = %self.baseline(),
                "billing data unavailable, continuing with estimated spend"
            );
        }
        switched
    }

    /// Spent so far given this run's estimated cost.
    pub fn spent(&self, run_cost: Usd) -> Usd {
        let estimated = self.baseline().saturating_add(run_cost);
        estimated.max(self.latest_billing())
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn estimated_adds_run_cost_to_baseline() {
        let source = CostSource::estimated(Usd::from_dollars(2));
        assert_eq!(source.mode(), CostMode::Estimated);
        assert_eq!(source.spent(Usd::from_dollars(3)), Usd::from_dollars(5));
    }

    #[test]
    fn estimated_ignores_billing_observations() {
        let source = CostSource::estimated(Usd::ZERO);
        source.observe_billing(Usd::from_dollars(100));
        assert_eq!(source.spent(Usd::from_dollars(1)), Usd::from_dollars(1));
    }

    #[test]
    fn authoritative_takes_larger_of_billing_and_estimate() {
        let source = CostSource::authoritative(Usd::from_dollars(10));
        assert_eq!(source.spent(Usd::from_dollars(1)), Usd::from_dollars(11));

        source.observe_billing(Usd::from_dollars(20));
        assert_eq!(source.spent(Usd::from_dollars(1)), Usd::from_dollars(20));

        // Billing never moves backwards.
        source.observe_billing(Usd::from_dollars(15));
        assert_eq!(source.latest_billing(), Usd::from_dollars(20));
    }

    #[test]
    #[traced_test]
    fn degrade_switches_once_and_logs_once() {
        let source = CostSource::authoritative(Usd::from_dollars(4));
        assert!(source.degrade("timeout"));
        assert!(!source.degrade("timeout"));
        assert_eq!(source.mode(), CostMode::Estimated);
        // The figure already observed still bounds spend from below.
        assert_eq!(source.spent(Usd::ZERO), Usd::from_dollars(4));

        logs_assert(|lines: &[&str]| {
            let count = lines
                .iter()
                .filter(|l| l.contains("billing data unavailable"))
                .count();
            if count == 1 {
                Ok(())
            } else {
                Err(format!("expected one degrade warning, saw {count}"))
            }
        });
    }

    #[test]
    fn mode_renders_snake_case() {
        assert_eq!(CostMode::Authoritative.to_string(), "authoritative");
        assert_eq!("estimated".parse::<CostMode>().unwrap(), CostMode::Estimated);
    }
}
