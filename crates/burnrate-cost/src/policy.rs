// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stop criteria and the stop decision.
//!
//! The run stops once spend reaches `target * stop_ratio` or the wall-clock
//! limit passes. Calls already in flight when the decision is made still
//! complete and get recorded, so real spend can land above the cap by at
//! most one maximum-size call per worker. [`StopCriteria::worst_case_overshoot`]
//! computes that bound so it can be checked against the target at startup.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::ledger::LedgerSnapshot;
use crate::pricing::TokenPrices;
use crate::source::CostSource;
use crate::usd::Usd;

const PPM: u64 = 1_000_000;

/// Limits that end a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCriteria {
    target: Usd,
    stop_ratio_ppm: u64,
    max_duration: Option<Duration>,
}

impl StopCriteria {
    /// `stop_ratio` is clamped into (0, 1] at parts-per-million resolution.
    pub fn new(target: Usd, stop_ratio: f64, max_duration: Option<Duration>) -> Self {
        let ppm = if stop_ratio.is_finite() {
            (stop_ratio * PPM as f64).round().clamp(1.0, PPM as f64) as u64
        } else {
            PPM
        };
        Self {
            target,
            stop_ratio_ppm: ppm,
            max_duration,
        }
    }

    pub fn target(&self) -> Usd {
        self.target
    }

    pub fn stop_ratio(&self) -> f64 {
        self.stop_ratio_ppm as f64 / PPM as f64
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    /// Spend level at which workers stop: `target * stop_ratio`.
    pub fn effective_cap(&self) -> Usd {
        self.target.scale_ppm(self.stop_ratio_ppm)
    }

    /// Upper bound on spend recorded after the stop decision.
    pub fn worst_case_overshoot(&self, workers: usize, max_call_cost: Usd) -> Usd {
        max_call_cost.saturating_mul(workers as u64)
    }

    /// Whether the cap plus the overshoot bound stays within the target.
    pub fn overshoot_fits(&self, workers: usize, max_call_cost: Usd) -> bool {
        self.effective_cap()
            .saturating_add(self.worst_case_overshoot(workers, max_call_cost))
            <= self.target
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    BudgetReached { spent: Usd, cap: Usd },
    DurationElapsed { elapsed: Duration, limit: Duration },
    PermanentError { message: String },
    Interrupted,
}

impl StopReason {
    /// Short machine-friendly label for logs and status output.
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::BudgetReached { .. } => "budget_reached",
            StopReason::DurationElapsed { .. } => "duration_elapsed",
            StopReason::PermanentError { .. } => "permanent_error",
            StopReason::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::BudgetReached { spent, cap } => {
                write!(f, "budget reached: spent {spent} of cap {cap}")
            }
            StopReason::DurationElapsed { elapsed, limit } => write!(
                f,
                "duration limit reached: {}s elapsed of {}s",
                elapsed.as_secs(),
                limit.as_secs()
            ),
            StopReason::PermanentError { message } => write!(f, "permanent error: {message}"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Stop decision for a spent amount and elapsed time. Budget wins over duration.
pub fn check_stop(spent: Usd, criteria: &StopCriteria, elapsed: Duration) -> Option<StopReason> {
    let cap = criteria.effective_cap();
    if spent >= cap {
        return Some(StopReason::BudgetReached { spent, cap });
    }
    match criteria.max_duration {
        Some(limit) if elapsed >= limit => Some(StopReason::DurationElapsed { elapsed, limit }),
        _ => None,
    }
}

/// Stop decision for a ledger snapshot with no prior spend.
pub fn should_stop(
    snapshot: &LedgerSnapshot,
    criteria: &StopCriteria,
    prices: &TokenPrices,
    elapsed: Duration,
) -> bool {
    check_stop(snapshot.cost(prices), criteria, elapsed).is_some()
}

/// Criteria, prices, and cost source bundled for the workers.
#[derive(Debug, Clone)]
pub struct StopPolicy {
    criteria: StopCriteria,
    prices: TokenPrices,
    source: Arc<CostSource>,
}

impl StopPolicy {
    pub fn new(criteria: StopCriteria, prices: TokenPrices, source: Arc<CostSource>) -> Self {
        Self {
            criteria,
            prices,
            source,
        }
    }

    pub fn criteria(&self) -> &StopCriteria {
        &self.criteria
    }

    pub fn prices(&self) -> &TokenPrices {
        &self.prices
    }

    pub fn source(&self) -> &Arc<CostSource> {
        &self.source
    }

    /// Cost of this run's recorded usage.
    pub fn run_cost(&self, snapshot: &LedgerSnapshot) -> Usd {
        snapshot.cost(&self.prices)
    }

    /// Total spend including prior spend from the cost source.
    pub fn spent(&self, snapshot: &LedgerSnapshot) -> Usd {
        self.source.spent(self.run_cost(snapshot))
    }

    pub fn evaluate(&self, snapshot: &LedgerSnapshot, elapsed: Duration) -> Option<StopReason> {
        check_stop(self.spent(snapshot), &self.criteria, elapsed)
    }

    pub fn should_stop(&self, snapshot: &LedgerSnapshot, elapsed: Duration) -> bool {
        self.evaluate(snapshot, elapsed).is_some()
    }
}

#[cfg(test)]
mod tests {
    use burnrate_core::TokenUsage;

    use super::*;
    use crate::ledger::{AttemptOutcome, SpendLedger};

    fn example_prices() -> TokenPrices {
        TokenPrices::from_usd_per_1k(0.003, 0.015)
    }

    fn ledger_with(input: u64, output: u64) -> SpendLedger {
        let ledger = SpendLedger::new();
        let ticket = ledger.begin_attempt();
        ledger.record_attempt(
            ticket,
            AttemptOutcome::Success {
                usage: TokenUsage::new(input, output),
                estimated: false,
            },
        );
        ledger
    }

    #[test]
    fn effective_cap_applies_ratio() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        assert_eq!(criteria.effective_cap(), Usd::from_dollars(9));
        assert!((criteria.stop_ratio() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn ratio_is_clamped() {
        let over = StopCriteria::new(Usd::from_dollars(10), 1.7, None);
        assert_eq!(over.effective_cap(), Usd::from_dollars(10));
        let nan = StopCriteria::new(Usd::from_dollars(10), f64::NAN, None);
        assert_eq!(nan.effective_cap(), Usd::from_dollars(10));
        let zero = StopCriteria::new(Usd::from_dollars(1), 0.0, None);
        assert_eq!(zero.effective_cap(), Usd::from_nanos(1_000));
    }

    #[test]
    fn six_dollars_does_not_stop_at_nine_dollar_cap() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        let ledger = ledger_with(1_000_000, 200_000);
        let snap = ledger.snapshot();
        assert_eq!(snap.cost(&example_prices()), Usd::from_dollars(6));
        assert!(!should_stop(&snap, &criteria, &example_prices(), Duration::ZERO));
    }

    #[test]
    fn further_output_on_six_dollar_ledger_stops_at_thirty_six() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        let ledger = ledger_with(1_000_000, 200_000);
        let ticket = ledger.begin_attempt();
        ledger.record_attempt(
            ticket,
            AttemptOutcome::Success {
                usage: TokenUsage::new(0, 2_000_000),
                estimated: false,
            },
        );
        let snap = ledger.snapshot();
        assert_eq!(snap.calls_ok, 2);
        assert_eq!(snap.output_tokens_total, 2_200_000);
        assert_eq!(snap.cost(&example_prices()), Usd::from_dollars(36));
        assert!(should_stop(&snap, &criteria, &example_prices(), Duration::ZERO));
    }

    #[test]
    fn reaching_cap_exactly_stops() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        let reason = check_stop(Usd::from_dollars(9), &criteria, Duration::ZERO);
        assert_eq!(
            reason,
            Some(StopReason::BudgetReached {
                spent: Usd::from_dollars(9),
                cap: Usd::from_dollars(9)
            })
        );
    }

    #[test]
    fn duration_limit_stops() {
        let criteria =
            StopCriteria::new(Usd::from_dollars(10), 0.9, Some(Duration::from_secs(60)));
        assert!(check_stop(Usd::ZERO, &criteria, Duration::from_secs(59)).is_none());
        let reason = check_stop(Usd::ZERO, &criteria, Duration::from_secs(60)).unwrap();
        assert_eq!(reason.label(), "duration_elapsed");
    }

    #[test]
    fn budget_takes_priority_over_duration() {
        let criteria = StopCriteria::new(Usd::from_dollars(1), 1.0, Some(Duration::from_secs(1)));
        let reason = check_stop(Usd::from_dollars(2), &criteria, Duration::from_secs(5)).unwrap();
        assert_eq!(reason.label(), "budget_reached");
    }

    #[test]
    fn policy_counts_prior_spend() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        let source = Arc::new(CostSource::estimated(Usd::from_dollars(5)));
        let policy = StopPolicy::new(criteria, example_prices(), source);
        let snap = ledger_with(1_000_000, 0).snapshot();
        // $3 of run cost on top of a $5 baseline is still under the $9 cap.
        assert_eq!(policy.spent(&snap), Usd::from_dollars(8));
        assert!(!policy.should_stop(&snap, Duration::ZERO));

        let snap = ledger_with(1_000_000, 100_000).snapshot();
        assert!(policy.should_stop(&snap, Duration::ZERO));
    }

    #[test]
    fn overshoot_bound_scales_with_workers() {
        let criteria = StopCriteria::new(Usd::from_dollars(10), 0.9, None);
        let per_call = Usd::from_nanos(250_000_000);
        assert_eq!(
            criteria.worst_case_overshoot(4, per_call),
            Usd::from_dollars(1)
        );
        assert!(criteria.overshoot_fits(4, per_call));
        assert!(!criteria.overshoot_fits(5, per_call));
    }

    #[test]
    fn stop_reason_display() {
        let reason = StopReason::BudgetReached {
            spent: Usd::from_dollars(9),
            cap: Usd::from_dollars(9),
        };
        assert_eq!(
            reason.to_string(),
            "budget reached: spent $9.000000 of cap $9.000000"
        );
        assert_eq!(StopReason::Interrupted.to_string(), "interrupted");
    }
}
