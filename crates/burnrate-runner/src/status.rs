// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic status snapshots.
//!
//! A [`StatusReport`] is built from one ledger snapshot, so every figure in
//! it is mutually consistent. The reporter either logs it as a structured
//! `tracing` event or prints it as one JSON line on stdout.

use std::time::Duration;

use burnrate_config::StatusFormat;
use burnrate_cost::{CostMode, LedgerSnapshot, StopPolicy};
use serde::Serialize;
use tracing::info;

/// Point-in-time view of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub calls_sent: u64,
    pub calls_ok: u64,
    pub calls_err: u64,
    pub calls_throttled: u64,
    pub calls_estimated: u64,
    pub in_flight: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub run_cost_usd: f64,
    pub spent_usd: f64,
    pub cap_usd: f64,
    pub elapsed_secs: u64,
    pub cost_mode: CostMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl StatusReport {
    pub fn new(snapshot: &LedgerSnapshot, policy: &StopPolicy, elapsed: Duration) -> Self {
        Self {
            calls_sent: snapshot.calls_sent,
            calls_ok: snapshot.calls_ok,
            calls_err: snapshot.calls_err,
            calls_throttled: snapshot.calls_throttled,
            calls_estimated: snapshot.calls_estimated,
            in_flight: snapshot.in_flight(),
            input_tokens: snapshot.input_tokens_total,
            output_tokens: snapshot.output_tokens_total,
            run_cost_usd: policy.run_cost(snapshot).as_f64(),
            spent_usd: policy.spent(snapshot).as_f64(),
            cap_usd: policy.criteria().effective_cap().as_f64(),
            elapsed_secs: elapsed.as_secs(),
            cost_mode: policy.source().mode(),
            stop_reason: None,
        }
    }

    pub fn with_stop_reason(mut self, reason: impl Into<String>) -> Self {
        self.stop_reason = Some(reason.into());
        self
    }

    /// Share of the cap spent so far, as a percentage.
    pub fn cap_percent(&self) -> f64 {
        if self.cap_usd <= 0.0 {
            return 100.0;
        }
        self.spent_usd / self.cap_usd * 100.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    format: StatusFormat,
}

impl StatusReporter {
    pub fn new(format: StatusFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> StatusFormat {
        self.format
    }

    /// JSON line for `json` format, `None` for `log`.
    pub fn render(&self, report: &StatusReport) -> Option<String> {
        match self.format {
            StatusFormat::Log => None,
            StatusFormat::Json => {
                Some(serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string()))
            }
        }
    }

    pub fn emit(&self, report: &StatusReport) {
        match self.render(report) {
            Some(line) => println!("{line}"),
            None => info!(
                calls_sent = report.calls_sent,
                calls_ok = report.calls_ok,
                calls_err = report.calls_err,
                throttled = report.calls_throttled,
                estimated = report.calls_estimated,
                in_flight = report.in_flight,
                input_tokens = report.input_tokens,
                output_tokens = report.output_tokens,
                run_cost_usd = format_args!("{:.6}", report.run_cost_usd),
                spent_usd = format_args!("{:.6}", report.spent_usd),
                cap_usd = format_args!("{:.6}", report.cap_usd),
                cap_pct = format_args!("{:.1}", report.cap_percent()),
                elapsed_secs = report.elapsed_secs,
                cost_mode = %report.cost_mode,
                stop_reason = report.stop_reason.as_deref(),
                "status"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use burnrate_core::TokenUsage;
    use burnrate_cost::{AttemptOutcome, CostSource, SpendLedger, StopCriteria, TokenPrices, Usd};
    use tracing_test::traced_test;

    use super::*;

    fn policy() -> StopPolicy {
        StopPolicy::new(
            StopCriteria::new(Usd::from_dollars(10), 0.9, None),
            TokenPrices::from_usd_per_1k(0.003, 0.015),
            Arc::new(CostSource::estimated(Usd::from_dollars(1))),
        )
    }

    fn snapshot() -> LedgerSnapshot {
        let ledger = SpendLedger::new();
        let t = ledger.begin_attempt();
        ledger.record_attempt(
            t,
            AttemptOutcome::Success {
                usage: TokenUsage::new(1_000_000, 200_000),
                estimated: false,
            },
        );
        let t = ledger.begin_attempt();
        ledger.record_attempt(t, AttemptOutcome::Failure { throttled: true });
        let _pending = ledger.begin_attempt();
        ledger.snapshot()
    }

    #[test]
    fn report_reflects_snapshot() {
        let report = StatusReport::new(&snapshot(), &policy(), Duration::from_secs(42));
        assert_eq!(report.calls_sent, 3);
        assert_eq!(report.calls_ok, 1);
        assert_eq!(report.calls_err, 1);
        assert_eq!(report.calls_throttled, 1);
        assert_eq!(report.in_flight, 1);
        assert_eq!(report.run_cost_usd, 6.0);
        assert_eq!(report.spent_usd, 7.0);
        assert_eq!(report.cap_usd, 9.0);
        assert_eq!(report.elapsed_secs, 42);
        assert_eq!(report.cost_mode, CostMode::Estimated);
    }

    #[test]
    fn json_render_is_one_line() {
        let reporter = StatusReporter::new(StatusFormat::Json);
        let report = StatusReport::new(&snapshot(), &policy(), Duration::ZERO);
        let line = reporter.render(&report).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["calls_ok"], 1);
        assert_eq!(value["cost_mode"], "estimated");
        assert!(value.get("stop_reason").is_none());
    }

    #[test]
    fn stop_reason_is_serialized_when_set() {
        let reporter = StatusReporter::new(StatusFormat::Json);
        let report =
            StatusReport::new(&snapshot(), &policy(), Duration::ZERO).with_stop_reason("interrupted");
        let value: serde_json::Value =
            serde_json::from_str(&reporter.render(&report).unwrap()).unwrap();
        assert_eq!(value["stop_reason"], "interrupted");
    }

    #[test]
    #[traced_test]
    fn log_format_emits_tracing_event() {
        let reporter = StatusReporter::new(StatusFormat::Log);
        let report = StatusReport::new(&snapshot(), &policy(), Duration::ZERO);
        assert!(reporter.render(&report).is_none());
        reporter.emit(&report);
        assert!(logs_contain("calls_sent=3"));
        assert!(logs_contain("cost_mode=estimated"));
    }

    #[test]
    fn cap_percent() {
        let report = StatusReport::new(&snapshot(), &policy(), Duration::ZERO);
        assert!((report.cap_percent() - 7.0 / 9.0 * 100.0).abs() < 1e-9);
    }
}
