// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool and run supervisor.
//!
//! The supervisor spawns the workers, then multiplexes the interrupt signal,
//! the wall-clock deadline, status ticks, and billing refreshes in one
//! `select!` loop. Stopping is two-phase: the stop token ends every wait
//! so no new call starts, and in-flight calls get `shutdown_grace` to finish
//! and be recorded. Only then is the abort token cancelled, abandoning
//! whatever is still outstanding.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use burnrate_config::BurnrateConfig;
use burnrate_core::{BillingSource, InvocationClient};
use burnrate_cost::{
    estimate_cost, CostMode, LedgerSnapshot, SpendLedger, SpendStateFile, StopPolicy, StopReason,
    Usd,
};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::backoff::RetryPolicy;
use crate::billing::poll_billing;
use crate::rate_limit::RateLimiter;
use crate::status::{StatusReport, StatusReporter};
use crate::worker::{run_worker, StopSignal, WorkerShared, WorkerState, WorkerStates};
use crate::workload::WorkloadPrompt;

/// Process exit code for a clean stop.
pub const EXIT_OK: i32 = 0;
/// Process exit code when a permanent error ended the run before any call succeeded.
pub const EXIT_PERMANENT_ERROR: i32 = 2;

/// Supervisor timing and pool size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub workers: usize,
    pub shutdown_grace: Duration,
    pub status_interval: Duration,
    pub billing_poll_interval: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &BurnrateConfig) -> Self {
        Self {
            workers: config.rate.workers.max(1),
            shutdown_grace: Duration::from_secs(config.run.shutdown_grace_secs),
            status_interval: Duration::from_secs(config.status.interval_secs.max(1)),
            billing_poll_interval: Duration::from_secs(config.billing.poll_interval_secs.max(1)),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: StopReason,
    pub snapshot: LedgerSnapshot,
    pub run_cost: Usd,
    pub spent: Usd,
    pub cap: Usd,
    pub cost_mode: CostMode,
    pub elapsed: Duration,
    /// In-flight calls given up on after the grace period.
    pub abandoned: u64,
    pub worker_states: Vec<WorkerState>,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        match self.reason {
            StopReason::PermanentError { .. } if self.snapshot.calls_ok == 0 => {
                EXIT_PERMANENT_ERROR
            }
            _ => EXIT_OK,
        }
    }
}

pub struct WorkerPool {
    client: Arc<dyn InvocationClient>,
    policy: StopPolicy,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    workload: WorkloadPrompt,
    settings: PoolSettings,
    reporter: StatusReporter,
    ledger: Arc<SpendLedger>,
    billing: Option<Arc<dyn BillingSource>>,
    state_file: Option<Arc<SpendStateFile>>,
}

impl WorkerPool {
    pub fn new(client: Arc<dyn InvocationClient>, policy: StopPolicy, config: &BurnrateConfig) -> Self {
        Self {
            client,
            policy,
            limiter: Arc::new(RateLimiter::per_minute(config.rate.calls_per_minute)),
            retry: RetryPolicy::from_config(&config.retry),
            workload: WorkloadPrompt::from_config(&config.workload),
            settings: PoolSettings::from_config(config),
            reporter: StatusReporter::new(config.status.format),
            ledger: Arc::new(SpendLedger::new()),
            billing: None,
            state_file: None,
        }
    }

    /// Billing source polled while the cost source is authoritative.
    pub fn with_billing(mut self, billing: Arc<dyn BillingSource>) -> Self {
        self.billing = Some(billing);
        self
    }

    pub fn with_state_file(mut self, state_file: Arc<SpendStateFile>) -> Self {
        self.state_file = Some(state_file);
        self
    }

    pub fn with_settings(mut self, settings: PoolSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn ledger(&self) -> Arc<SpendLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Cost of one call at full input size and maximum output.
    pub fn max_call_cost(&self) -> Usd {
        estimate_cost(
            self.workload.input_tokens_hint(),
            self.workload.max_output_tokens(),
            self.policy.prices(),
        )
    }

    /// Run until a stop criterion fires or `interrupt` is cancelled.
    pub async fn run(self, interrupt: CancellationToken) -> RunSummary {
        let workers = self.settings.workers;
        let started = Instant::now();
        let abort = CancellationToken::new();
        let signal = Arc::new(StopSignal::new(abort.child_token()));
        let states = Arc::new(WorkerStates::new(workers));
        let source = Arc::clone(self.policy.source());
        let criteria = self.policy.criteria().clone();

        let max_call = self.max_call_cost();
        let overshoot = criteria.worst_case_overshoot(workers, max_call);
        info!(
            workers,
            client = self.client.name(),
            interval_ms = self.limiter.interval().as_millis() as u64,
            target = %criteria.target(),
            cap = %criteria.effective_cap(),
            overshoot_bound = %overshoot,
            cost_mode = %source.mode(),
            "starting run"
        );
        if !criteria.overshoot_fits(workers, max_call) {
            warn!(
                cap = %criteria.effective_cap(),
                overshoot_bound = %overshoot,
                target = %criteria.target(),
                "cap plus worst-case overshoot exceeds the target; lower stop_ratio or workers"
            );
        }

        let shared = Arc::new(WorkerShared {
            client: Arc::clone(&self.client),
            ledger: Arc::clone(&self.ledger),
            limiter: Arc::clone(&self.limiter),
            policy: self.policy.clone(),
            retry: self.retry.clone(),
            workload: self.workload.clone(),
            state_file: self.state_file.clone(),
            states: Arc::clone(&states),
            signal: Arc::clone(&signal),
            abort: abort.clone(),
            started,
            usage_estimate_warned: AtomicBool::new(false),
        });

        if interrupt.is_cancelled() {
            signal.trigger(StopReason::Interrupted);
        }
        let mut set = JoinSet::new();
        for id in 0..workers {
            set.spawn(run_worker(id, Arc::clone(&shared)));
        }

        let status_interval = self.settings.status_interval;
        let mut status_tick = tokio::time::interval_at(started + status_interval, status_interval);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let poll_interval = self.settings.billing_poll_interval;
        let mut billing_tick = tokio::time::interval_at(started + poll_interval, poll_interval);
        billing_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut billing = match source.mode() {
            CostMode::Authoritative => self.billing.clone(),
            CostMode::Estimated => None,
        };

        let limit = criteria.max_duration();
        let deadline = async move {
            match limit {
                Some(limit) => tokio::time::sleep_until(started + limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let stop = signal.token().clone();
        let mut abandoned: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = interrupt.cancelled() => {
                    signal.trigger(StopReason::Interrupted);
                    break;
                }
                _ = stop.cancelled() => break,
                _ = &mut deadline => {
                    trigger_deadline(&signal, limit, started);
                    break;
                }
                _ = status_tick.tick() => {
                    let snapshot = self.ledger.snapshot();
                    let report = StatusReport::new(&snapshot, &self.policy, started.elapsed());
                    self.reporter.emit(&report);
                    if let Some(reason) = self.policy.evaluate(&snapshot, started.elapsed()) {
                        signal.trigger(reason);
                        break;
                    }
                }
                _ = billing_tick.tick(), if billing.is_some() => {
                    if let Some(source_client) = billing.clone() {
                        // A slow lookup must not hold back an interrupt or the deadline.
                        tokio::select! {
                            biased;
                            _ = interrupt.cancelled() => {
                                signal.trigger(StopReason::Interrupted);
                                break;
                            }
                            _ = stop.cancelled() => break,
                            _ = &mut deadline => {
                                trigger_deadline(&signal, limit, started);
                                break;
                            }
                            healthy = poll_billing(source_client.as_ref(), &source) => {
                                if !healthy {
                                    billing = None;
                                }
                            }
                        }
                    }
                    if let Some(reason) = self.policy.evaluate(&self.ledger.snapshot(), started.elapsed()) {
                        signal.trigger(reason);
                        break;
                    }
                }
                joined = set.join_next() => match joined {
                    Some(Ok(was_abandoned)) => {
                        abandoned += u64::from(was_abandoned);
                    }
                    Some(Err(e)) => error!(error = %e, "worker task failed"),
                    None => break,
                },
            }
        }

        stop.cancel();
        let in_flight = self.ledger.snapshot().in_flight();
        if in_flight > 0 {
            info!(
                in_flight,
                grace_secs = self.settings.shutdown_grace.as_secs(),
                "waiting for in-flight calls"
            );
        }
        let drained = tokio::time::timeout(
            self.settings.shutdown_grace,
            drain_workers(&mut set, &mut abandoned),
        )
        .await;
        if drained.is_err() {
            warn!(
                in_flight = self.ledger.snapshot().in_flight(),
                "shutdown grace elapsed, abandoning in-flight calls"
            );
            abort.cancel();
            drain_workers(&mut set, &mut abandoned).await;
        }

        let snapshot = self.ledger.snapshot();
        let elapsed = started.elapsed();
        let reason = signal.reason().unwrap_or_else(|| StopReason::PermanentError {
            message: "all workers exited unexpectedly".to_string(),
        });

        let report = StatusReport::new(&snapshot, &self.policy, elapsed).with_stop_reason(reason.label());
        self.reporter.emit(&report);

        let summary = RunSummary {
            run_cost: self.policy.run_cost(&snapshot),
            spent: self.policy.spent(&snapshot),
            cap: criteria.effective_cap(),
            cost_mode: source.mode(),
            elapsed,
            abandoned,
            worker_states: states.snapshot(),
            snapshot,
            reason,
        };
        info!(
            reason = %summary.reason,
            calls_sent = summary.snapshot.calls_sent,
            calls_ok = summary.snapshot.calls_ok,
            calls_err = summary.snapshot.calls_err,
            run_cost = %summary.run_cost,
            spent = %summary.spent,
            abandoned = summary.abandoned,
            elapsed_secs = summary.elapsed.as_secs(),
            "run finished"
        );
        summary
    }
}

fn trigger_deadline(signal: &StopSignal, limit: Option<Duration>, started: Instant) {
    if let Some(limit) = limit {
        signal.trigger(StopReason::DurationElapsed {
            elapsed: started.elapsed(),
            limit,
        });
    }
}

async fn drain_workers(set: &mut JoinSet<bool>, abandoned: &mut u64) {
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(was_abandoned) => *abandoned += u64::from(was_abandoned),
            Err(e) => error!(error = %e, "worker task failed"),
        }
    }
}
