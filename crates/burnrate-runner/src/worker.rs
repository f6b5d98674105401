// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-worker invocation loop.
//!
//! Each iteration checks the stop policy, waits for a rate-limiter slot,
//! checks again (the wait can be long and other workers may have pushed
//! spend over the cap meanwhile), then sends one call and records it.
//! Waiting for a slot or sleeping in backoff ends as soon as the stop token
//! fires. A call already sent is only abandoned when the abort token fires
//! after the shutdown grace period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use burnrate_core::InvocationClient;
use burnrate_cost::pricing::usage_cost;
use burnrate_cost::{resolve_usage, AttemptOutcome, SpendLedger, SpendStateFile, StopPolicy, StopReason};
use serde::Serialize;
use strum::Display;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::RetryPolicy;
use crate::rate_limit::RateLimiter;
use crate::workload::WorkloadPrompt;

/// What a worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    WaitingForSlot,
    Calling,
    Recording,
    Stopped,
}

/// State of every worker, indexed by worker id.
#[derive(Debug)]
pub struct WorkerStates {
    states: Mutex<Vec<WorkerState>>,
}

impl WorkerStates {
    pub fn new(workers: usize) -> Self {
        Self {
            states: Mutex::new(vec![WorkerState::Idle; workers]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WorkerState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, id: usize, state: WorkerState) {
        if let Some(slot) = self.lock().get_mut(id) {
            *slot = state;
        }
    }

    pub fn snapshot(&self) -> Vec<WorkerState> {
        self.lock().clone()
    }

    pub fn count(&self, state: WorkerState) -> usize {
        self.lock().iter().filter(|s| **s == state).count()
    }
}

/// Records the first stop reason and cancels the stop token.
#[derive(Debug)]
pub struct StopSignal {
    reason: Mutex<Option<StopReason>>,
    token: CancellationToken,
}

impl StopSignal {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            reason: Mutex::new(None),
            token,
        }
    }

    /// Returns `true` if this call set the reason. Later reasons are ignored.
    pub fn trigger(&self, reason: StopReason) -> bool {
        let mut current = self.reason.lock().unwrap_or_else(|p| p.into_inner());
        let first = current.is_none();
        if first {
            info!(reason = %reason, "stop triggered");
            *current = Some(reason);
        }
        drop(current);
        self.token.cancel();
        first
    }

    pub fn reason(&self) -> Option<StopReason> {
        self.reason
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Everything the workers share.
pub(crate) struct WorkerShared {
    pub client: Arc<dyn InvocationClient>,
    pub ledger: Arc<SpendLedger>,
    pub limiter: Arc<RateLimiter>,
    pub policy: StopPolicy,
    pub retry: RetryPolicy,
    pub workload: WorkloadPrompt,
    pub state_file: Option<Arc<SpendStateFile>>,
    pub states: Arc<WorkerStates>,
    pub signal: Arc<StopSignal>,
    pub abort: CancellationToken,
    pub started: Instant,
    pub usage_estimate_warned: AtomicBool,
}

impl WorkerShared {
    /// Trigger a stop if the policy says so. Returns `true` when stopped.
    fn check_stop(&self) -> bool {
        if self.signal.token().is_cancelled() {
            return true;
        }
        let snapshot = self.ledger.snapshot();
        match self.policy.evaluate(&snapshot, self.started.elapsed()) {
            Some(reason) => {
                self.signal.trigger(reason);
                true
            }
            None => false,
        }
    }
}

/// Run one worker until stopped. Returns `true` if it abandoned an in-flight call.
pub(crate) async fn run_worker(id: usize, shared: Arc<WorkerShared>) -> bool {
    let stop = shared.signal.token().clone();
    let mut consecutive_failures: u32 = 0;
    let mut abandoned = false;

    debug!(worker = id, "worker started");

    loop {
        shared.states.set(id, WorkerState::Idle);
        if shared.check_stop() {
            break;
        }

        shared.states.set(id, WorkerState::WaitingForSlot);
        if !shared.limiter.acquire_slot_cancellable(&stop).await {
            break;
        }
        if shared.check_stop() {
            break;
        }

        shared.states.set(id, WorkerState::Calling);
        let request = shared.workload.request();
        let ticket = shared.ledger.begin_attempt();
        let attempt = ticket.sequence();
        let result = tokio::select! {
            biased;
            _ = shared.abort.cancelled() => None,
            result = shared.client.invoke(request) => Some(result),
        };

        shared.states.set(id, WorkerState::Recording);
        let Some(result) = result else {
            shared
                .ledger
                .record_attempt(ticket, AttemptOutcome::Failure { throttled: false });
            warn!(worker = id, attempt, "abandoned in-flight call at shutdown");
            abandoned = true;
            break;
        };

        match result {
            Ok(response) => {
                let resolved = resolve_usage(request, &response);
                shared.ledger.record_attempt(
                    ticket,
                    AttemptOutcome::Success {
                        usage: resolved.usage,
                        estimated: resolved.estimated,
                    },
                );
                consecutive_failures = 0;
                if resolved.estimated && !shared.usage_estimate_warned.swap(true, Ordering::Relaxed) {
                    warn!(
                        worker = id,
                        input_tokens = resolved.usage.input_tokens,
                        output_tokens = resolved.usage.output_tokens,
                        "provider did not report token usage; spend is approximate (about 4 characters per token)"
                    );
                }
                debug!(
                    worker = id,
                    attempt,
                    input_tokens = resolved.usage.input_tokens,
                    output_tokens = resolved.usage.output_tokens,
                    estimated = resolved.estimated,
                    "call succeeded"
                );
                if let Some(state_file) = &shared.state_file {
                    let cost = usage_cost(&resolved.usage, shared.policy.prices());
                    if let Err(e) = state_file.add(cost).await {
                        warn!(
                            worker = id,
                            path = %state_file.path().display(),
                            error = %e,
                            "failed to persist spend"
                        );
                    }
                }
            }
            Err(error) if error.retriable() => {
                shared.ledger.record_attempt(
                    ticket,
                    AttemptOutcome::Failure {
                        throttled: error.is_throttled(),
                    },
                );
                consecutive_failures = consecutive_failures.saturating_add(1);
                let delay = shared.retry.delay(consecutive_failures - 1);
                debug!(
                    worker = id,
                    attempt,
                    kind = %error.kind,
                    error = %error.message,
                    consecutive_failures,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off"
                );
                if shared.retry.exhausted(consecutive_failures) {
                    warn!(
                        worker = id,
                        consecutive_failures,
                        kind = %error.kind,
                        "retry limit reached, resetting backoff"
                    );
                    consecutive_failures = 0;
                }
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(error) => {
                shared
                    .ledger
                    .record_attempt(ticket, AttemptOutcome::Failure { throttled: false });
                warn!(worker = id, attempt, error = %error, "permanent failure");
                shared.signal.trigger(StopReason::PermanentError {
                    message: error.to_string(),
                });
                break;
            }
        }
    }

    shared.states.set(id, WorkerState::Stopped);
    debug!(worker = id, "worker stopped");
    abandoned
}
