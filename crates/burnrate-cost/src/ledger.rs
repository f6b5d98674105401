// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory spend ledger shared by all workers.
//!
//! Every counter lives behind one mutex so a snapshot is always a consistent
//! set of values: a reader never sees `calls_ok` bumped without the matching
//! token totals. An attempt is opened with [`SpendLedger::begin_attempt`],
//! which hands back an [`AttemptTicket`], and closed by passing that ticket to
//! [`SpendLedger::record_attempt`]. The ticket cannot be cloned, so each
//! attempt is recorded at most once and `calls_ok + calls_err` never exceeds
//! `calls_sent`.

use std::sync::{Mutex, MutexGuard};

use burnrate_core::TokenUsage;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pricing::{usage_cost, TokenPrices};
use crate::usd::Usd;

/// Proof that an attempt was registered and not yet recorded.
#[derive(Debug)]
#[must_use = "an attempt ticket must be passed to record_attempt"]
pub struct AttemptTicket {
    sequence: u64,
}

impl AttemptTicket {
    /// 1-based attempt number across the whole run.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success {
        usage: TokenUsage,
        /// Usage came from a local estimate rather than the provider.
        estimated: bool,
    },
    Failure {
        throttled: bool,
    },
}

/// A consistent copy of the ledger counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub calls_sent: u64,
    pub calls_ok: u64,
    pub calls_err: u64,
    pub calls_throttled: u64,
    pub calls_estimated: u64,
    pub input_tokens_total: u64,
    pub output_tokens_total: u64,
    pub started_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            calls_sent: 0,
            calls_ok: 0,
            calls_err: 0,
            calls_throttled: 0,
            calls_estimated: 0,
            input_tokens_total: 0,
            output_tokens_total: 0,
            started_at,
        }
    }

    /// Attempts sent but not yet recorded.
    pub fn in_flight(&self) -> u64 {
        self.calls_sent
            .saturating_sub(self.calls_ok.saturating_add(self.calls_err))
    }

    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(self.input_tokens_total, self.output_tokens_total)
    }

    /// Cost of this run's recorded usage.
    pub fn cost(&self, prices: &TokenPrices) -> Usd {
        usage_cost(&self.usage(), prices)
    }
}

/// Thread-safe counters for one run.
#[derive(Debug)]
pub struct SpendLedger {
    state: Mutex<LedgerSnapshot>,
}

impl Default for SpendLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SpendLedger {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(started_at: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(LedgerSnapshot::empty(started_at)),
        }
    }

    // A panic while holding the lock cannot leave counters half-updated
    // (every update is a handful of integer adds), so a poisoned lock is
    // still safe to read.
    fn lock(&self) -> MutexGuard<'_, LedgerSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an attempt that is about to be sent.
    pub fn begin_attempt(&self) -> AttemptTicket {
        let mut state = self.lock();
        state.calls_sent = state.calls_sent.saturating_add(1);
        AttemptTicket {
            sequence: state.calls_sent,
        }
    }

    /// Close an attempt opened by [`begin_attempt`](Self::begin_attempt).
    pub fn record_attempt(&self, ticket: AttemptTicket, outcome: AttemptOutcome) {
        let AttemptTicket { sequence: _ } = ticket;
        let mut state = self.lock();
        match outcome {
            AttemptOutcome::Success { usage, estimated } => {
                state.calls_ok = state.calls_ok.saturating_add(1);
                state.input_tokens_total = state
                    .input_tokens_total
                    .saturating_add(usage.input_tokens);
                state.output_tokens_total = state
                    .output_tokens_total
                    .saturating_add(usage.output_tokens);
                if estimated {
                    state.calls_estimated = state.calls_estimated.saturating_add(1);
                }
            }
            AttemptOutcome::Failure { throttled } => {
                state.calls_err = state.calls_err.saturating_add(1);
                if throttled {
                    state.calls_throttled = state.calls_throttled.saturating_add(1);
                }
            }
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().clone()
    }
}
