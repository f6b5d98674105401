// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The budget-governed invocation loop.
//!
//! A fixed number of workers share one [`RateLimiter`], one
//! [`SpendLedger`](burnrate_cost::SpendLedger), and one
//! [`StopPolicy`](burnrate_cost::StopPolicy). The [`WorkerPool`] supervisor
//! owns shutdown: it turns signals, deadlines, and stop decisions into a
//! drained pool and a [`RunSummary`].

pub mod backoff;
pub mod billing;
pub mod pool;
pub mod rate_limit;
pub mod shutdown;
pub mod status;
pub mod worker;
pub mod workload;

pub use backoff::RetryPolicy;
pub use billing::{poll_billing, resolve_cost_source};
pub use pool::{PoolSettings, RunSummary, WorkerPool, EXIT_OK, EXIT_PERMANENT_ERROR};
pub use rate_limit::RateLimiter;
pub use shutdown::install_signal_handler;
pub use status::{StatusReport, StatusReporter};
pub use worker::{StopSignal, WorkerState, WorkerStates};
pub use workload::WorkloadPrompt;
