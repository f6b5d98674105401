// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost model, spend ledger, and stop policy for burnrate.
//!
//! This crate provides:
//! - **Usd**: fixed-point nano-dollar amounts with exact decimal parsing
//! - **Pricing**: per-token prices and linear cost calculation
//! - **Ledger**: lock-protected call and token counters shared by workers
//! - **Policy**: the budget and duration stop decision
//! - **Source**: authoritative-or-estimated spend anchoring
//! - **State**: accumulated spend persisted across restarts

pub mod estimate;
pub mod ledger;
pub mod policy;
pub mod pricing;
pub mod source;
pub mod state;
pub mod usd;

pub use estimate::{resolve_usage, ResolvedUsage};
pub use ledger::{AttemptOutcome, AttemptTicket, LedgerSnapshot, SpendLedger};
pub use policy::{check_stop, should_stop, StopCriteria, StopPolicy, StopReason};
pub use pricing::{estimate_cost, TokenPrices};
pub use source::{CostMode, CostSource};
pub use state::SpendStateFile;
pub use usd::{ParseUsdError, Usd};
