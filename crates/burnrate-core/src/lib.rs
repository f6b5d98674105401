// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for burnrate.
//!
//! Holds the error taxonomy, the value types passed between crates, and the
//! two external boundaries: [`InvocationClient`] and [`BillingSource`].

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BurnrateError, CallError, CallErrorKind};
pub use traits::{BillingSource, InvocationClient};
pub use types::{InvocationRequest, InvocationResponse, TokenUsage};
