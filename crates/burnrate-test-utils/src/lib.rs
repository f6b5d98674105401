// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for burnrate.
//!
//! [`MockInvoker`] stands in for the inference API and [`MockBilling`] for
//! the billing lookup, so pool and binary tests run without network access.

pub mod mock_billing;
pub mod mock_invoker;

pub use mock_billing::MockBilling;
pub use mock_invoker::{MockInvoker, MockReply};
