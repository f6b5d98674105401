// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits at the external boundaries: the inference provider and the billing source.

pub mod billing;
pub mod invoker;

pub use billing::BillingSource;
pub use invoker::InvocationClient;
