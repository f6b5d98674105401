// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing source trait for authoritative spend figures.

use async_trait::async_trait;

use crate::error::BurnrateError;

/// An authoritative source of month-to-date spend.
///
/// Amounts are returned as exact decimal strings (e.g. `"12.3456789"`) so
/// no precision is lost before they reach fixed-point accounting.
#[async_trait]
pub trait BillingSource: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Month-to-date spend in USD as a decimal string.
    async fn month_to_date(&self) -> Result<String, BurnrateError>;
}
