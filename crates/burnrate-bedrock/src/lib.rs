// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amazon Bedrock integrations for burnrate.
//!
//! [`BedrockClient`] sends prompts through the Converse API and
//! [`CostExplorerBilling`] reports month-to-date spend for the same account.

pub mod billing;
pub mod client;
pub mod types;

pub use billing::{parse_cost_and_usage, CostExplorerBilling};
pub use client::{classify_status, resolve_api_key, BedrockClient, BEARER_TOKEN_ENV};
