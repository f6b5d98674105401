// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unit prices and per-call cost calculation.
//!
//! Prices are configured in USD per 1 000 tokens and stored as integer
//! micro-dollars per 1 000 tokens. That unit is numerically equal to
//! nano-dollars per token, so a call's cost is a pair of integer
//! multiplications with no rounding step.

use burnrate_core::TokenUsage;
use serde::Serialize;

use crate::usd::Usd;

/// Input and output token prices for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenPrices {
    /// Micro-dollars per 1 000 input tokens.
    pub input_micros_per_1k: u64,
    /// Micro-dollars per 1 000 output tokens.
    pub output_micros_per_1k: u64,
}

impl TokenPrices {
    pub const fn from_micros_per_1k(input: u64, output: u64) -> Self {
        Self {
            input_micros_per_1k: input,
            output_micros_per_1k: output,
        }
    }

    /// Build from configured USD-per-1k prices, rounded to the nearest micro-dollar.
    pub fn from_usd_per_1k(input: f64, output: f64) -> Self {
        Self {
            input_micros_per_1k: usd_to_micros(input),
            output_micros_per_1k: usd_to_micros(output),
        }
    }

    pub fn input_usd_per_1k(&self) -> f64 {
        self.input_micros_per_1k as f64 / 1_000_000.0
    }

    pub fn output_usd_per_1k(&self) -> f64 {
        self.output_micros_per_1k as f64 / 1_000_000.0
    }
}

fn usd_to_micros(usd: f64) -> u64 {
    if !usd.is_finite() || usd <= 0.0 {
        return 0;
    }
    let micros = (usd * 1_000_000.0).round();
    if micros >= u64::MAX as f64 {
        u64::MAX
    } else {
        micros as u64
    }
}

/// Cost of `input_tokens` and `output_tokens` at the given prices.
///
/// Linear in both token counts and exact at nano-dollar resolution.
pub fn estimate_cost(input_tokens: u64, output_tokens: u64, prices: &TokenPrices) -> Usd {
    let input = input_tokens.saturating_mul(prices.input_micros_per_1k);
    let output = output_tokens.saturating_mul(prices.output_micros_per_1k);
    Usd::from_nanos(input.saturating_add(output))
}

/// Cost of a reported or estimated usage record.
pub fn usage_cost(usage: &TokenUsage, prices: &TokenPrices) -> Usd {
    estimate_cost(usage.input_tokens, usage.output_tokens, prices)
}
