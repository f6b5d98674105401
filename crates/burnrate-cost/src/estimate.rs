// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-count fallback for responses that carry no usage data.

use burnrate_core::{InvocationRequest, InvocationResponse, TokenUsage};

/// Rough characters-per-token ratio for English text.
pub const CHARS_PER_TOKEN: u64 = 4;

/// Share of `max_output_tokens` assumed when the response text is empty,
/// as (numerator, denominator).
const EMPTY_OUTPUT_FRACTION: (u64, u64) = (3, 4);

/// Usage for one successful call plus whether it was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedUsage {
    pub usage: TokenUsage,
    pub estimated: bool,
}

/// Approximate token count of `text`, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Provider-reported usage when present, otherwise a character-based estimate.
pub fn resolve_usage(request: &InvocationRequest, response: &InvocationResponse) -> ResolvedUsage {
    if let Some(usage) = response.usage {
        return ResolvedUsage {
            usage,
            estimated: false,
        };
    }

    let input_tokens = estimate_tokens(&request.prompt);
    let output_tokens = if response.text.is_empty() {
        let (num, den) = EMPTY_OUTPUT_FRACTION;
        u64::from(request.max_output_tokens) * num / den
    } else {
        estimate_tokens(&response.text)
    };

    ResolvedUsage {
        usage: TokenUsage::new(input_tokens, output_tokens),
        estimated: true,
    }
}
