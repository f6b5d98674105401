// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The prompt every worker sends.

use burnrate_config::model::WorkloadConfig;
use burnrate_core::InvocationRequest;
use burnrate_cost::estimate::CHARS_PER_TOKEN;

const DEFAULT_SEED: &str = "Write a detailed, well-structured essay on the history of \
    cartography, covering early maps, navigation at sea, the age of exploration, \
    triangulation surveys, and satellite mapping. ";

/// A fixed prompt sized to roughly `avg_input_tokens`.
#[derive(Debug, Clone)]
pub struct WorkloadPrompt {
    request: InvocationRequest,
    input_tokens_hint: u64,
}

impl WorkloadPrompt {
    pub fn from_config(config: &WorkloadConfig) -> Self {
        let seed = config
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SEED);
        let target_chars = u64::from(config.avg_input_tokens) * CHARS_PER_TOKEN;
        let prompt = fill_to_length(seed, target_chars as usize);
        Self {
            input_tokens_hint: u64::from(config.avg_input_tokens)
                .max(burnrate_cost::estimate::estimate_tokens(&prompt)),
            request: InvocationRequest {
                prompt,
                max_output_tokens: config.avg_output_tokens,
                temperature: config.temperature,
            },
        }
    }

    pub fn request(&self) -> &InvocationRequest {
        &self.request
    }

    /// Expected input tokens per call, used for the overshoot bound.
    pub fn input_tokens_hint(&self) -> u64 {
        self.input_tokens_hint
    }

    pub fn max_output_tokens(&self) -> u64 {
        u64::from(self.request.max_output_tokens)
    }
}

/// Repeat `seed` until the text reaches `target_chars`, cutting at a char boundary.
///
/// A seed longer than the target is sent whole.
fn fill_to_length(seed: &str, target_chars: usize) -> String {
    let seed_chars = seed.chars().count();
    if seed_chars == 0 || seed_chars >= target_chars {
        return seed.to_string();
    }
    seed.chars().cycle().take(target_chars).collect()
}
