// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the burnrate workspace.

use serde::{Deserialize, Serialize};

/// Token counts for a single invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A single prompt sent to the inference provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// What the provider returned for a successful invocation.
///
/// `usage` is `None` when the provider did not report token counts; callers
/// then fall back to a character-based estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl InvocationResponse {
    pub fn with_usage(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage: Some(usage),
        }
    }

    pub fn without_usage(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_total_saturates() {
        let usage = TokenUsage::new(u64::MAX, 10);
        assert_eq!(usage.total(), u64::MAX);
        assert_eq!(TokenUsage::new(3, 4).total(), 7);
    }

    #[test]
    fn response_constructors() {
        let with = InvocationResponse::with_usage("hi", TokenUsage::new(1, 2));
        assert_eq!(with.usage, Some(TokenUsage::new(1, 2)));
        let without = InvocationResponse::without_usage("hi");
        assert!(without.usage.is_none());
        assert_eq!(without.text, "hi");
    }

    #[test]
    fn request_serializes() {
        let req = InvocationRequest {
            prompt: "ping".into(),
            max_output_tokens: 16,
            temperature: 0.5,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: InvocationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }
}
