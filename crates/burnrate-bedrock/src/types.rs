// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bedrock Converse API request/response types.
//!
//! Only the fields burnrate sends or reads are modelled; unknown response
//! fields are ignored.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// Body of `POST /model/{modelId}/converse`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    pub messages: Vec<Message>,
    pub inference_config: InferenceConfig,
}

impl ConverseRequest {
    /// A single user turn.
    pub fn user_prompt(prompt: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock {
                    text: Some(prompt.to_string()),
                }],
            }],
            inference_config: InferenceConfig {
                max_tokens,
                temperature,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// A content block. Non-text blocks (tool use, images) deserialize with `text: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

// --- Response types ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: Option<ConverseOutput>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<ConverseUsage>,
}

impl ConverseResponse {
    /// Concatenated text of every text block in the reply.
    pub fn text(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.message.as_ref())
            .map(|m| {
                m.content
                    .iter()
                    .filter_map(|b| b.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverseOutput {
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(alias = "Message")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let req = ConverseRequest::user_prompt("hello", 256, 0.5);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["text"], "hello");
        assert_eq!(json["inferenceConfig"]["maxTokens"], 256);
        assert_eq!(json["inferenceConfig"]["temperature"], 0.5);
    }

    #[test]
    fn response_text_joins_text_blocks() {
        let body = serde_json::json!({
            "output": {"message": {"role": "assistant", "content": [
                {"text": "Hello, "},
                {"toolUse": {"name": "x"}},
                {"text": "world"}
            ]}},
            "stopReason": "end_turn",
            "usage": {"inputTokens": 12, "outputTokens": 3, "totalTokens": 15},
            "metrics": {"latencyMs": 321}
        });
        let resp: ConverseResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.text(), "Hello, world");
        let usage = resp.usage.unwrap();
        assert_eq!(usage.input_tokens, 12);
        assert_eq!(usage.output_tokens, 3);
        assert_eq!(resp.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn response_without_usage_parses() {
        let body = serde_json::json!({"output": {"message": {"role": "assistant", "content": []}}});
        let resp: ConverseResponse = serde_json::from_value(body).unwrap();
        assert!(resp.usage.is_none());
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn error_body_accepts_either_case() {
        let lower: ApiErrorBody = serde_json::from_str(r#"{"message":"slow down"}"#).unwrap();
        let upper: ApiErrorBody = serde_json::from_str(r#"{"Message":"denied"}"#).unwrap();
        assert_eq!(lower.message, "slow down");
        assert_eq!(upper.message, "denied");
    }
}
