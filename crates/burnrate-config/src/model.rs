// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for burnrate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is a
//! startup error rather than a silently ignored budget setting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level burnrate configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BurnrateConfig {
    /// Process-level settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Amazon Bedrock endpoint and model.
    #[serde(default)]
    pub bedrock: BedrockConfig,

    /// Spend target and stop criteria.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Unit prices used for local cost estimation.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Call pacing and worker count.
    #[serde(default)]
    pub rate: RateConfig,

    /// Prompt shape.
    #[serde(default)]
    pub workload: WorkloadConfig,

    /// Backoff after transient failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Periodic status output.
    #[serde(default)]
    pub status: StatusConfig,

    /// Authoritative billing lookup.
    #[serde(default)]
    pub billing: BillingConfig,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long to wait for in-flight calls after a stop before abandoning them.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Amazon Bedrock configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockConfig {
    /// Model identifier or inference profile ID.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// AWS region hosting the runtime endpoint.
    #[serde(default = "default_region")]
    pub region: String,

    /// Override for the runtime endpoint (defaults to the regional endpoint).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bedrock API key. `None` falls back to `AWS_BEARER_TOKEN_BEDROCK`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            region: default_region(),
            endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BedrockConfig {
    /// The runtime endpoint, regional unless overridden.
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

fn default_model_id() -> String {
    "anthropic.claude-3-haiku-20240307-v1:0".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Spend target and stop criteria.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Spend the run is allowed to approach, in USD.
    #[serde(default = "default_target_usd")]
    pub target_usd: f64,

    /// Fraction of the target used as the stop trigger, leaving overshoot headroom.
    #[serde(default = "default_stop_ratio")]
    pub stop_ratio: f64,

    /// Wall-clock limit for the run. `None` means no time limit.
    #[serde(default)]
    pub max_duration_secs: Option<u64>,

    /// File holding accumulated spend across restarts. `None` disables persistence.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            target_usd: default_target_usd(),
            stop_ratio: default_stop_ratio(),
            max_duration_secs: None,
            state_file: None,
        }
    }
}

fn default_target_usd() -> f64 {
    10.0
}

fn default_stop_ratio() -> f64 {
    0.9
}

/// Unit prices in USD per 1 000 tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    #[serde(default = "default_input_price")]
    pub input_per_1k_usd: f64,

    #[serde(default = "default_output_price")]
    pub output_per_1k_usd: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_1k_usd: default_input_price(),
            output_per_1k_usd: default_output_price(),
        }
    }
}

// Claude 3 Haiku on-demand pricing.
fn default_input_price() -> f64 {
    0.00025
}

fn default_output_price() -> f64 {
    0.00125
}

/// Call pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateConfig {
    /// Total call attempts per minute across all workers.
    #[serde(default = "default_calls_per_minute")]
    pub calls_per_minute: u32,

    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            calls_per_minute: default_calls_per_minute(),
            workers: default_workers(),
        }
    }
}

fn default_calls_per_minute() -> u32 {
    60
}

fn default_workers() -> usize {
    4
}

/// Prompt shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Seed text for the prompt. `None` uses a built-in prompt.
    #[serde(default)]
    pub prompt: Option<String>,

    /// Approximate input size per call, in tokens.
    #[serde(default = "default_avg_input_tokens")]
    pub avg_input_tokens: u32,

    /// Output budget per call, sent as the max-tokens limit.
    #[serde(default = "default_avg_output_tokens")]
    pub avg_output_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            avg_input_tokens: default_avg_input_tokens(),
            avg_output_tokens: default_avg_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_avg_input_tokens() -> u32 {
    1000
}

fn default_avg_output_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

/// Backoff after transient failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Consecutive transient failures before a worker gives up on an attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

/// How status snapshots are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFormat {
    /// Structured `tracing` event.
    #[default]
    Log,
    /// One JSON object per line on stdout.
    Json,
}

/// Periodic status output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    #[serde(default = "default_status_interval_secs")]
    pub interval_secs: u64,

    #[serde(default)]
    pub format: StatusFormat,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_status_interval_secs(),
            format: StatusFormat::default(),
        }
    }
}

fn default_status_interval_secs() -> u64 {
    30
}

/// Authoritative billing lookup via AWS Cost Explorer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Cost Explorer SERVICE dimension to filter on.
    #[serde(default = "default_billing_service")]
    pub service: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: default_poll_interval_secs(),
            service: default_billing_service(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_billing_service() -> String {
    "Amazon Bedrock".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_endpoint_by_default() {
        let config = BedrockConfig {
            region: "eu-west-3".into(),
            ..BedrockConfig::default()
        };
        assert_eq!(
            config.resolved_endpoint(),
            "https://bedrock-runtime.eu-west-3.amazonaws.com"
        );
    }

    #[test]
    fn endpoint_override_trims_trailing_slash() {
        let config = BedrockConfig {
            endpoint: Some("http://localhost:9000/".into()),
            ..BedrockConfig::default()
        };
        assert_eq!(config.resolved_endpoint(), "http://localhost:9000");
    }

    #[test]
    fn status_format_parses_lowercase() {
        let config: StatusConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, StatusFormat::Json);
        assert_eq!(config.interval_secs, 30);
    }

    #[test]
    fn budget_defaults_leave_headroom() {
        let budget = BudgetConfig::default();
        assert!(budget.stop_ratio < 1.0);
        assert!(budget.max_duration_secs.is_none());
        assert!(budget.state_file.is_none());
    }
}
