// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the semantic constraints serde cannot express: positive targets,
//! ratios in range, consistent retry delays.

use crate::diagnostic::ConfigError;
use crate::model::BurnrateConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &BurnrateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.bedrock.model_id.trim().is_empty() {
        fail("bedrock.model_id must not be empty".to_string());
    }
    if config.bedrock.region.trim().is_empty() {
        fail("bedrock.region must not be empty".to_string());
    }
    if config.bedrock.request_timeout_secs == 0 {
        fail("bedrock.request_timeout_secs must be at least 1".to_string());
    }

    let target = config.budget.target_usd;
    if !target.is_finite() || target <= 0.0 {
        fail(format!("budget.target_usd must be a positive amount, got {target}"));
    }

    let ratio = config.budget.stop_ratio;
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        fail(format!("budget.stop_ratio must be in (0, 1], got {ratio}"));
    }

    if config.budget.max_duration_secs == Some(0) {
        fail("budget.max_duration_secs must be at least 1 when set".to_string());
    }

    for (key, price) in [
        ("pricing.input_per_1k_usd", config.pricing.input_per_1k_usd),
        ("pricing.output_per_1k_usd", config.pricing.output_per_1k_usd),
    ] {
        if !price.is_finite() || price < 0.0 {
            fail(format!("{key} must be a non-negative amount, got {price}"));
        }
    }

    if config.rate.calls_per_minute == 0 {
        fail("rate.calls_per_minute must be at least 1".to_string());
    }
    if config.rate.workers == 0 {
        fail("rate.workers must be at least 1".to_string());
    }

    let temperature = config.workload.temperature;
    if !(0.0..=1.0).contains(&temperature) {
        fail(format!(
            "workload.temperature must be in [0, 1], got {temperature}"
        ));
    }
    if config.workload.avg_output_tokens == 0 {
        fail("workload.avg_output_tokens must be at least 1".to_string());
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        fail(format!(
            "retry.max_delay_ms ({}) must not be below retry.base_delay_ms ({})",
            config.retry.max_delay_ms, config.retry.base_delay_ms
        ));
    }

    if config.status.interval_secs == 0 {
        fail("status.interval_secs must be at least 1".to_string());
    }

    if config.billing.enabled && config.billing.poll_interval_secs == 0 {
        fail("billing.poll_interval_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
