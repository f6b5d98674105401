// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `burnrate config` command: print the effective merged configuration.

use burnrate_config::BurnrateConfig;
use burnrate_core::BurnrateError;

const REDACTED: &str = "<redacted>";

/// Render the configuration as TOML with secrets masked.
pub fn render_config(config: &BurnrateConfig) -> Result<String, BurnrateError> {
    let mut shown = config.clone();
    if shown.bedrock.api_key.is_some() {
        shown.bedrock.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| BurnrateError::Internal(format!("failed to serialize config: {e}")))
}
