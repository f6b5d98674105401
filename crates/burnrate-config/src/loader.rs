// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./burnrate.toml` > `~/.config/burnrate/burnrate.toml` >
//! `/etc/burnrate/burnrate.toml`, with environment variable overrides via the
//! `BURNRATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BurnrateConfig;

/// System-wide config location, also the path used by the shipped systemd unit.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/burnrate/burnrate.toml";

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "burnrate.toml";

/// The user-level config path under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("burnrate").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/burnrate/burnrate.toml`
/// 3. `~/.config/burnrate/burnrate.toml`
/// 4. `./burnrate.toml`
/// 5. `BURNRATE_*` environment variables
pub fn load_config() -> Result<BurnrateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BurnrateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BurnrateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BurnrateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BurnrateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BurnrateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `BURNRATE_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `BURNRATE_BUDGET_TARGET_USD` must become `budget.target_usd`,
/// not `budget.target.usd`.
fn env_provider() -> Env {
    Env::prefixed("BURNRATE_").map(|key| map_env_key(key.as_str()).into())
}

const SECTIONS: &[&str] = &[
    "run", "bedrock", "budget", "pricing", "rate", "workload", "retry", "status", "billing",
];

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("budget_target_usd"), "budget.target_usd");
        assert_eq!(map_env_key("rate_calls_per_minute"), "rate.calls_per_minute");
        assert_eq!(map_env_key("bedrock_api_key"), "bedrock.api_key");
        assert_eq!(map_env_key("run_log_level"), "run.log_level");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[rate]
workers = 2
"#,
            )?;
            jail.set_env("BURNRATE_RATE_WORKERS", "8");
            jail.set_env("BURNRATE_BUDGET_TARGET_USD", "25.5");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.rate.workers, 8);
            assert!((config.budget.target_usd - 25.5).abs() < f64::EPSILON);
            Ok(())
        });
    }
}
