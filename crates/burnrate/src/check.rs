// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `burnrate check` command implementation.
//!
//! Verifies everything a run needs without sending a single billable
//! request: credentials, the persisted spend file, the billing CLI, and the
//! overshoot bound implied by the configured workers and prices.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use burnrate_bedrock::{resolve_api_key, BEARER_TOKEN_ENV};
use burnrate_config::BurnrateConfig;
use burnrate_cost::{estimate_cost, CostSource, SpendStateFile, Usd};
use burnrate_runner::WorkloadPrompt;

use crate::run::stop_policy;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `burnrate check` command. Returns the number of failed checks.
pub async fn run_check(config: &BurnrateConfig, plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  burnrate check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found ({fail_count} failing).");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count
}

pub async fn collect_checks(config: &BurnrateConfig) -> Vec<CheckResult> {
    let mut results = vec![check_config(config), check_api_key(config)];
    results.push(check_state_file(config.budget.state_file.as_deref()).await);
    results.push(check_billing(config).await);
    results.push(check_overshoot(config));
    results
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Loading already succeeded; summarise what will be used.
fn check_config(config: &BurnrateConfig) -> CheckResult {
    let start = Instant::now();
    CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        format!(
            "valid ({} in {}, target ${:.2})",
            config.bedrock.model_id, config.bedrock.region, config.budget.target_usd
        ),
        start,
    )
}

fn check_api_key(config: &BurnrateConfig) -> CheckResult {
    let start = Instant::now();
    match resolve_api_key(&config.bedrock) {
        Ok(_) => {
            let origin = if config.bedrock.api_key.is_some() {
                "bedrock.api_key"
            } else {
                BEARER_TOKEN_ENV
            };
            CheckResult::new(
                "API key",
                CheckStatus::Pass,
                format!("present ({origin})"),
                start,
            )
        }
        Err(e) => CheckResult::new("API key", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_state_file(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let Some(path) = path else {
        return CheckResult::new(
            "Spend state",
            CheckStatus::Warn,
            "not configured; accumulated spend resets every run",
            start,
        );
    };

    if path.exists() {
        return match SpendStateFile::new(path).load().await {
            Ok(amount) => CheckResult::new(
                "Spend state",
                CheckStatus::Pass,
                format!("{amount} accumulated in {}", path.display()),
                start,
            ),
            Err(e) => CheckResult::new("Spend state", CheckStatus::Fail, e.to_string(), start),
        };
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match tempfile::NamedTempFile::new_in(dir) {
        Ok(_) => CheckResult::new(
            "Spend state",
            CheckStatus::Pass,
            format!("{} will be created", path.display()),
            start,
        ),
        Err(e) => CheckResult::new(
            "Spend state",
            CheckStatus::Fail,
            format!("cannot write to {}: {e}", dir.display()),
            start,
        ),
    }
}

async fn check_billing(config: &BurnrateConfig) -> CheckResult {
    let start = Instant::now();
    if !config.billing.enabled {
        return CheckResult::new(
            "Billing",
            CheckStatus::Pass,
            "disabled; spend is estimated from token usage",
            start,
        );
    }

    match tokio::process::Command::new("aws")
        .arg("--version")
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            CheckResult::new(
                "Billing",
                CheckStatus::Pass,
                format!("aws CLI found ({})", version.trim()),
                start,
            )
        }
        Ok(output) => CheckResult::new(
            "Billing",
            CheckStatus::Fail,
            format!(
                "aws --version exited with {}",
                output.status.code().unwrap_or(-1)
            ),
            start,
        ),
        Err(e) => CheckResult::new(
            "Billing",
            CheckStatus::Fail,
            format!("aws CLI not runnable: {e}"),
            start,
        ),
    }
}

fn check_overshoot(config: &BurnrateConfig) -> CheckResult {
    let start = Instant::now();
    let policy = stop_policy(config, CostSource::estimated(Usd::ZERO));
    let workload = WorkloadPrompt::from_config(&config.workload);
    let max_call = estimate_cost(
        workload.input_tokens_hint(),
        workload.max_output_tokens(),
        policy.prices(),
    );
    let workers = config.rate.workers;
    let criteria = policy.criteria();
    let bound = criteria.worst_case_overshoot(workers, max_call);
    let message = format!(
        "cap {} + up to {} in flight ({workers} x {})",
        criteria.effective_cap(),
        bound,
        max_call
    );
    let status = if criteria.overshoot_fits(workers, max_call) {
        CheckStatus::Pass
    } else {
        CheckStatus::Warn
    };
    CheckResult::new("Overshoot bound", status, message, start)
}
