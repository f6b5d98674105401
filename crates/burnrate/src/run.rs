// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `burnrate run` command implementation.
//!
//! Wires configuration into a Bedrock client, a cost source, and a worker
//! pool, runs until a stop criterion fires, and prints the final summary.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use burnrate_bedrock::{BedrockClient, CostExplorerBilling};
use burnrate_config::{BurnrateConfig, StatusFormat};
use burnrate_core::{BillingSource, BurnrateError, InvocationClient};
use burnrate_cost::{CostSource, SpendStateFile, StopCriteria, StopPolicy, TokenPrices, Usd};
use burnrate_runner::{install_signal_handler, resolve_cost_source, RunSummary, WorkerPool};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Flags for `burnrate run`; each overrides the matching config key.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Bedrock model or inference profile ID.
    #[arg(long)]
    pub model: Option<String>,
    /// AWS region hosting the model.
    #[arg(long)]
    pub region: Option<String>,
    /// Override the Bedrock runtime endpoint URL.
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Total spend target in USD.
    #[arg(long)]
    pub target_usd: Option<f64>,
    /// Fraction of the target at which to stop, in (0, 1].
    #[arg(long)]
    pub stop_ratio: Option<f64>,
    /// Stop after this many seconds even if budget remains.
    #[arg(long)]
    pub max_duration_secs: Option<u64>,
    /// Global call rate across all workers.
    #[arg(long)]
    pub calls_per_minute: Option<u32>,
    /// Number of concurrent workers.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Approximate prompt size in tokens.
    #[arg(long)]
    pub avg_input_tokens: Option<u32>,
    /// Maximum output tokens requested per call.
    #[arg(long)]
    pub avg_output_tokens: Option<u32>,
    /// USD per 1 000 input tokens.
    #[arg(long)]
    pub input_price: Option<f64>,
    /// USD per 1 000 output tokens.
    #[arg(long)]
    pub output_price: Option<f64>,
    /// Persist accumulated spend across runs in this JSON file.
    #[arg(long)]
    pub state_file: Option<PathBuf>,
    /// Emit status snapshots and the final summary as JSON lines on stdout.
    #[arg(long)]
    pub json_status: bool,
}

impl RunArgs {
    /// Layer the flags over the merged configuration.
    pub fn apply(&self, config: &mut BurnrateConfig) {
        if let Some(model) = &self.model {
            config.bedrock.model_id = model.clone();
        }
        if let Some(region) = &self.region {
            config.bedrock.region = region.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.bedrock.endpoint = Some(endpoint.clone());
        }
        if let Some(target) = self.target_usd {
            config.budget.target_usd = target;
        }
        if let Some(ratio) = self.stop_ratio {
            config.budget.stop_ratio = ratio;
        }
        if let Some(secs) = self.max_duration_secs {
            config.budget.max_duration_secs = Some(secs);
        }
        if let Some(cpm) = self.calls_per_minute {
            config.rate.calls_per_minute = cpm;
        }
        if let Some(workers) = self.workers {
            config.rate.workers = workers;
        }
        if let Some(tokens) = self.avg_input_tokens {
            config.workload.avg_input_tokens = tokens;
        }
        if let Some(tokens) = self.avg_output_tokens {
            config.workload.avg_output_tokens = tokens;
        }
        if let Some(price) = self.input_price {
            config.pricing.input_per_1k_usd = price;
        }
        if let Some(price) = self.output_price {
            config.pricing.output_per_1k_usd = price;
        }
        if let Some(path) = &self.state_file {
            config.budget.state_file = Some(path.clone());
        }
        if self.json_status {
            config.status.format = StatusFormat::Json;
        }
    }
}

/// Stop criteria and prices from the `[budget]` and `[pricing]` sections.
pub fn stop_policy(config: &BurnrateConfig, source: CostSource) -> StopPolicy {
    let criteria = StopCriteria::new(
        Usd::from_f64(config.budget.target_usd),
        config.budget.stop_ratio,
        config.budget.max_duration_secs.map(Duration::from_secs),
    );
    let prices = TokenPrices::from_usd_per_1k(
        config.pricing.input_per_1k_usd,
        config.pricing.output_per_1k_usd,
    );
    StopPolicy::new(criteria, prices, Arc::new(source))
}

/// Run the `burnrate run` command against Bedrock.
pub async fn run_burn(config: BurnrateConfig) -> Result<RunSummary, BurnrateError> {
    let client: Arc<dyn InvocationClient> = Arc::new(BedrockClient::from_config(&config.bedrock)?);
    let billing: Option<Arc<dyn BillingSource>> = if config.billing.enabled {
        Some(Arc::new(CostExplorerBilling::from_config(&config.billing)))
    } else {
        None
    };
    let interrupt = install_signal_handler();
    let summary = execute(&config, client, billing, interrupt).await?;
    print_summary(&summary, config.status.format);
    Ok(summary)
}

/// Resolve the cost source, build the pool, and run it to completion.
pub async fn execute(
    config: &BurnrateConfig,
    client: Arc<dyn InvocationClient>,
    billing: Option<Arc<dyn BillingSource>>,
    interrupt: CancellationToken,
) -> Result<RunSummary, BurnrateError> {
    let state_file = config
        .budget
        .state_file
        .clone()
        .map(|path| Arc::new(SpendStateFile::new(path)));
    let source = resolve_cost_source(billing.as_deref(), state_file.as_deref()).await?;
    let policy = stop_policy(config, source);

    info!(
        client = client.name(),
        model = %config.bedrock.model_id,
        region = %config.bedrock.region,
        target = %policy.criteria().target(),
        cap = %policy.criteria().effective_cap(),
        workers = config.rate.workers,
        calls_per_minute = config.rate.calls_per_minute,
        "starting run"
    );

    let mut pool = WorkerPool::new(client, policy, config);
    if let Some(billing) = billing {
        pool = pool.with_billing(billing);
    }
    if let Some(state_file) = state_file {
        pool = pool.with_state_file(state_file);
    }
    Ok(pool.run(interrupt).await)
}

/// Structured form of the final summary, used for `--json-status`.
pub fn summary_json(summary: &RunSummary) -> serde_json::Value {
    let snapshot = &summary.snapshot;
    serde_json::json!({
        "event": "summary",
        "stop_reason": summary.reason.label(),
        "detail": summary.reason.to_string(),
        "calls_sent": snapshot.calls_sent,
        "calls_ok": snapshot.calls_ok,
        "calls_err": snapshot.calls_err,
        "calls_throttled": snapshot.calls_throttled,
        "calls_estimated": snapshot.calls_estimated,
        "abandoned": summary.abandoned,
        "input_tokens": snapshot.input_tokens_total,
        "output_tokens": snapshot.output_tokens_total,
        "run_cost_usd": summary.run_cost.as_f64(),
        "spent_usd": summary.spent.as_f64(),
        "cap_usd": summary.cap.as_f64(),
        "cost_mode": summary.cost_mode.to_string(),
        "elapsed_secs": summary.elapsed.as_secs_f64(),
        "exit_code": summary.exit_code(),
    })
}

fn print_summary(summary: &RunSummary, format: StatusFormat) {
    if format == StatusFormat::Json {
        println!("{}", summary_json(summary));
        return;
    }

    let use_color = std::io::stdout().is_terminal();
    let snapshot = &summary.snapshot;
    let reason = if use_color {
        use colored::Colorize;
        if summary.exit_code() == 0 {
            summary.reason.to_string().green().to_string()
        } else {
            summary.reason.to_string().red().to_string()
        }
    } else {
        summary.reason.to_string()
    };

    println!();
    println!("  burnrate run summary");
    println!("  {}", "-".repeat(40));
    println!("    Stopped:   {reason}");
    println!(
        "    Calls:     {} sent, {} ok, {} failed ({} throttled)",
        snapshot.calls_sent, snapshot.calls_ok, snapshot.calls_err, snapshot.calls_throttled
    );
    if snapshot.calls_estimated > 0 {
        println!(
            "    Estimated: {} calls without reported usage",
            snapshot.calls_estimated
        );
    }
    if summary.abandoned > 0 {
        println!("    Abandoned: {} in-flight calls", summary.abandoned);
    }
    println!(
        "    Tokens:    {} in / {} out",
        snapshot.input_tokens_total, snapshot.output_tokens_total
    );
    println!(
        "    Spend:     {} this run, {} total of {} cap ({})",
        summary.run_cost, summary.spent, summary.cap, summary.cost_mode
    );
    println!("    Elapsed:   {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}
