// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! burnrate - spend a fixed Amazon Bedrock budget at a controlled rate.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod run;
mod show_config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spend a fixed Amazon Bedrock budget at a controlled rate, then stop.
#[derive(Parser, Debug)]
#[command(name = "burnrate", version, about, long_about = None)]
struct Cli {
    /// Read this file instead of the standard config locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Invoke the model until the spend cap or time limit is reached.
    Run(run::RunArgs),
    /// Verify credentials, state file, and billing access without spending.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Exit code for configuration and setup failures.
const EXIT_SETUP: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match burnrate_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            burnrate_config::render_errors(&errors);
            std::process::exit(EXIT_SETUP);
        }
    };

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            if let Err(errors) = burnrate_config::validate_config(&config) {
                burnrate_config::render_errors(&errors);
                std::process::exit(EXIT_SETUP);
            }
            init_tracing(&config.run.log_level);

            match run::run_burn(config).await {
                Ok(summary) => std::process::exit(summary.exit_code()),
                Err(e) => {
                    tracing::error!(error = %e, "run failed to start");
                    eprintln!("error: {e}");
                    std::process::exit(EXIT_SETUP);
                }
            }
        }
        Commands::Check { plain } => {
            if check::run_check(&config, plain).await > 0 {
                std::process::exit(EXIT_SETUP);
            }
        }
        Commands::Config => match show_config::render_config(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(EXIT_SETUP);
            }
        },
    }
}

/// Initialize tracing with an `EnvFilter`; `RUST_LOG` takes precedence.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("burnrate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
