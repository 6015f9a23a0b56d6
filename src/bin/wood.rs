//! Wood CLI Binary
//!
//! Command-line interface for comparing, syncing and invalidating deployments.

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::{error, info, warn};
use wood::cli::{Cli, RunContext};
use wood::concurrency::CancelToken;
use wood::config::ConfigLoader;
use wood::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Wood CLI starting");

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone())
        .with_context(|| format!("loading workspace {}", cli.workspace.display()))
    {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing workspace: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    };

    // First Ctrl-C stops issuing new store and CDN operations
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight operations");
            signal_token.cancel();
        }
    });

    match context.execute(&cli.command, &cancel).await {
        Ok(output) => {
            println!("{}", output.text);
            if output.failed {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", wood::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    // If --verbose is not set, disable logging
    if !cli.verbose {
        return LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
    }

    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    // Override with CLI arguments (highest priority)
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
