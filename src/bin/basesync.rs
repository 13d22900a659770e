//! basesync CLI Binary
//!
//! Command-line interface for reconciling a local knowledge base with cloud storage.

use anyhow::Context;
use basesync::cli::{map_error, Cli, RunContext};
use basesync::config::{ConfigLoader, SyncConfig};
use basesync::logging::{init_logging, LoggingConfig};
use basesync::transfer::CancelFlag;
use clap::Parser;
use std::process;
use tracing::{error, info, warn};

fn main() {
    let cli = Cli::parse();

    let loaded = ConfigLoader::load(cli.config.as_deref(), &cli.config_overrides());
    let logging_config = build_logging_config(
        &cli,
        loaded
            .as_ref()
            .map(|config| config.logging.clone())
            .unwrap_or_default(),
    );

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match run(&cli, config) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli, config: SyncConfig) -> anyhow::Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;

    runtime.block_on(async {
        let cancel = CancelFlag::new();
        let context = match RunContext::new(&config, &cwd, cancel.clone()) {
            Ok(context) => {
                info!("CLI context initialized");
                context
            }
            Err(e) => {
                error!("Error initializing: {}", e);
                eprintln!("{}", map_error(&e));
                return Ok(1);
            }
        };

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing in-flight transfers");
                eprintln!("Interrupted: finishing transfers in progress, no new ones will start");
                cancel.cancel();
            }
        });

        match context.execute(&cli.command).await {
            Ok(output) => {
                if !output.rendered.is_empty() {
                    println!("{}", output.rendered);
                }
                Ok(output.exit_code)
            }
            Err(e) => {
                error!("Command failed: {}", e);
                eprintln!("{}", map_error(&e));
                Ok(1)
            }
        }
    })
}

/// Apply logging flags on top of the configured logging section.
/// Precedence: CLI flags override config files and environment.
fn build_logging_config(cli: &Cli, mut config: LoggingConfig) -> LoggingConfig {
    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    config
}
