//! CLI parse: clap types for basesync. No behavior; definitions only.

use crate::config::ConfigOverrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// basesync - keep a category/project knowledge base in step with cloud storage
#[derive(Parser, Debug)]
#[command(name = "basesync")]
#[command(about = "Reconcile a category/project knowledge base with cloud storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Local knowledge-base root (overrides BASE_PATH and config files)
    #[arg(long, global = true)]
    pub base: Option<PathBuf>,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Concurrent transfers per project
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (used when output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags that override every configuration layer.
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_path: self.base.clone(),
            workers: self.workers.map(|n| n as usize),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List categories and projects with their local/cloud presence
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compare local and cloud copies without changing anything
    Status {
        /// [CATEGORY|all] [PROJECT|all]; inferred from the current directory when omitted
        names: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Include in-sync files in the listing
        #[arg(long)]
        all_entries: bool,
    },
    /// Upload local changes to the cloud
    Save {
        /// [CATEGORY|all] [PROJECT|all]; inferred from the current directory when omitted
        names: Vec<String>,
        /// Show what would be uploaded without uploading
        #[arg(long)]
        dry_run: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Download cloud changes to the local base
    Load {
        /// [CATEGORY|all] [PROJECT|all]; inferred from the current directory when omitted
        names: Vec<String>,
        /// Show what would be downloaded without downloading
        #[arg(long)]
        dry_run: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
