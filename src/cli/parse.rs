//! CLI parse: clap types for wood. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wood CLI - content-hash deployment to object stores and CDNs
#[derive(Parser)]
#[command(name = "wood")]
#[command(about = "Sync a directory to an object store and invalidate CDN caches")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fingerprint every file under a directory
    Hash {
        /// Directory to hash (default: configured source root)
        path: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compare a local directory with the store
    Compare {
        #[command(flatten)]
        target: TargetArgs,
        /// Include unchanged paths in the listing
        #[arg(long)]
        all: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the store changes and invalidation patterns a deploy would apply
    Plan {
        #[command(flatten)]
        target: TargetArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Sync the store and invalidate every configured CDN
    Deploy {
        #[command(flatten)]
        target: TargetArgs,
        /// Compute the plan without touching the store or CDNs
        #[arg(long)]
        dry_run: bool,
        /// Invalidate CDNs while the store sync is still running
        #[arg(long)]
        concurrent: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show or check the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Local directory and store shared by compare, plan and deploy
#[derive(clap::Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// Local directory to deploy (default: configured source root)
    pub local: Option<PathBuf>,
    /// Directory acting as the object store (default: configured store directory)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration
    Show {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate the merged configuration
    Validate,
}
