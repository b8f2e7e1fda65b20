//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Simbridge - simulation environment lifecycle controller and sensor bridge
#[derive(Parser, Debug)]
#[command(
    name = "simbridge",
    author,
    version,
    about = "Simulation environment bridge",
    long_about = "Drives a deterministic simulation environment: fixed-step clock,\n\
                  multi-rate sensors, per-step observation assembly, and QoS-governed\n\
                  republication onto a pub/sub transport for downstream consumers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SIMBRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SIMBRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run simulation episodes
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "env.toml", env = "SIMBRIDGE_CONFIG")]
    pub config: PathBuf,

    /// Override the scene family from configuration
    #[arg(long, env = "SIMBRIDGE_SCENE")]
    pub scene: Option<String>,

    /// Override the scene seed from configuration
    #[arg(long, env = "SIMBRIDGE_SEED")]
    pub seed: Option<u64>,

    /// Physics steps per episode
    #[arg(long, default_value = "1000", env = "SIMBRIDGE_STEPS")]
    pub steps: u64,

    /// Number of episodes to run
    #[arg(long, default_value = "1", env = "SIMBRIDGE_EPISODES")]
    pub episodes: u64,

    /// Run without a transport (bridge degrades to no-op)
    #[arg(long)]
    pub offline: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "SIMBRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "env.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "env.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor information
    #[arg(long)]
    pub sensors: bool,

    /// Show channel configuration
    #[arg(long)]
    pub channels: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
