//! Clap derive structures for the `fyta-sync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fyta-sync -- mirror FYTA plant sensor data into a local state store
#[derive(Debug, Parser)]
#[command(
    name = "fyta-sync",
    version,
    about = "Mirror FYTA plant sensor data into a local state store",
    long_about = "Polls the FYTA cloud for your gardens, plants, sensors and hubs,\n\
        mirrors them into a hierarchical state tree persisted as JSON,\n\
        and caches plant images next to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Data directory for the state snapshot and cached images
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one entry per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the polling daemon until it halts or is interrupted
    Run(RunArgs),

    /// Run a single sync cycle and exit
    Once(OnceArgs),

    /// Print the stored state tree
    #[command(alias = "ls")]
    Show(ShowArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Seconds between cycles (overrides sync.poll_interval)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Wipe synced states and cached images before the first cycle
    #[arg(long)]
    pub clear_on_startup: bool,
}

#[derive(Debug, Args)]
pub struct OnceArgs {
    /// Wipe synced states and cached images before the cycle
    #[arg(long)]
    pub clear_on_startup: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Only show this subtree (e.g. "Wohnzimmer.Monstera")
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// FYTA account email
        #[arg(long)]
        email: Option<String>,

        /// Environment variable that will hold the password
        #[arg(long)]
        password_env: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,

    /// Display the effective configuration (secrets masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
