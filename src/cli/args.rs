//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Trading data liveness monitor
///
/// Watches per-symbol tick and quote activity markers and runs alert
/// commands when a symbol goes quiet inside its trading window.
#[derive(Parser, Debug)]
#[command(name = "tqalert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to settings file
    #[arg(short, long, global = true, env = "TQALERT_CONFIG")]
    pub config: Option<String>,

    /// Dry run mode - log alert commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitor
    Run(RunArgs),

    /// Validate a configuration record and print its rules
    Check(CheckArgs),

    /// Show the active rule and marker ages of every symbol
    Status,

    /// Mute alerts for symbols (24 hours by default)
    Mute {
        /// Symbols to mute
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Remove mutes
    Unmute {
        /// Symbols to unmute
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Ask the running monitor to fire one alert command with a test message
    Test {
        /// Position in AlertCMD, 0-based (shown as cmd#INDEX+1 in logs)
        index: usize,
    },

    /// Ask the running monitor to reload its configuration record
    Reload,

    /// Read or replace the configuration record in the store
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Tick interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run one tick and exit
    #[arg(long)]
    pub once: bool,

    /// Evaluate rules against UTC instead of local time
    #[arg(long)]
    pub utc: bool,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Read the record from a file instead of the store
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Arguments for record management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Record subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the stored record
    Get,

    /// Validate a record file, store it and signal a reload
    Set {
        /// JSON record file
        file: PathBuf,

        /// Store without signalling the running monitor
        #[arg(long)]
        no_reload: bool,
    },
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
