//! Allowguard CLI - offline payload classification and configuration tools.
//!
//! Classifies a transaction or signing payload exactly as the guard would
//! in the browser, and shows the effective layered configuration.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config_bridge;
mod theme;

use allowguard_config::{GuardConfig, ResolvedConfig, ShowFormat};
use commands::{classify, config};

/// Allowguard - approval and signature guard for web3 wallets
#[derive(Parser)]
#[command(name = "allowguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file merged over the defaults and the user file
    #[arg(long, global = true, env = "ALLOWGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a payload without sending it anywhere
    Classify {
        #[command(subcommand)]
        command: ClassifyCommands,
    },

    /// View and check configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ClassifyCommands {
    /// Classify an `eth_sendTransaction` payload
    Tx {
        /// Contract being called
        #[arg(long)]
        to: String,
        /// Sending account
        #[arg(long)]
        from: Option<String>,
        /// Hex call data
        #[arg(long)]
        data: Option<String>,
        /// Native value, hex quantity
        #[arg(long)]
        value: Option<String>,
    },
    /// Classify a signing call
    Sig {
        /// JSON-RPC method, e.g. `eth_signTypedData_v4`
        #[arg(long)]
        method: String,
        /// The call's params as JSON
        #[arg(long)]
        params: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
        format: OutputFormat,
    },
    /// Validate the configuration and print the settings it produces
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Toml,
    Json,
}

impl From<OutputFormat> for ShowFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Toml => Self::Toml,
            OutputFormat::Json => Self::Json,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let resolved = load_config(cli.config.as_deref())?;

    let mut log_config = allowguard_telemetry::LogConfig::from(&resolved.config.logging);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = allowguard_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
    tracing::debug!(files = ?resolved.loaded_files, "configuration loaded");

    match cli.command {
        Commands::Classify { command } => handle_classify(command, &resolved.config),
        Commands::Config { command } => {
            handle_config(command, &resolved)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<ResolvedConfig> {
    GuardConfig::load(explicit).with_context(|| match explicit {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "failed to load configuration".to_owned(),
    })
}

fn handle_classify(command: ClassifyCommands, config: &GuardConfig) -> Result<ExitCode> {
    let classifier = config_bridge::classifier(config)?;
    let verdict = match command {
        ClassifyCommands::Tx {
            to,
            from,
            data,
            value,
        } => classify::transaction(&classifier, to, from, data, value),
        ClassifyCommands::Sig { method, params } => {
            classify::signature(&classifier, &method, &params)?
        },
    };
    classify::report(&verdict)
}

fn handle_config(command: ConfigCommands, resolved: &ResolvedConfig) -> Result<()> {
    match command {
        ConfigCommands::Show { format } => config::show(resolved, format.into()),
        ConfigCommands::Check => config::check(resolved),
    }
}
