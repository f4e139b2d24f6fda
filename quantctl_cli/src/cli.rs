//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "quantctl", version, about = "Bioelectric therapy controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/quantctl_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a multi-step stimulation protocol from a TOML file
    RunProtocol {
        /// Path to the protocol TOML file
        #[arg(long, value_name = "FILE")]
        protocol: PathBuf,
        /// Required confirmation key, e.g. `--confirm isolation_verified` (repeatable)
        #[arg(long = "confirm", value_name = "KEY", action = ArgAction::Append)]
        confirmations: Vec<String>,
        /// Patient chart flag as `key=value`, e.g. `--patient-flag pacemaker=false` (repeatable)
        #[arg(long = "patient-flag", value_name = "KEY=VALUE", action = ArgAction::Append)]
        patient_flags: Vec<String>,
    },
    /// Sweep a catalog of frequencies and rank them against a captured baseline
    Assess {
        /// Path to a frequency catalog CSV (`frequency_hz,label`)
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,
        /// Label recorded for this assessment run
        #[arg(long, value_name = "NAME", default_value = "assessment")]
        name: String,
        /// Required confirmation key (repeatable)
        #[arg(long = "confirm", value_name = "KEY", action = ArgAction::Append)]
        confirmations: Vec<String>,
        /// Patient chart flag as `key=value` (repeatable)
        #[arg(long = "patient-flag", value_name = "KEY=VALUE", action = ArgAction::Append)]
        patient_flags: Vec<String>,
    },
    /// Quick connectivity check against the configured generator/scope
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
