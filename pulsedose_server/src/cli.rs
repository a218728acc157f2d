//! CLI argument definitions.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pulsedose", version, about = "Pulse-dose dispensing controller")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/pulsedose.toml")]
    pub config: PathBuf,

    /// Override the configured listen port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Validate the config and exit without serving
    #[arg(long, action = ArgAction::SetTrue)]
    pub check: bool,
}
