use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::region::RegionId;

/// Datadog Alert Tracker CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "datadog-alert-tracker",
    version,
    about = "Keeps an eye on Datadog monitors that are in Alert or Warn"
)]
pub struct Cli {
    /// Polling interval in seconds
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Path of the persisted settings file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll continuously and log every badge change (default)
    Watch,
    /// Fetch once, print the alert list, and exit
    Once,
    /// Save API credentials and region
    Configure {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        app_key: String,
        /// US1, EU1, US3, US5, AP1 or GOV
        #[arg(long, default_value = "US1", value_parser = parse_region)]
        region: RegionId,
    },
    /// List supported Datadog regions
    Regions,
    /// Manage start at login
    Autostart {
        #[arg(value_enum)]
        action: AutostartAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AutostartAction {
    Enable,
    Disable,
    Status,
}

fn parse_region(value: &str) -> Result<RegionId, String> {
    value.parse()
}
