pub mod list;
pub mod run;
pub mod show;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Onroad alerts - drive an alert UI with arbitrated alert state
#[derive(Debug, Parser)]
#[command(name = "onroad-alerts", version, about)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish alert, device and hardware state until interrupted
    Run {
        /// Cycle through every registered alert instead of the configured list
        #[arg(long)]
        all: bool,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Do not start the configured UI process
        #[arg(long)]
        no_ui: bool,
    },

    /// List every registered (event, type) pair
    List,

    /// Show the alert an event resolves to
    Show {
        /// Event name (e.g. "stockAeb")
        event: String,

        /// Event type (e.g. "permanent")
        event_type: String,
    },
}
