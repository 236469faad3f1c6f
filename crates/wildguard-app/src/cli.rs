use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wildguard_core::BackendMode;

#[derive(Parser)]
#[command(name = "wildguard", about = "WildGuard wildlife protection console")]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and WILDGUARD_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Backend mode: full-ai, simulated or offline
    #[arg(long, global = true)]
    pub backend_mode: Option<BackendMode>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check backend health
    Health,

    /// Latest tracked animal positions
    Positions,

    /// Known poaching hotspots
    Hotspots,

    /// AI agent status
    Agents,

    /// Run movement analysis over the latest positions
    Movement,

    /// Run the full agent pipeline once
    Orchestrate,

    /// Analytics summary (illustrative data if the backend has none)
    Analytics {
        /// Write the export document to this file instead of stdout
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Dashboard metric cards
    Dashboard,

    /// List the console's views and the bindings each one mounts
    Views,

    /// Mount a view's bindings and log every update until Ctrl-C
    Monitor {
        /// View key (unknown keys fall back to the dashboard)
        #[arg(long)]
        view: Option<String>,

        /// Start with live position tracking paused
        #[arg(long)]
        paused: bool,
    },
}
