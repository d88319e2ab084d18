//! CLI definitions for Hey Mic.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hey Mic CLI.
#[derive(Parser)]
#[command(name = "heymic")]
#[command(about = "Tab-scoped session and companion panel lifecycle controller")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.heymic/heymic.toml when present)
    #[arg(short, long, global = true, env = "HEYMIC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Replay a scenario against the simulated browser
    Replay {
        /// JSON array of host, request, page and fail steps
        scenario: PathBuf,

        /// Host without a docked side panel
        #[arg(long)]
        no_docked_panel: bool,
    },

    /// Report whether each URL is a restricted surface
    Classify {
        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Load and validate the configuration
    Config {
        /// Only print the resolved configuration path
        #[arg(long)]
        path: bool,
    },
}
