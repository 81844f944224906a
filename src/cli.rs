//! CLI definitions for guidepost.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// guidepost CLI.
#[derive(Parser)]
#[command(name = "guidepost")]
#[command(about = "Point users at the next element on a live page")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long, env = "GUIDEPOST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Chrome remote debugging endpoint, overriding `[browser] cdp_endpoint`
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Guide the user to one element in the attached tab
    Guide {
        /// Target identifier (automation attribute, id, data-testid or name)
        identifier: String,

        /// Text shown beneath the highlight
        #[arg(short, long)]
        label: Option<String>,

        /// Click the element instead of waiting for the user
        #[arg(long)]
        auto_click: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the guidance loop for a natural-language request
    Assist {
        /// What the user wants to get done
        query: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration file
    Check {
        /// Print the effective configuration after validation
        #[arg(long)]
        print: bool,
    },
}
