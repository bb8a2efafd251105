//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use jobtrail_core::SiteId;
use std::path::PathBuf;

/// Track job postings across listing sites.
#[derive(Debug, Parser)]
#[command(name = "jobtrail", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile the job cards of a saved listing page
    Scan(ScanArgs),
    /// Print every tracked job, newest first
    List {
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Forget every tracked job
    Reset,
    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long, default_value_t = false)]
        init: bool,
    },
}

/// Arguments of `jobtrail scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Site that rendered the page
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub site: Option<SiteId>,

    /// Address the page was saved from; its host selects the site
    #[arg(long)]
    pub url: Option<String>,

    /// Saved HTML listing page
    pub file: PathBuf,

    /// Hover every card waiting for a capture, then list the records
    #[arg(long, default_value_t = false)]
    pub interact_all: bool,
}
