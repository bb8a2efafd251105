//! Jobtrail CLI - Command line front end for the posting tracker.
//!
//! The binary is a thin shell over this library: [`cli`] defines the
//! arguments, [`context`] loads configuration and opens the store, and
//! [`commands`] implements each subcommand against a writer.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod commands;
pub mod context;

pub use cli::{Cli, Command, ScanArgs};
pub use context::{load_config, AppContext};

use anyhow::Result;
use jobtrail_core::AppConfig;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run one command, opening the store only when the command needs it.
pub async fn run(command: Command, config: AppConfig, config_path: &Path, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Config { init } => commands::config(&config, init, config_path, out),
        command => {
            let ctx = AppContext::open(config).await?;
            run_with(command, &ctx, config_path, out).await
        }
    }
}

/// Run one command against an opened context.
pub async fn run_with(command: Command, ctx: &AppContext, config_path: &Path, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Scan(args) => {
            commands::scan(ctx, &args, out).await?;
        }
        Command::List { json } => {
            commands::list(ctx, json, out).await?;
        }
        Command::Reset => commands::reset(ctx, out).await?,
        Command::Config { init } => commands::config(&ctx.config, init, config_path, out)?,
    }
    Ok(())
}

/// Config file in use: `--config` if given, else the platform default.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(AppConfig::config_path()?),
    }
}
