// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod reading;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Fabstir Meter Reader CLI
#[derive(Parser, Debug)]
#[command(name = "meter-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Offline tools for the Fabstir meter reader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the counters in a local image through the detection backend
    Read(reading::ReadArgs),

    /// Group glyph positions into a reading without calling the backend
    Group(reading::GroupArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Read(args) => reading::read_image(args).await,
        Commands::Group(args) => reading::group(args),
    }
}

/// Load `.env` (or `env_file`) into the process environment.
///
/// Must run before `Cli::parse()` so the file feeds the `env` fallbacks of
/// the command options. Variables already set are left untouched.
pub fn load_env_file(env_file: Option<&Path>) -> Option<PathBuf> {
    match env_file {
        Some(path) => dotenv::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenv::dotenv().ok(),
    }
}
