//! mdlive - extended Markdown to interactive HTML, with live reload.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod freshness;
mod logger;
mod markdown;
mod pipeline;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Convert { args } => cli::convert::run(args),
        Commands::Live { args } => cli::live::run(args),
    }
}
