//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Render extended Markdown into interactive HTML documents
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert a Markdown file, or every Markdown file of a directory
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Serve one document and reload the browser on every save
    #[command(visible_alias = "l")]
    Live {
        #[command(flatten)]
        args: LiveArgs,
    },
}

/// Convert command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Markdown file or directory
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    pub path: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Keep running and reconvert changed files
    #[arg(short, long)]
    pub watch: bool,
}

/// Live command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct LiveArgs {
    /// Markdown file to serve
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Port number to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long, default_value = "127.0.0.1")]
    pub interface: IpAddr,
}
