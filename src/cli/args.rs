//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// retidy HTML post-processor CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: retidy.toml when present)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Process a single HTML document
    #[command(visible_alias = "p")]
    Process {
        /// Input file (`-` or omitted reads stdin)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: Option<PathBuf>,

        /// Output file (`-` or omitted writes stdout)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tidy: TidyArgs,
    },

    /// Serve a directory, processing HTML responses on the fly
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to serve (default: current directory)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        #[command(flatten)]
        tidy: TidyArgs,
    },
}

/// Processor arguments shared by both subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct TidyArgs {
    /// Comma-separated option names, or `all` for everything
    #[arg(short = 't', long = "options")]
    pub options: Option<String>,

    /// Formatter mode (NONE, FORMAT, COMPACT)
    #[arg(short, long)]
    pub formatter: Option<String>,
}
