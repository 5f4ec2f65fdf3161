//! retidy - HTML response post-processor.

#![allow(dead_code)]

mod cli;
mod config;
mod logger;
mod tidy;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, TidyArgs};
use config::Config;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::serve::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Process {
            input,
            output,
            tidy,
        } => {
            apply_tidy_args(&mut config, tidy)?;
            cli::process::run(input.as_deref(), output.as_deref(), &config)
        }
        Commands::Serve {
            interface,
            port,
            root,
            tidy,
        } => {
            apply_tidy_args(&mut config, tidy)?;
            if let Some(interface) = interface {
                config.serve.interface = *interface;
            }
            if let Some(port) = port {
                config.serve.port = *port;
            }
            if let Some(root) = root {
                config.serve.root = root.clone();
            }
            cli::serve::run(&config)
        }
    }
}

/// CLI flags override whatever the config file resolved to.
fn apply_tidy_args(config: &mut Config, args: &TidyArgs) -> Result<()> {
    if let Some(options) = &args.options {
        config.override_options(options)?;
    }
    if let Some(formatter) = &args.formatter {
        config.override_formatter(formatter)?;
    }
    Ok(())
}
