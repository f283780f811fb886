//! modelurl - object URL macros for HTML content.

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use modelurl::config::{ModelUrlConfig, init_config};
use modelurl::demo::{EXAMPLE_CONFIG, Host};
use modelurl::{debug, log, logger};

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

    let config = init_config(load_config(&cli.config)?);
    let host = Host::build(&config).context("invalid mappings")?;

    match &cli.command {
        Commands::Serve { interface, port } => {
            cli::serve::run_serve(Arc::clone(&host.site), *interface, *port)
        }
        Commands::Rewrite { paths, strict } => {
            cli::rewrite::run_rewrite(paths, *strict, &host.rewriter)
        }
        Commands::Reverse { args } => cli::reverse::run_reverse(args, &host),
        Commands::Check => cli::check::run_check(&host),
    }
}

/// Load the config file, or the bundled example mappings when it is absent.
fn load_config(path: &Path) -> Result<ModelUrlConfig> {
    if path.exists() {
        debug!("config"; "loading {}", path.display());
        return ModelUrlConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()));
    }
    log!("config"; "{} not found, using the example mappings", path.display());
    Ok(ModelUrlConfig::from_str(EXAMPLE_CONFIG)?)
}
