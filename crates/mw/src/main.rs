//! MW CLI - Markdown wiki renderer.
//!
//! Provides commands for:
//! - `render`: Render the page for a fragment route
//! - `routes`: Show how fragment routes map to content files
//! - `plugins`: List the built-in plugins and markdown parsers

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, RoutesArgs};
use output::Output;

/// MW - Markdown wiki renderer.
#[derive(Parser)]
#[command(name = "mw", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page for a fragment route.
    Render(RenderArgs),
    /// Show the content file each fragment route maps to.
    Routes(RoutesArgs),
    /// List built-in plugins and markdown parsers.
    Plugins,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Routes(args) => args.execute(),
        Commands::Plugins => commands::plugins::execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Log filter: `--verbose` enables INFO, otherwise `RUST_LOG` applies and
/// WARN is used when it is unset, empty or invalid.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
