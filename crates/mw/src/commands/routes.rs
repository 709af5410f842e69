//! `mw routes` command implementation.

use std::path::PathBuf;

use clap::Args;
use mw_config::Config;
use mw_site::{Route, Router};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the routes command.
#[derive(Args)]
pub(crate) struct RoutesArgs {
    /// Fragment routes to resolve, e.g. `#/guide#setup`.
    #[arg(required = true)]
    fragments: Vec<String>,

    /// Path to configuration file (default: auto-discover mw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl RoutesArgs {
    /// Execute the routes command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let router = Router::new(&config);

        for fragment in &self.fragments {
            output.emit(&format_route(&router.resolve(fragment)))?;
        }
        Ok(())
    }
}

/// One tab-separated line: path, anchor (`-` when absent), file.
fn format_route(route: &Route) -> String {
    format!(
        "{}\t{}\t{}",
        route.path,
        route.anchor.as_deref().unwrap_or("-"),
        route.file_path
    )
}
