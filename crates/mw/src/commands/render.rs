//! `mw render` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use mw_config::{CliSettings, Config};
use mw_fetch::{Fetcher, FsFetcher, HttpFetcher};
use mw_site::{App, PageOutcome};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Fragment route to render, e.g. `#/guide#setup`.
    #[arg(default_value = "#/")]
    fragment: String,

    /// Path to configuration file (default: auto-discover mw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site directory to read documents from (default: config file directory).
    #[arg(short, long, conflicts_with = "origin")]
    root: Option<PathBuf>,

    /// Site URL to fetch documents from instead of a local directory.
    #[arg(long, env = "MW_ORIGIN")]
    origin: Option<String>,

    /// Content base path (overrides config).
    #[arg(long)]
    base_path: Option<String>,

    /// Allow remote documents (overrides config).
    #[arg(long)]
    remote: bool,

    /// CORS proxy prefix for remote documents (overrides config).
    #[arg(long, env = "MW_CORS_PROXY_URL")]
    cors_proxy_url: Option<String>,

    /// Print only the content area instead of the whole shell.
    #[arg(long)]
    content_only: bool,

    /// Enable verbose output (page-load and plugin logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the origin URL is invalid or
    /// the application cannot start.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_path: self.base_path,
            remote_enabled: self.remote.then_some(true),
            cors_proxy_url: self.cors_proxy_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let fetcher: Arc<dyn Fetcher> = if let Some(origin) = &self.origin {
            Arc::new(HttpFetcher::with_origin(origin)?)
        } else {
            let root = site_root(self.root, config.config_path.as_deref());
            Arc::new(FsFetcher::new(root).with_remote(HttpFetcher::new()))
        };

        let mut app = App::new(config, fetcher);
        let report = app.start(&self.fragment)?;

        for (plugin, err) in report.plugins.failed() {
            output.warning(&format!("Plugin `{plugin}` failed to load: {err}"));
        }
        match report.outcome {
            PageOutcome::Rendered => {}
            PageOutcome::RenderedNotFound => {
                output.warning(&format!("Page not found: {}", self.fragment));
            }
            PageOutcome::Error => {
                output.warning(&format!("Page failed to load: {}", self.fragment));
            }
        }
        if let Some(page) = app.current_page() {
            output.highlight(&format!("{} ({})", page.title, page.file_path));
        }

        let html = if self.content_only {
            app.shell().content().html().to_owned()
        } else {
            app.shell().to_html()
        };
        output.emit(&html)?;

        let shutdown = app.shutdown();
        for (plugin, err) in &shutdown.failures {
            output.warning(&format!("Plugin `{plugin}` failed to shut down: {err}"));
        }
        Ok(())
    }
}

/// Directory documents are read from.
///
/// An explicit `--root` wins, then the directory holding the config file,
/// then the current directory.
fn site_root(root: Option<PathBuf>, config_path: Option<&Path>) -> PathBuf {
    root.or_else(|| {
        config_path
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    })
    .unwrap_or_else(|| PathBuf::from("."))
}
