//! Application orchestrator.
//!
//! [`App`] owns every component and wires them together:
//!
//! ```text
//! start(fragment)
//!   ├── Shell::create_layout      (fatal on failure)
//!   ├── ParserManager::init       (fatal on failure, escaping fallback installed)
//!   ├── Sidebar::load             (missing sidebar is a warning)
//!   ├── PluginManager::load_plugins
//!   └── Router::init ──► PageManager::load_page
//!
//! navigate(fragment)
//!   └── Router::handle_change ──► PageManager::load_page
//! ```

use std::sync::Arc;

use mw_config::Config;
use mw_fetch::Fetcher;
use mw_parser::{ParserError, ParserManager, ParserRegistry};
use tracing::{error, info};

use crate::dom::Shell;
use crate::page::{PageEnv, PageManager, PageOutcome, RenderedPage};
use crate::plugin::{LoadReport, NotifyReport, PluginContext, PluginManager, PluginRegistry};
use crate::router::{Route, Router};
use crate::sidebar::Sidebar;
use crate::title::TitleManager;

/// Error that stops the application from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The shell layout could not be created.
    #[error("Failed to create layout: {0}")]
    Layout(String),
    /// The configured markdown parser could not be initialized.
    #[error("Failed to initialize markdown parser: {0}")]
    Parser(#[from] ParserError),
    /// [`App::start`] was called twice.
    #[error("Application already started")]
    AlreadyStarted,
}

/// Outcome of a successful start.
#[derive(Debug)]
pub struct StartReport {
    /// Per-plugin load results.
    pub plugins: LoadReport,
    /// Result of the first navigation.
    pub outcome: PageOutcome,
}

/// The markdown wiki application.
pub struct App {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    shell: Shell,
    parser: ParserManager,
    plugins: PluginManager,
    router: Router,
    sidebar: Sidebar,
    title: TitleManager,
    pages: PageManager,
    started: bool,
}

impl App {
    /// Create an application with the built-in parsers and plugins.
    #[must_use]
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let parser = parser_manager(&config, ParserRegistry::default());
        Self {
            shell: Shell::new(&config.selectors),
            plugins: PluginManager::new(PluginRegistry::default()),
            router: Router::new(&config),
            sidebar: Sidebar::new(&config),
            title: TitleManager::new(&config),
            pages: PageManager::new(),
            started: false,
            parser,
            config,
            fetcher,
        }
    }

    /// Replace the plugin registry used to resolve `plugins` names.
    #[must_use]
    pub fn with_plugin_registry(mut self, registry: PluginRegistry) -> Self {
        self.plugins = PluginManager::new(registry);
        self
    }

    /// Replace the parser registry used to resolve `markdown.parser`.
    #[must_use]
    pub fn with_parser_registry(mut self, registry: ParserRegistry) -> Self {
        self.parser = parser_manager(&self.config, registry);
        self
    }

    /// Bootstrap the application and render the page for `fragment`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] when the layout or the parser cannot be
    /// initialized. The shell then shows a fatal banner instead of the app
    /// and no navigation takes place.
    pub fn start(&mut self, fragment: &str) -> Result<StartReport, StartupError> {
        if self.started {
            return Err(StartupError::AlreadyStarted);
        }
        info!(name = %self.config.name, parser = %self.parser.name(), "Starting application");

        if let Err(message) = self.shell.create_layout() {
            return Err(self.fail(StartupError::Layout(message)));
        }
        if let Err(e) = self.parser.init() {
            return Err(self.fail(e.into()));
        }
        self.started = true;

        self.sidebar.load(self.fetcher.as_ref(), &self.config);
        self.shell.set_sidebar_html(self.sidebar.html());

        let ctx = PluginContext::new(&self.config)
            .with_router(&self.router)
            .with_sidebar(&self.sidebar)
            .with_title_manager(&self.title);
        let plugins = self.plugins.load_plugins(&self.config.plugins, &ctx);

        let route = self.router.init(fragment);
        let outcome = self.load(&route);
        Ok(StartReport { plugins, outcome })
    }

    fn fail(&mut self, err: StartupError) -> StartupError {
        error!(error = %err, "Application failed to start");
        self.shell.show_fatal(err.to_string());
        err
    }

    /// Navigate to `fragment`.
    ///
    /// Returns `None` before [`start`](Self::start) succeeded.
    pub fn navigate(&mut self, fragment: &str) -> Option<PageOutcome> {
        if !self.started {
            return None;
        }
        let route = self.router.handle_change(fragment)?;
        Some(self.load(&route))
    }

    fn load(&mut self, route: &Route) -> PageOutcome {
        let env = PageEnv {
            config: &self.config,
            fetcher: self.fetcher.as_ref(),
            parser: &self.parser,
            plugins: &mut self.plugins,
            sidebar: &mut self.sidebar,
            title: &self.title,
            shell: &mut self.shell,
        };
        self.pages.load_page(env, route)
    }

    /// Fetch the sidebar document again and keep the current link active.
    ///
    /// Returns whether the sidebar document was found.
    pub fn reload_sidebar(&mut self) -> bool {
        let found = self.sidebar.load(self.fetcher.as_ref(), &self.config);
        self.sidebar.set_active(self.router.get_current_path());
        self.shell.set_sidebar_html(self.sidebar.html());
        found
    }

    /// Open or close the sidebar.
    pub fn toggle_sidebar(&mut self) {
        let open = self.shell.is_sidebar_open();
        self.shell.set_sidebar_open(!open);
    }

    /// Notify plugins of teardown and unload them.
    pub fn shutdown(&mut self) -> NotifyReport {
        info!("Shutting down application");
        self.plugins.shutdown()
    }

    /// Whether [`start`](Self::start) succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rendered shell.
    #[must_use]
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Sidebar.
    #[must_use]
    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    /// Plugin manager.
    #[must_use]
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// Markdown parser.
    #[must_use]
    pub fn parser(&self) -> &ParserManager {
        &self.parser
    }

    /// Title manager.
    #[must_use]
    pub fn title_manager(&self) -> &TitleManager {
        &self.title
    }

    /// Page on display.
    #[must_use]
    pub fn current_page(&self) -> Option<&RenderedPage> {
        self.pages.current()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.config.name)
            .field("started", &self.started)
            .field("plugins", &self.plugins)
            .field("path", &self.router.get_current_path())
            .finish_non_exhaustive()
    }
}

fn parser_manager(config: &Config, registry: ParserRegistry) -> ParserManager {
    ParserManager::new(
        config.markdown.parser.clone(),
        config.markdown.parser_options.clone(),
        registry,
    )
}

#[cfg(test)]
mod tests {
    use mw_fetch::MockFetcher;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::PageState;

    fn app(config: Config, fetcher: MockFetcher) -> App {
        App::new(config, Arc::new(fetcher))
    }

    #[test]
    fn test_start_renders_default_page() {
        let fetcher = MockFetcher::new()
            .with_document("README.md", "# Welcome")
            .with_document("_sidebar.md", "- [Home](README.md)");
        let mut app = app(Config::default(), fetcher);

        let report = app.start("").unwrap();

        assert_eq!(report.outcome, PageOutcome::Rendered);
        assert!(report.plugins.is_clean());
        assert!(app.is_started());
        assert_eq!(app.shell().title(), "Home - Wiki");
        assert!(app.shell().sidebar_html().contains("class=\"active\""));
    }

    #[test]
    fn test_start_twice() {
        let fetcher = MockFetcher::new().with_document("README.md", "# Welcome");
        let mut app = app(Config::default(), fetcher);
        app.start("").unwrap();

        let result = app.start("");

        assert!(matches!(result, Err(StartupError::AlreadyStarted)));
    }

    #[test]
    fn test_unknown_parser_is_fatal() {
        let mut config = Config::default();
        config.markdown.parser = "marked".to_owned();
        let fetcher = MockFetcher::new().with_document("README.md", "# Welcome");
        let mut app = app(config, fetcher);

        let result = app.start("");

        assert!(matches!(result, Err(StartupError::Parser(_))));
        assert!(!app.is_started());
        assert!(app.shell().fatal_error().is_some());
        assert_eq!(app.shell().state(), PageState::Idle);
        assert!(app.shell().to_html().contains("Failed to start"));
    }

    #[test]
    fn test_invalid_layout_is_fatal() {
        let mut config = Config::default();
        config.selectors.sidebar = config.selectors.content.clone();
        let mut app = app(config, MockFetcher::new());

        let result = app.start("");

        assert!(matches!(result, Err(StartupError::Layout(_))));
        assert!(app.navigate("#/guide").is_none());
    }

    #[test]
    fn test_navigate_before_start() {
        let mut app = app(Config::default(), MockFetcher::new());

        assert_eq!(app.navigate("#/guide"), None);
    }

    #[test]
    fn test_navigate() {
        let fetcher = MockFetcher::new()
            .with_document("README.md", "# Welcome")
            .with_document("guide.md", "# Guide");
        let mut app = app(Config::default(), fetcher);
        app.start("").unwrap();

        let outcome = app.navigate("#/guide");

        assert_eq!(outcome, Some(PageOutcome::Rendered));
        assert_eq!(app.router().get_current_path(), "/guide");
        assert_eq!(app.current_page().unwrap().file_path, "guide.md");
    }

    #[test]
    fn test_reload_sidebar_keeps_active_link() {
        let fetcher = MockFetcher::new()
            .with_document("README.md", "# Welcome")
            .with_document("guide.md", "# Guide");
        let mut app = App::new(Config::default(), Arc::new(fetcher));
        app.start("#/guide").unwrap();

        assert!(!app.reload_sidebar());
        assert_eq!(app.sidebar().active(), Some("/guide"));
    }

    #[test]
    fn test_toggle_sidebar() {
        let mut app = app(Config::default(), MockFetcher::new());

        app.toggle_sidebar();
        assert!(app.shell().is_sidebar_open());
        app.toggle_sidebar();
        assert!(!app.shell().is_sidebar_open());
    }

    #[test]
    fn test_shutdown_unloads_plugins() {
        let fetcher = MockFetcher::new().with_document("README.md", "# Welcome");
        let mut app = app(Config::default(), fetcher);
        app.start("").unwrap();
        assert_eq!(app.plugins().len(), 1);

        app.shutdown();

        assert!(app.plugins().is_empty());
    }
}
