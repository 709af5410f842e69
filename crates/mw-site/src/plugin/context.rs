//! Capability object handed to plugins during initialization.

use mw_config::Config;
use mw_fetch::resolve_path;

use crate::router::Router;
use crate::sidebar::Sidebar;
use crate::title::TitleManager;

/// What a plugin may access from its init hook.
///
/// Sibling components are optional: they are attached by the app once they
/// exist.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    config: &'a Config,
    router: Option<&'a Router>,
    sidebar: Option<&'a Sidebar>,
    title: Option<&'a TitleManager>,
}

impl<'a> PluginContext<'a> {
    /// Create a context exposing only the configuration.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            router: None,
            sidebar: None,
            title: None,
        }
    }

    /// Attach the router.
    #[must_use]
    pub fn with_router(mut self, router: &'a Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Attach the sidebar.
    #[must_use]
    pub fn with_sidebar(mut self, sidebar: &'a Sidebar) -> Self {
        self.sidebar = Some(sidebar);
        self
    }

    /// Attach the title manager.
    #[must_use]
    pub fn with_title_manager(mut self, title: &'a TitleManager) -> Self {
        self.title = Some(title);
        self
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// Resolve a resource path against the configured base path.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> String {
        resolve_path(&self.config.base_path, relative)
    }

    /// Router, if available.
    #[must_use]
    pub fn router(&self) -> Option<&'a Router> {
        self.router
    }

    /// Sidebar, if available.
    #[must_use]
    pub fn sidebar(&self) -> Option<&'a Sidebar> {
        self.sidebar
    }

    /// Title manager, if available.
    #[must_use]
    pub fn title_manager(&self) -> Option<&'a TitleManager> {
        self.title
    }
}
