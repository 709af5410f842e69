//! Page-load pipeline.
//!
//! [`PageManager::load_page`] runs one navigation from placeholder to
//! rendered page:
//!
//! 1. show the loading placeholder
//! 2. fetch the document (remote documents only when enabled, through the
//!    CORS proxy when configured)
//! 3. rewrite relative references of remote documents
//! 4. parse, render, update the title, notify plugins and highlight the
//!    sidebar link
//! 5. scroll to the requested anchor
//!
//! A document that cannot be fetched is replaced by the configured not-found
//! document; if that fails too, or anything else fails, an error message is
//! rendered in the content area.

use mw_config::Config;
use mw_fetch::{FetchError, Fetcher, is_absolute_url, proxied_url, resolve_path};
use mw_parser::{ParserError, ParserManager, escape_html};
use tracing::{debug, info, warn};

use crate::dom::{LOADING_HTML, PageState, Shell};
use crate::links::rewrite_remote_links;
use crate::plugin::{HookEvent, PluginManager};
use crate::router::Route;
use crate::sidebar::Sidebar;
use crate::title::TitleManager;

/// Page load error.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Remote document requested while remote loading is disabled.
    #[error("Remote documents are disabled: {0}")]
    RemoteDisabled(String),
    /// Document could not be obtained.
    #[error("Document not found: {0}")]
    NotFound(#[source] FetchError),
    /// Document was obtained but could not be read.
    #[error("Failed to load document: {0}")]
    Fetch(#[source] FetchError),
    /// Markdown could not be converted.
    #[error("Failed to render document: {0}")]
    Parse(#[from] ParserError),
}

impl PageError {
    fn from_fetch(err: FetchError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err)
        } else {
            Self::Fetch(err)
        }
    }

    /// Whether the not-found document should be shown instead.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RemoteDisabled(_) | Self::NotFound(_))
    }
}

/// Result of one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The requested document was rendered.
    Rendered,
    /// The not-found document was rendered instead.
    RenderedNotFound,
    /// An error message was rendered.
    Error,
}

/// The page currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Load sequence number.
    pub sequence: u64,
    /// Navigation path without anchor.
    pub path: String,
    /// Document actually rendered (the not-found document on fallback).
    pub file_path: String,
    /// Markdown source after link rewriting.
    pub markdown: String,
    /// Page title before formatting.
    pub title: String,
}

/// Components a page load reads and writes.
pub struct PageEnv<'a> {
    /// Application configuration.
    pub config: &'a Config,
    /// Document source.
    pub fetcher: &'a dyn Fetcher,
    /// Initialized markdown parser.
    pub parser: &'a ParserManager,
    /// Plugins notified after render.
    pub plugins: &'a mut PluginManager,
    /// Sidebar whose active link follows the page.
    pub sidebar: &'a mut Sidebar,
    /// Title resolution.
    pub title: &'a TitleManager,
    /// Shell rendered into.
    pub shell: &'a mut Shell,
}

/// Runs page loads and remembers the page on display.
#[derive(Debug, Default)]
pub struct PageManager {
    sequence: u64,
    current: Option<RenderedPage>,
}

impl PageManager {
    /// Create a page manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of page loads started so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Page on display, `None` while loading or after an error.
    #[must_use]
    pub fn current(&self) -> Option<&RenderedPage> {
        self.current.as_ref()
    }

    /// Load and render `route`.
    pub fn load_page(&mut self, mut env: PageEnv<'_>, route: &Route) -> PageOutcome {
        self.sequence += 1;
        let sequence = self.sequence;
        info!(sequence, path = %route.path, file = %route.file_path, "Loading page");

        self.current = None;
        env.shell.set_state(PageState::Loading);
        env.shell.content_mut().set_html(LOADING_HTML);
        env.shell.clear_scroll_target();

        let result = fetch_document(&env, &route.file_path)
            .and_then(|markdown| render(&mut env, markdown, &route.file_path, route));

        match result {
            Ok(page) => {
                env.shell.set_state(PageState::Rendered);
                debug!(sequence, title = %page.title, "Page rendered");
                self.current = Some(RenderedPage { sequence, ..page });
                PageOutcome::Rendered
            }
            Err(e) if e.is_not_found() => {
                warn!(sequence, path = %route.path, error = %e, "Page not found");
                self.load_not_found(&mut env, route, sequence)
            }
            Err(e) => {
                warn!(sequence, path = %route.path, error = %e, "Page failed to load");
                show_error(&mut env, "Error loading page", &e.to_string())
            }
        }
    }

    fn load_not_found(
        &mut self,
        env: &mut PageEnv<'_>,
        route: &Route,
        sequence: u64,
    ) -> PageOutcome {
        let config = env.config;
        let file_path = &config.files.not_found_page;
        let location = resolve_path(&config.base_path, file_path);

        let result = env
            .fetcher
            .fetch(&location)
            .map_err(PageError::from_fetch)
            .and_then(|markdown| render(env, markdown, file_path, route));

        match result {
            Ok(page) => {
                env.shell.set_state(PageState::NotFound);
                self.current = Some(RenderedPage { sequence, ..page });
                PageOutcome::RenderedNotFound
            }
            Err(e) => {
                warn!(sequence, location = %location, error = %e, "Not-found document unavailable");
                show_error(
                    env,
                    "Page not found",
                    "The requested page does not exist or could not be loaded.",
                )
            }
        }
    }
}

/// Fetch the markdown for `file_path`.
fn fetch_document(env: &PageEnv<'_>, file_path: &str) -> Result<String, PageError> {
    let config = env.config;
    if !is_absolute_url(file_path) {
        let location = resolve_path(&config.base_path, file_path);
        return env
            .fetcher
            .fetch(&location)
            .map_err(PageError::from_fetch);
    }

    if !config.remote.enabled {
        return Err(PageError::RemoteDisabled(file_path.to_owned()));
    }
    let location = proxied_url(file_path, config.remote.cors_proxy_url.as_deref());
    let markdown = env
        .fetcher
        .fetch(&location)
        .map_err(PageError::from_fetch)?;
    Ok(rewrite_remote_links(&markdown, file_path))
}

/// Render `markdown` into the shell and run the post-render steps.
fn render(
    env: &mut PageEnv<'_>,
    markdown: String,
    file_path: &str,
    route: &Route,
) -> Result<RenderedPage, PageError> {
    let html = env.parser.parse(&markdown)?;
    env.shell.content_mut().set_html(html);

    let title = env
        .title
        .update_title(env.shell, &route.path, file_path, env.sidebar.links());

    env.plugins
        .notify(HookEvent::PageLoad(env.shell.content_mut()));

    env.sidebar.set_active(&route.path);
    env.shell.set_sidebar_html(env.sidebar.html());
    env.shell.set_sidebar_open(false);

    if let Some(anchor) = &route.anchor {
        if env.shell.content().has_element_id(anchor) {
            env.shell.scroll_to(anchor.clone());
        } else {
            debug!(anchor = %anchor, "Anchor not found in page");
        }
    }

    Ok(RenderedPage {
        sequence: 0,
        path: route.path.clone(),
        file_path: file_path.to_owned(),
        markdown,
        title,
    })
}

/// Render an error message into the content area.
fn show_error(env: &mut PageEnv<'_>, heading: &str, detail: &str) -> PageOutcome {
    env.shell.content_mut().set_html(format!(
        "<div class=\"error\"><h1>{}</h1><p>{}</p></div>",
        escape_html(heading),
        escape_html(detail)
    ));
    env.shell.set_state(PageState::Error);
    PageOutcome::Error
}

#[cfg(test)]
mod tests {
    use mw_fetch::MockFetcher;
    use mw_parser::{ParserOptions, ParserRegistry};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::plugin::{PluginContext, PluginRegistry};
    use crate::router::{Router, encode_remote_path};

    /// Components of a page load, owned for the duration of a test.
    struct Fixture {
        config: Config,
        fetcher: MockFetcher,
        parser: ParserManager,
        plugins: PluginManager,
        sidebar: Sidebar,
        title: TitleManager,
        shell: Shell,
        pages: PageManager,
    }

    impl Fixture {
        fn new(config: Config, fetcher: MockFetcher) -> Self {
            let mut parser = ParserManager::new("gfm", ParserOptions::new(), ParserRegistry::default());
            parser.init().unwrap();
            let mut plugins = PluginManager::new(PluginRegistry::default());
            plugins.load_plugins(&config.plugins, &PluginContext::new(&config));
            Self {
                sidebar: Sidebar::new(&config),
                title: TitleManager::new(&config),
                shell: Shell::new(&config.selectors),
                pages: PageManager::new(),
                config,
                fetcher,
                parser,
                plugins,
            }
        }

        fn load(&mut self, fragment: &str) -> PageOutcome {
            let route = Router::new(&self.config).resolve(fragment);
            let env = PageEnv {
                config: &self.config,
                fetcher: &self.fetcher,
                parser: &self.parser,
                plugins: &mut self.plugins,
                sidebar: &mut self.sidebar,
                title: &self.title,
                shell: &mut self.shell,
            };
            self.pages.load_page(env, &route)
        }
    }

    fn remote_config() -> Config {
        let mut config = Config::default();
        config.remote.enabled = true;
        config
    }

    #[test]
    fn test_load_local_page() {
        let fetcher = MockFetcher::new().with_document("guide.md", "# Guide\n\n## Setup");
        let mut fixture = Fixture::new(Config::default(), fetcher);

        let outcome = fixture.load("#/guide#setup");

        assert_eq!(outcome, PageOutcome::Rendered);
        assert_eq!(fixture.shell.state(), PageState::Rendered);
        assert_eq!(fixture.shell.title(), "Guide - Wiki");
        assert_eq!(fixture.shell.scroll_target(), Some("setup"));
        assert!(fixture.shell.content().has_element_id("guide"));
        let page = fixture.pages.current().unwrap();
        assert_eq!(page.sequence, 1);
        assert_eq!(page.file_path, "guide.md");
        assert_eq!(page.title, "Guide");
    }

    #[test]
    fn test_base_path_prefix() {
        let mut config = Config::default();
        config.base_path = "docs".to_owned();
        let fetcher = MockFetcher::new().with_document("docs/README.md", "# Home");
        let mut fixture = Fixture::new(config, fetcher);

        assert_eq!(fixture.load(""), PageOutcome::Rendered);
        assert_eq!(fixture.fetcher.requests(), vec!["docs/README.md"]);
    }

    #[test]
    fn test_missing_page_renders_not_found_document() {
        let fetcher = MockFetcher::new().with_document("404.md", "# Nothing here");
        let mut fixture = Fixture::new(Config::default(), fetcher);

        let outcome = fixture.load("#/missing");

        assert_eq!(outcome, PageOutcome::RenderedNotFound);
        assert_eq!(fixture.shell.state(), PageState::NotFound);
        assert!(fixture.shell.content().html().contains("Nothing here"));
        assert_eq!(fixture.pages.current().unwrap().file_path, "404.md");
    }

    #[test]
    fn test_server_error_is_not_found() {
        let fetcher = MockFetcher::new()
            .with_status("broken.md", 500)
            .with_document("404.md", "# Nothing here");
        let mut fixture = Fixture::new(Config::default(), fetcher);

        assert_eq!(fixture.load("#/broken"), PageOutcome::RenderedNotFound);
    }

    #[test]
    fn test_unreachable_not_found_document_shows_error() {
        let mut fixture = Fixture::new(Config::default(), MockFetcher::new());

        let outcome = fixture.load("#/missing");

        assert_eq!(outcome, PageOutcome::Error);
        assert_eq!(fixture.shell.state(), PageState::Error);
        assert!(fixture.shell.content().html().contains("<div class=\"error\">"));
        assert!(fixture.pages.current().is_none());
    }

    #[test]
    fn test_remote_disabled_fails_closed() {
        let fetcher = MockFetcher::new()
            .with_document("https://example.com/doc.md", "# Remote")
            .with_document("404.md", "# Nothing here");
        let mut fixture = Fixture::new(Config::default(), fetcher);
        let path = encode_remote_path("https://example.com/doc.md");

        let outcome = fixture.load(&format!("#{path}"));

        assert_eq!(outcome, PageOutcome::RenderedNotFound);
        assert_eq!(fixture.fetcher.request_count("https://example.com/doc.md"), 0);
    }

    #[test]
    fn test_remote_page_rewrites_links() {
        let fetcher = MockFetcher::new().with_document(
            "https://example.com/dir/doc.md",
            "# Remote\n\n[next](next.md) ![logo](logo.png)",
        );
        let mut fixture = Fixture::new(remote_config(), fetcher);
        let path = encode_remote_path("https://example.com/dir/doc.md");

        let outcome = fixture.load(&format!("#{path}"));

        assert_eq!(outcome, PageOutcome::Rendered);
        let html = fixture.shell.content().html();
        assert!(html.contains(&format!(
            "href=\"#{}\"",
            encode_remote_path("https://example.com/dir/next.md")
        )));
        assert!(html.contains("src=\"https://example.com/dir/logo.png\""));
    }

    #[test]
    fn test_remote_page_through_proxy() {
        let mut config = remote_config();
        config.remote.cors_proxy_url = Some("https://proxy.example.com/?".to_owned());
        let fetcher = MockFetcher::new().with_document(
            "https://proxy.example.com/?https://example.com/doc.md",
            "# Proxied",
        );
        let mut fixture = Fixture::new(config, fetcher);
        let path = encode_remote_path("https://example.com/doc.md");

        assert_eq!(fixture.load(&format!("#{path}")), PageOutcome::Rendered);
        assert_eq!(fixture.shell.title(), "Proxied - Wiki");
    }

    #[test]
    fn test_invalid_utf8_is_generic_error() {
        struct Undecodable;

        impl Fetcher for Undecodable {
            fn fetch(&self, location: &str) -> Result<String, FetchError> {
                Err(FetchError::new(mw_fetch::FetchErrorKind::Decode, location))
            }
        }

        let config = Config::default();
        let mut parser = ParserManager::new("gfm", ParserOptions::new(), ParserRegistry::default());
        parser.init().unwrap();
        let mut plugins = PluginManager::new(PluginRegistry::new());
        let mut sidebar = Sidebar::new(&config);
        let title = TitleManager::new(&config);
        let mut shell = Shell::new(&config.selectors);
        let route = Router::new(&config).resolve("#/guide");

        let outcome = PageManager::new().load_page(
            PageEnv {
                config: &config,
                fetcher: &Undecodable,
                parser: &parser,
                plugins: &mut plugins,
                sidebar: &mut sidebar,
                title: &title,
                shell: &mut shell,
            },
            &route,
        );

        assert_eq!(outcome, PageOutcome::Error);
        assert!(shell.content().html().contains("Error loading page"));
    }

    #[test]
    fn test_sidebar_follows_page_and_collapses() {
        let fetcher = MockFetcher::new().with_document("guide.md", "# Guide");
        let mut fixture = Fixture::new(Config::default(), fetcher);
        fixture.sidebar.set_markdown("- [Guide](guide.md)\n- [Home](README.md)");
        fixture.shell.set_sidebar_open(true);

        fixture.load("#/guide#intro");

        assert_eq!(fixture.sidebar.active(), Some("/guide"));
        assert!(fixture.shell.sidebar_html().contains("class=\"active\">Guide</a>"));
        assert!(!fixture.shell.is_sidebar_open());
        assert_eq!(fixture.shell.scroll_target(), None);
    }

    #[test]
    fn test_sequence_increments() {
        let fetcher = MockFetcher::new()
            .with_document("a.md", "# A")
            .with_document("b.md", "# B");
        let mut fixture = Fixture::new(Config::default(), fetcher);

        fixture.load("#/a");
        fixture.load("#/b");

        assert_eq!(fixture.pages.sequence(), 2);
        assert_eq!(fixture.pages.current().unwrap().sequence, 2);
        assert_eq!(fixture.shell.title(), "B - Wiki");
    }
}
