//! Headless model of the application shell.
//!
//! The shell owns the only mutable state shared between components: the
//! content area, the sidebar region and the document title. Only the page
//! pipeline and the app bootstrap write to it.

use std::collections::HashSet;
use std::sync::LazyLock;

use mw_config::{SelectorsConfig, element_id};
use mw_parser::escape_html;
use regex::Regex;

/// Placeholder rendered while a page is loading.
pub const LOADING_HTML: &str = r#"<div class="loading">Loading...</div>"#;

/// Prefix of processing-marker attributes set by plugins.
const MARKER_PREFIX: &str = "data-mw-";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])(?:\s[^>]*)?>(.*?)</h[1-6]\s*>").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove tags and decode the basic HTML entities.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Lifecycle state of the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// Placeholder shown, fetch in progress.
    Loading,
    /// Requested page rendered.
    Rendered,
    /// Not-found document rendered in place of the requested page.
    NotFound,
    /// Error message rendered.
    Error,
}

impl PageState {
    /// Lowercase name used in the rendered markup.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Rendered => "rendered",
            Self::NotFound => "not-found",
            Self::Error => "error",
        }
    }
}

/// The content subtree handed to plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentElement {
    html: String,
}

impl ContentElement {
    /// Create an empty element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element holding `html`.
    #[must_use]
    pub fn from_html(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Inner HTML.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Replace the inner HTML.
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    /// Text of the first heading of `level` (1-6), if it has any.
    #[must_use]
    pub fn first_heading_text(&self, level: u8) -> Option<String> {
        let level = level.to_string();
        HEADING_RE
            .captures_iter(&self.html)
            .filter(|caps| caps[1] == level)
            .map(|caps| html_to_text(&caps[2]).trim().to_owned())
            .find(|text| !text.is_empty())
    }

    /// Whether an element with `id` exists.
    #[must_use]
    pub fn has_element_id(&self, id: &str) -> bool {
        self.html.contains(&format!(" id=\"{}\"", escape_html(id)))
    }

    /// Attribute name of the processing marker `name`.
    ///
    /// Plugins put the marker on elements they have processed and skip
    /// marked elements on later runs.
    #[must_use]
    pub fn marker(name: &str) -> String {
        format!("{MARKER_PREFIX}{name}")
    }

    /// Whether any element carries the marker `name`.
    #[must_use]
    pub fn has_marker(&self, name: &str) -> bool {
        self.html.contains(&Self::marker(name))
    }
}

/// Application shell: app root, sidebar region and content area.
#[derive(Debug)]
pub struct Shell {
    app_id: String,
    content_id: String,
    sidebar_id: String,
    title: String,
    content: ContentElement,
    sidebar_html: String,
    sidebar_open: bool,
    scroll_target: Option<String>,
    fatal: Option<String>,
    state: PageState,
}

impl Shell {
    /// Create a shell mounted at the configured selectors.
    #[must_use]
    pub fn new(selectors: &SelectorsConfig) -> Self {
        Self {
            app_id: element_id(&selectors.app).to_owned(),
            content_id: element_id(&selectors.content).to_owned(),
            sidebar_id: element_id(&selectors.sidebar).to_owned(),
            title: String::new(),
            content: ContentElement::new(),
            sidebar_html: String::new(),
            sidebar_open: false,
            scroll_target: None,
            fatal: None,
            state: PageState::Idle,
        }
    }

    /// Check that the mount points form a usable layout.
    ///
    /// Every region needs its own non-empty id.
    pub fn create_layout(&self) -> Result<(), String> {
        let ids = [&self.app_id, &self.content_id, &self.sidebar_id];
        if let Some(empty) = ids.iter().find(|id| id.is_empty()) {
            return Err(format!("Empty element id `{empty}`"));
        }
        let unique: HashSet<_> = ids.iter().collect();
        if unique.len() != ids.len() {
            return Err(format!(
                "Layout regions must use distinct ids (app: {}, content: {}, sidebar: {})",
                self.app_id, self.content_id, self.sidebar_id
            ));
        }
        Ok(())
    }

    /// Document title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Content area.
    #[must_use]
    pub fn content(&self) -> &ContentElement {
        &self.content
    }

    /// Mutable content area.
    pub fn content_mut(&mut self) -> &mut ContentElement {
        &mut self.content
    }

    /// Sidebar markup.
    #[must_use]
    pub fn sidebar_html(&self) -> &str {
        &self.sidebar_html
    }

    /// Replace the sidebar markup.
    pub fn set_sidebar_html(&mut self, html: impl Into<String>) {
        self.sidebar_html = html.into();
    }

    /// Whether the mobile sidebar is expanded.
    #[must_use]
    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Expand or collapse the mobile sidebar.
    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    /// Element id scrolled into view after the last render.
    #[must_use]
    pub fn scroll_target(&self) -> Option<&str> {
        self.scroll_target.as_deref()
    }

    /// Scroll the element with `id` into view.
    pub fn scroll_to(&mut self, id: impl Into<String>) {
        self.scroll_target = Some(id.into());
    }

    /// Forget the scroll target.
    pub fn clear_scroll_target(&mut self) {
        self.scroll_target = None;
    }

    /// Current page state.
    #[must_use]
    pub fn state(&self) -> PageState {
        self.state
    }

    /// Set the page state.
    pub fn set_state(&mut self, state: PageState) {
        self.state = state;
    }

    /// Fatal startup message, if the app failed to start.
    #[must_use]
    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    /// Replace the whole application root with a fatal banner.
    pub fn show_fatal(&mut self, message: impl Into<String>) {
        self.fatal = Some(message.into());
    }

    /// Render the shell as a complete HTML document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let body = if let Some(message) = &self.fatal {
            format!(
                "<div id=\"{app}\"><div class=\"fatal-error\"><h1>Failed to start</h1><p>{message}</p></div></div>",
                app = self.app_id,
                message = escape_html(message),
            )
        } else {
            let sidebar_class = if self.sidebar_open {
                "sidebar open"
            } else {
                "sidebar"
            };
            let scroll = self
                .scroll_target
                .as_ref()
                .map(|id| format!(" data-scroll-to=\"{}\"", escape_html(id)))
                .unwrap_or_default();
            format!(
                "<div id=\"{app}\">\n<nav id=\"{sidebar}\" class=\"{sidebar_class}\">{sidebar_html}</nav>\n<main id=\"{content}\" data-state=\"{state}\"{scroll}>{content_html}</main>\n</div>",
                app = self.app_id,
                sidebar = self.sidebar_id,
                sidebar_html = self.sidebar_html,
                content = self.content_id,
                state = self.state.as_str(),
                content_html = self.content.html(),
            )
        };

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
            title = escape_html(&self.title),
        )
    }
}
