//! Sidebar navigation built from a markdown document.
//!
//! Links in the sidebar document are turned into hash routes and collected
//! into a [`LinkMap`] keyed by normalized path (local documents) or absolute
//! URL (remote documents). The map feeds title resolution.

use std::collections::BTreeMap;

use mw_config::Config;
use mw_fetch::{Fetcher, is_absolute_url, resolve_path};
use mw_parser::escape_html;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use tracing::{debug, warn};

use crate::router::{encode_remote_path, lookup_key, normalize_path};

/// Metadata of one sidebar link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarLink {
    /// Link text.
    pub label: String,
    /// Explicit link title (`[Label](page.md "Title")`).
    pub title: Option<String>,
}

/// Sidebar links by normalized path or remote URL.
pub type LinkMap = BTreeMap<String, SidebarLink>;

/// Where a sidebar link points.
struct Target {
    href: String,
    key: String,
}

/// Whether `dest` starts with a URI scheme such as `mailto:`.
fn has_scheme(dest: &str) -> bool {
    dest.split_once(':').is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Map a sidebar link destination to its hash route.
///
/// Returns `None` for destinations the router does not handle.
fn link_target(dest: &str, default_page: &str) -> Option<Target> {
    if is_absolute_url(dest) {
        let path = encode_remote_path(dest);
        return Some(Target {
            href: format!("#{path}"),
            key: dest.to_owned(),
        });
    }
    if has_scheme(dest) {
        return None;
    }
    if let Some(fragment) = dest.strip_prefix('#') {
        let key = normalize_path(fragment);
        return Some(Target {
            href: dest.to_owned(),
            key,
        });
    }

    let (path, anchor) = match dest.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (dest, None),
    };
    let path = path.trim_start_matches("./");
    let path = path.strip_suffix(".md").unwrap_or(path);
    let default_stem = default_page.strip_suffix(".md").unwrap_or(default_page);
    let key = if path.trim_matches('/') == default_stem {
        "/".to_owned()
    } else {
        normalize_path(path)
    };
    let href = match anchor {
        Some(anchor) => format!("#{key}#{anchor}"),
        None => format!("#{key}"),
    };
    Some(Target { href, key })
}

/// Sidebar navigation state.
#[derive(Debug, Default)]
pub struct Sidebar {
    markdown: Option<String>,
    default_page: String,
    links: LinkMap,
    active: Option<String>,
    html: String,
}

impl Sidebar {
    /// Create an empty sidebar.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_page: config.files.default_page.clone(),
            ..Self::default()
        }
    }

    /// Fetch and build the sidebar from `files.sidebar`.
    ///
    /// A missing sidebar document leaves the sidebar empty. Returns whether a
    /// document was loaded.
    pub fn load(&mut self, fetcher: &dyn Fetcher, config: &Config) -> bool {
        let location = resolve_path(&config.base_path, &config.files.sidebar);
        match fetcher.fetch(&location) {
            Ok(markdown) => {
                self.set_markdown(markdown);
                debug!(location = %location, links = self.links.len(), "Sidebar loaded");
                true
            }
            Err(e) => {
                warn!(location = %location, error = %e, "Sidebar not available");
                self.markdown = None;
                self.links.clear();
                self.html.clear();
                false
            }
        }
    }

    /// Rebuild the sidebar from markdown text.
    pub fn set_markdown(&mut self, markdown: impl Into<String>) {
        let markdown = markdown.into();
        self.links = self.collect_links(&markdown);
        self.markdown = Some(markdown);
        self.render();
    }

    fn collect_links(&self, markdown: &str) -> LinkMap {
        let mut links = LinkMap::new();
        let mut current: Option<(String, Option<String>, String)> = None;

        for event in Parser::new_ext(markdown, Options::empty()) {
            match event {
                Event::Start(Tag::Link {
                    dest_url, title, ..
                }) => {
                    current = link_target(&dest_url, &self.default_page).map(|target| {
                        let title = (!title.is_empty()).then(|| title.to_string());
                        (target.key, title, String::new())
                    });
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, label)) = current.as_mut() {
                        label.push_str(&text);
                    }
                }
                Event::End(TagEnd::Link) => {
                    if let Some((key, title, label)) = current.take() {
                        links.entry(key).or_insert(SidebarLink {
                            label: label.trim().to_owned(),
                            title,
                        });
                    }
                }
                _ => {}
            }
        }
        links
    }

    fn render(&mut self) {
        let Some(markdown) = &self.markdown else {
            self.html.clear();
            return;
        };

        let active = self.active.as_deref();
        let default_page = &self.default_page;
        let events = Parser::new_ext(markdown, Options::empty()).map(|event| {
            if let Event::Start(Tag::Link {
                dest_url, title, ..
            }) = &event
                && let Some(target) = link_target(dest_url, default_page)
            {
                let mut tag = format!("<a href=\"{}\"", escape_html(&target.href));
                if !title.is_empty() {
                    tag.push_str(&format!(" title=\"{}\"", escape_html(title)));
                }
                if active == Some(target.key.as_str()) {
                    tag.push_str(" class=\"active\"");
                }
                tag.push('>');
                return Event::InlineHtml(tag.into());
            }
            if matches!(event, Event::End(TagEnd::Link)) {
                return Event::InlineHtml("</a>".into());
            }
            event
        });

        let mut output = String::new();
        html::push_html(&mut output, events);
        self.html = output;
    }

    /// Highlight the link for `path` (anchor already removed).
    pub fn set_active(&mut self, path: &str) {
        let key = lookup_key(path);
        if self.active.as_deref() != Some(key.as_str()) {
            self.active = Some(key);
            self.render();
        }
    }

    /// Key of the highlighted link.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Rendered sidebar markup.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Link metadata by path or URL.
    #[must_use]
    pub fn links(&self) -> &LinkMap {
        &self.links
    }

    /// Metadata of the link for `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&SidebarLink> {
        self.links.get(key)
    }
}
