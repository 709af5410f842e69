//! Document title resolution.

use mw_config::{Config, TitleConfig, TitleOrder, TitleSource};
use tracing::debug;

use crate::dom::{ContentElement, Shell};
use crate::router::lookup_key;
use crate::sidebar::LinkMap;

/// Ellipsis appended to truncated titles.
const ELLIPSIS: &str = "...";

/// Inputs for computing a page title.
#[derive(Debug, Clone, Copy)]
pub struct TitleContext<'a> {
    /// Rendered content.
    pub content: &'a ContentElement,
    /// Navigation path (remote paths are decoded for the sidebar lookup).
    pub path: &'a str,
    /// Content file the page was rendered from.
    pub file_path: &'a str,
    /// Sidebar links.
    pub links: &'a LinkMap,
}

/// File name of `file_path` without directory, query or extension.
fn file_stem(file_path: &str) -> &str {
    let end = file_path.find(['?', '#']).unwrap_or(file_path.len());
    let path = file_path[..end].trim_end_matches('/');
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Truncate `title` to `max_length` characters, ellipsis included.
fn truncate(title: String, max_length: usize) -> String {
    if title.chars().count() <= max_length {
        return title;
    }
    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = title.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Computes and applies document titles.
#[derive(Debug, Clone)]
pub struct TitleManager {
    config: TitleConfig,
    app_name: String,
}

impl TitleManager {
    /// Create a title manager from the configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.title.clone(),
            app_name: config.name.clone(),
        }
    }

    /// Page title from the first source in priority order that yields text.
    #[must_use]
    pub fn compute_page_title(&self, ctx: &TitleContext<'_>) -> String {
        let key = lookup_key(ctx.path);
        let link = ctx.links.get(&key);

        for source in &self.config.source_priority {
            let candidate = match source {
                TitleSource::SidebarTitle => link.and_then(|l| l.title.clone()),
                TitleSource::SidebarLabel => link.map(|l| l.label.clone()),
                TitleSource::Heading => ctx.content.first_heading_text(1),
                TitleSource::Filename => Some(file_stem(ctx.file_path).to_owned()),
                TitleSource::Fallback => Some(self.config.fallback.clone()),
            };
            if let Some(title) = candidate.map(|t| t.trim().to_owned())
                && !title.is_empty()
            {
                debug!(source = ?source, title = %title, "Page title resolved");
                return title;
            }
        }
        self.config.fallback.clone()
    }

    /// Combine a page title with the application name.
    #[must_use]
    pub fn format_title(&self, page_title: &str) -> String {
        let order = if self.config.include_wiki && !self.app_name.is_empty() {
            self.config.order
        } else {
            TitleOrder::PageOnly
        };
        let separator = &self.config.separator;
        let title = match order {
            TitleOrder::PageFirst => format!("{page_title}{separator}{}", self.app_name),
            TitleOrder::WikiFirst => format!("{}{separator}{page_title}", self.app_name),
            TitleOrder::PageOnly => page_title.to_owned(),
        };
        truncate(title, self.config.max_length)
    }

    /// Compute the title for the content rendered in `shell` and set it.
    ///
    /// Returns the page title (before formatting). The document title is left
    /// untouched when titles are disabled.
    pub fn update_title(
        &self,
        shell: &mut Shell,
        path: &str,
        file_path: &str,
        links: &LinkMap,
    ) -> String {
        let page_title = self.compute_page_title(&TitleContext {
            content: shell.content(),
            path,
            file_path,
            links,
        });
        if self.config.enabled {
            shell.set_title(self.format_title(&page_title));
        }
        page_title
    }
}
