//! Built-in plugins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Hook, Plugin, PluginError};
use crate::dom::{ContentElement, html_to_text};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])([^>]*)>(.*?)</h[1-6]\s*>").unwrap());

static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sid="([^"]*)""#).unwrap());

static LINK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<a\s[^>]*>").unwrap());

static TARGET_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\starget\s*=").unwrap());

/// Turn heading text into an id.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_owned()
    } else {
        slug.to_owned()
    }
}

/// Assigns ids to headings so that `#anchor` routes can scroll to them.
///
/// Processed headings carry a `data-mw-anchor` marker and are skipped on
/// later runs.
#[derive(Debug, Default)]
pub struct HeadingAnchors;

impl HeadingAnchors {
    /// Registry name.
    pub const NAME: &'static str = "heading-anchors";

    /// Create the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for HeadingAnchors {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn registered_hooks(&self) -> Vec<Hook> {
        vec![Hook::PageLoad]
    }

    fn on_page_load(&mut self, content: &mut ContentElement) -> Result<(), PluginError> {
        let marker = ContentElement::marker("anchor");
        let html = content.html();
        let mut used: HashSet<String> = ID_ATTR_RE
            .captures_iter(html)
            .map(|caps| caps[1].to_owned())
            .collect();
        let mut changed = false;

        let updated = HEADING_RE.replace_all(html, |caps: &Captures<'_>| {
            let (level, attrs, inner) = (&caps[1], &caps[2], &caps[3]);
            if attrs.contains(&marker) {
                return caps[0].to_owned();
            }
            changed = true;

            let (id, id_attr) = if let Some(existing) = ID_ATTR_RE.captures(attrs) {
                (existing[1].to_owned(), String::new())
            } else {
                let base = slugify(&html_to_text(inner));
                let mut id = base.clone();
                let mut n = 1;
                while used.contains(&id) {
                    id = format!("{base}-{n}");
                    n += 1;
                }
                used.insert(id.clone());
                let attr = format!(" id=\"{id}\"");
                (id, attr)
            };

            format!(
                "<h{level}{attrs}{id_attr} {marker}>{inner}<a class=\"heading-anchor\" data-anchor=\"{id}\" aria-hidden=\"true\"></a></h{level}>"
            )
        });

        if changed {
            let updated = updated.into_owned();
            content.set_html(updated);
        }
        Ok(())
    }
}

/// Opens absolute links in a new tab.
#[derive(Debug, Default)]
pub struct ExternalLinks;

impl ExternalLinks {
    /// Registry name.
    pub const NAME: &'static str = "external-links";
}

impl Plugin for ExternalLinks {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn registered_hooks(&self) -> Vec<Hook> {
        vec![Hook::PageLoad]
    }

    fn on_page_load(&mut self, content: &mut ContentElement) -> Result<(), PluginError> {
        let updated = LINK_TAG_RE.replace_all(content.html(), |caps: &Captures<'_>| {
            let tag = &caps[0];
            let lower = tag.to_ascii_lowercase();
            let external =
                lower.contains("href=\"http://") || lower.contains("href=\"https://");
            if !external || TARGET_ATTR_RE.is_match(tag) {
                return tag.to_owned();
            }
            let open = tag.trim_end_matches('>');
            format!("{open} target=\"_blank\" rel=\"noopener\">")
        });
        let updated = updated.into_owned();
        content.set_html(updated);
        Ok(())
    }
}
