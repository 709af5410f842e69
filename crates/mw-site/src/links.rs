//! Rewriting of relative references in remotely loaded documents.
//!
//! A document fetched from `https://example.com/dir/doc.md` links to its
//! siblings relatively. Those links are rewritten before parsing so they keep
//! working inside the app:
//!
//! - images become absolute URLs
//! - links to markdown documents become `#/remote/<base64url>` routes
//! - other relative links become absolute URLs
//!
//! Inline destinations are replaced in place. Reference-style links and
//! images are handled by rewriting their definitions. Absolute URLs,
//! anchor-only links and links with a scheme are left as they are; code spans
//! and code blocks are never touched because the markdown is tokenized before
//! rewriting.

use std::ops::Range;

use mw_fetch::resolve_url;
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag};
use tracing::debug;

use crate::router::encode_remote_path;

/// One destination replacement in the source text.
struct Edit {
    span: Range<usize>,
    replacement: String,
}

/// Whether `dest` must be left untouched.
fn is_external_or_local_anchor(dest: &str) -> bool {
    if dest.is_empty() || dest.starts_with('#') || dest.starts_with("//") {
        return true;
    }
    dest.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && !scheme.contains('/')
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Whether the path part of `dest` names a markdown document.
fn is_markdown(path: &str) -> bool {
    let end = path.find('?').unwrap_or(path.len());
    path[..end].to_ascii_lowercase().ends_with(".md")
}

/// Replacement for a link destination, or `None` to keep it.
fn rewrite_link(dest: &str, document_url: &str) -> Option<String> {
    let (path, anchor) = match dest.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (dest, None),
    };
    if !is_markdown(path) {
        return resolve_url(document_url, dest);
    }
    let target = resolve_url(document_url, path)?;
    let route = encode_remote_path(&target);
    Some(match anchor {
        Some(anchor) if !anchor.is_empty() => format!("#{route}#{anchor}"),
        _ => format!("#{route}"),
    })
}

/// Escape characters that would end or break a link destination.
fn escape_destination(dest: &str) -> String {
    let mut escaped = String::with_capacity(dest.len());
    for c in dest.chars() {
        match c {
            '(' | ')' | '<' | '>' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' ' => escaped.push_str("%20"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Span of the raw link destination starting at or after `start`.
///
/// Leading whitespace is skipped. Handles `<...>` destinations, backslash
/// escapes and balanced parentheses.
fn destination_span(source: &str, start: usize, end: usize) -> Option<Range<usize>> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'<') {
        let open = pos + 1;
        let mut i = open;
        while i < end {
            match bytes[i] {
                b'\\' => i += 2,
                b'>' => return Some(open..i),
                _ => i += 1,
            }
        }
        return None;
    }

    let mut depth = 0usize;
    let mut i = pos;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' if depth == 0 => break,
            b')' => {
                depth -= 1;
                i += 1;
            }
            b if b.is_ascii_whitespace() => break,
            _ => i += 1,
        }
    }
    let i = i.min(end);
    (i > pos).then_some(pos..i)
}

/// End of the link text: the furthest offset reached by the events nested
/// inside the link or image whose start event precedes `inner`.
fn text_end(inner: &[(Event<'_>, Range<usize>)]) -> Option<usize> {
    let mut depth = 0usize;
    let mut end = None;
    for (event, range) in inner {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        end = end.max(Some(range.end));
    }
    end
}

/// Edit for the destination of a reference definition.
fn definition_edit(
    markdown: &str,
    dest: &str,
    def_span: &std::ops::Range<usize>,
    document_url: &str,
) -> Option<Edit> {
    if is_external_or_local_anchor(dest) {
        return None;
    }
    // The label ends at the first unescaped `]`, followed by `:`.
    let bytes = markdown.as_bytes();
    let mut i = def_span.start;
    while i < def_span.end && bytes[i] != b']' {
        i += if bytes[i] == b'\\' { 2 } else { 1 };
    }
    if bytes.get(i + 1) != Some(&b':') {
        return None;
    }
    let span = destination_span(markdown, i + 2, def_span.end)?;
    let replacement = rewrite_link(dest, document_url)?;
    Some(Edit {
        span,
        replacement: escape_destination(&replacement),
    })
}

/// Rewrite relative links and images in `markdown` fetched from `document_url`.
///
/// # Examples
///
/// ```
/// use mw_site::rewrite_remote_links;
///
/// let markdown = "[a](b.md) ![alt](img.png)";
/// let rewritten = rewrite_remote_links(markdown, "https://example.com/dir/doc.md");
/// assert_eq!(
///     rewritten,
///     "[a](#/remote/aHR0cHM6Ly9leGFtcGxlLmNvbS9kaXIvYi5tZA) ![alt](https://example.com/dir/img.png)"
/// );
/// ```
#[must_use]
pub fn rewrite_remote_links(markdown: &str, document_url: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options).into_offset_iter();

    let mut edits: Vec<Edit> = parser
        .reference_definitions()
        .iter()
        .filter_map(|(_, def)| definition_edit(markdown, &def.dest, &def.span, document_url))
        .collect();

    let events: Vec<_> = parser.collect();
    for (index, (event, range)) in events.iter().enumerate() {
        let (dest, is_image, text_start) = match event {
            Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url,
                ..
            }) => (dest_url, false, range.start + 1),
            Event::Start(Tag::Image {
                link_type: LinkType::Inline,
                dest_url,
                ..
            }) => (dest_url, true, range.start + 2),
            _ => continue,
        };
        if is_external_or_local_anchor(dest) {
            continue;
        }

        let replacement = if is_image {
            resolve_url(document_url, dest)
        } else {
            rewrite_link(dest, document_url)
        };
        let Some(replacement) = replacement else {
            debug!(dest = %dest, "Cannot resolve reference, keeping it");
            continue;
        };

        // The destination follows the `](` closing the link text.
        let from = text_end(&events[index + 1..]).map_or(text_start, |end| end.max(text_start));
        let span = markdown[from..range.end]
            .find("](")
            .and_then(|open| destination_span(markdown, from + open + 2, range.end));
        let Some(span) = span else {
            debug!(dest = %dest, "Destination not found in source, keeping it");
            continue;
        };
        edits.push(Edit {
            span,
            replacement: escape_destination(&replacement),
        });
    }

    edits.sort_by_key(|edit| edit.span.start);
    let mut output = String::with_capacity(markdown.len() + edits.len() * 32);
    let mut cursor = 0;
    for edit in edits {
        if edit.span.start < cursor {
            continue;
        }
        output.push_str(&markdown[cursor..edit.span.start]);
        output.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    output.push_str(&markdown[cursor..]);
    output
}
