//! HTML escaping and the escaping fallback parser.

use crate::{MarkdownParser, ParseError, ParserOptions};

/// Escape text for inclusion in HTML content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parser that renders markdown as escaped preformatted text.
///
/// Installed when the configured parser cannot be used.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapingParser;

impl MarkdownParser for EscapingParser {
    fn parse(&self, markdown: &str, _options: &ParserOptions) -> Result<String, ParseError> {
        Ok(format!("<pre>{}</pre>", escape_html(markdown)))
    }
}
