//! Markdown-to-HTML parsing for the markdown wiki runtime.
//!
//! Parsers are looked up by name in a [`ParserRegistry`] instead of being
//! loaded dynamically. The registry ships two built-in dialects:
//!
//! - `gfm`: `CommonMark` plus tables, strikethrough, task lists and footnotes
//! - `commonmark`: plain `CommonMark`
//!
//! Applications register their own parsers under new names before calling
//! [`ParserManager::init`].
//!
//! # Fallback
//!
//! When the configured parser cannot be created, the manager installs an
//! [`EscapingParser`] that shows the raw markdown in a `<pre>` block and
//! reports the failure to the caller. Pages stay readable even when the
//! parser setup is broken.
//!
//! # Example
//!
//! ```
//! use mw_parser::{ParserManager, ParserOptions, ParserRegistry};
//!
//! let mut manager = ParserManager::new("gfm", ParserOptions::new(), ParserRegistry::default());
//! manager.init().unwrap();
//! let html = manager.parse("# Hello").unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n");
//! ```

mod error;
mod escape;
mod manager;
mod pulldown;
mod registry;

pub use error::{ParseError, ParserError};
pub use escape::{EscapingParser, escape_html};
pub use manager::ParserManager;
pub use pulldown::{Dialect, PulldownParser};
pub use registry::{ParserFactory, ParserRegistry};

/// Free-form per-parser options taken from `markdown.parser_options`.
pub type ParserOptions = toml::Table;

/// A markdown-to-HTML converter.
pub trait MarkdownParser: Send + Sync {
    /// Convert `markdown` to HTML.
    ///
    /// `options` are the configured per-parser options; implementations
    /// ignore keys they do not understand.
    fn parse(&self, markdown: &str, options: &ParserOptions) -> Result<String, ParseError>;
}
