//! Built-in parsers backed by `pulldown-cmark`.

use pulldown_cmark::{Options, Parser, html};

use crate::{MarkdownParser, ParseError, ParserOptions};

/// Boolean option keys and the parser extension each toggles.
const OPTION_FLAGS: [(&str, Options); 6] = [
    ("tables", Options::ENABLE_TABLES),
    ("footnotes", Options::ENABLE_FOOTNOTES),
    ("strikethrough", Options::ENABLE_STRIKETHROUGH),
    ("tasklists", Options::ENABLE_TASKLISTS),
    ("smart_punctuation", Options::ENABLE_SMART_PUNCTUATION),
    ("heading_attributes", Options::ENABLE_HEADING_ATTRIBUTES),
];

/// Markdown dialect a [`PulldownParser`] starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// GitHub Flavored Markdown.
    Gfm,
    /// Plain `CommonMark`.
    CommonMark,
}

impl Dialect {
    fn default_options(self) -> Options {
        match self {
            Self::Gfm => {
                Options::ENABLE_TABLES
                    | Options::ENABLE_STRIKETHROUGH
                    | Options::ENABLE_TASKLISTS
                    | Options::ENABLE_FOOTNOTES
                    | Options::ENABLE_GFM
            }
            Self::CommonMark => Options::empty(),
        }
    }
}

/// Apply boolean option overrides on top of `base`.
fn apply_overrides(mut base: Options, overrides: &ParserOptions) -> Result<Options, ParseError> {
    for (key, flag) in OPTION_FLAGS {
        let Some(value) = overrides.get(key) else {
            continue;
        };
        let enabled = value.as_bool().ok_or_else(|| ParseError::InvalidOption {
            key: key.to_owned(),
            expected: "a boolean",
        })?;
        base.set(flag, enabled);
    }
    Ok(base)
}

/// `pulldown-cmark` parser with a fixed dialect and option overrides.
#[derive(Debug, Clone, Copy)]
pub struct PulldownParser {
    options: Options,
}

impl PulldownParser {
    /// Create a parser for `dialect` with the given overrides applied.
    pub fn new(dialect: Dialect, options: &ParserOptions) -> Result<Self, ParseError> {
        Ok(Self {
            options: apply_overrides(dialect.default_options(), options)?,
        })
    }

    /// Effective `pulldown-cmark` options.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }
}

impl MarkdownParser for PulldownParser {
    fn parse(&self, markdown: &str, options: &ParserOptions) -> Result<String, ParseError> {
        let options = apply_overrides(self.options, options)?;
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, Parser::new_ext(markdown, options));
        Ok(output)
    }
}
