//! Named parser factories.

use std::collections::BTreeMap;

use crate::{Dialect, MarkdownParser, ParserOptions, PulldownParser};

/// Creates a parser instance from the configured options.
pub type ParserFactory =
    Box<dyn Fn(&ParserOptions) -> Result<Box<dyn MarkdownParser>, String> + Send + Sync>;

/// Lookup table of parser factories by name.
///
/// [`ParserRegistry::default`] contains the built-in `gfm` and `commonmark`
/// parsers; [`ParserRegistry::new`] starts empty.
pub struct ParserRegistry {
    factories: BTreeMap<String, ParserFactory>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register `factory` under `name`, replacing any previous entry.
    #[must_use]
    pub fn with_parser<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ParserOptions) -> Result<Box<dyn MarkdownParser>, String> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ParserOptions) -> Result<Box<dyn MarkdownParser>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Factory registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParserFactory> {
        self.factories.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
            .with_parser("gfm", |options| pulldown_factory(Dialect::Gfm, options))
            .with_parser("commonmark", |options| {
                pulldown_factory(Dialect::CommonMark, options)
            })
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn pulldown_factory(
    dialect: Dialect,
    options: &ParserOptions,
) -> Result<Box<dyn MarkdownParser>, String> {
    PulldownParser::new(dialect, options)
        .map(|parser| Box::new(parser) as Box<dyn MarkdownParser>)
        .map_err(|e| e.to_string())
}
