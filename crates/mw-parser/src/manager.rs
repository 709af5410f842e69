//! Parser lifecycle: resolve the configured parser once, then parse pages.

use tracing::{debug, error};

use crate::{EscapingParser, MarkdownParser, ParserError, ParserOptions, ParserRegistry};

/// Markdown used to check that a freshly created parser works.
const PROBE_DOCUMENT: &str = "# Probe\n\nText.";

/// Owns the active markdown parser.
pub struct ParserManager {
    name: String,
    options: ParserOptions,
    registry: ParserRegistry,
    parser: Option<Box<dyn MarkdownParser>>,
    fallback: bool,
}

impl ParserManager {
    /// Create a manager for the parser registered as `name`.
    ///
    /// Nothing is resolved until [`init`](Self::init) is called.
    #[must_use]
    pub fn new(name: impl Into<String>, options: ParserOptions, registry: ParserRegistry) -> Self {
        Self {
            name: name.into(),
            options,
            registry,
            parser: None,
            fallback: false,
        }
    }

    /// Configured parser name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`init`](Self::init) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.parser.is_some()
    }

    /// Whether the escaping fallback is active.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Resolve and install the configured parser.
    ///
    /// On failure the [`EscapingParser`] is installed so that
    /// [`parse`](Self::parse) keeps working, and the error is returned for
    /// the caller to surface.
    pub fn init(&mut self) -> Result<(), ParserError> {
        match self.create() {
            Ok(parser) => {
                debug!(parser = %self.name, "Markdown parser initialized");
                self.parser = Some(parser);
                self.fallback = false;
                Ok(())
            }
            Err(e) => {
                error!(parser = %self.name, error = %e, "Falling back to escaping parser");
                self.parser = Some(Box::new(EscapingParser));
                self.fallback = true;
                Err(e)
            }
        }
    }

    fn create(&self) -> Result<Box<dyn MarkdownParser>, ParserError> {
        let factory = self
            .registry
            .get(&self.name)
            .ok_or_else(|| ParserError::UnknownParser {
                name: self.name.clone(),
                available: self.registry.names().collect::<Vec<_>>().join(", "),
            })?;

        let parser = factory(&self.options).map_err(|message| ParserError::Factory {
            name: self.name.clone(),
            message,
        })?;

        parser
            .parse(PROBE_DOCUMENT, &self.options)
            .map_err(|source| ParserError::Probe {
                name: self.name.clone(),
                source,
            })?;

        Ok(parser)
    }

    /// Convert `markdown` to HTML with the configured options.
    pub fn parse(&self, markdown: &str) -> Result<String, ParserError> {
        let parser = self.parser.as_ref().ok_or(ParserError::NotInitialized)?;
        Ok(parser.parse(markdown, &self.options)?)
    }
}

impl std::fmt::Debug for ParserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserManager")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
