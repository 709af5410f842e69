//! Parser error types.

/// Error produced by a single parse call.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A parser option has the wrong type.
    #[error("Invalid parser option `{key}`: expected {expected}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// Expected value type.
        expected: &'static str,
    },

    /// Parser-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Error produced by [`ParserManager`](crate::ParserManager).
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// No parser is registered under the configured name.
    #[error("Unknown markdown parser `{name}` (available: {available})")]
    UnknownParser {
        /// Configured parser name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },

    /// The parser factory refused to create an instance.
    #[error("Failed to create markdown parser `{name}`: {message}")]
    Factory {
        /// Configured parser name.
        name: String,
        /// Factory error message.
        message: String,
    },

    /// The created parser failed its first parse.
    #[error("Markdown parser `{name}` is unusable: {source}")]
    Probe {
        /// Configured parser name.
        name: String,
        /// Probe failure.
        source: ParseError,
    },

    /// `parse` was called before `init`.
    #[error("Markdown parser is not initialized")]
    NotInitialized,

    /// Parsing a document failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
