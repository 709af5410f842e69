//! Fetch error types.

/// What went wrong while fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchErrorKind {
    /// Server answered with a non-success status.
    Status(u16),
    /// Connection, DNS, TLS or timeout failure.
    Transport,
    /// Local file does not exist.
    Missing,
    /// Location cannot be turned into a request.
    InvalidLocation,
    /// Local I/O failure other than a missing file.
    Io,
    /// Body is not valid UTF-8.
    Decode,
}

/// Fetch error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct FetchError {
    /// Semantic error category.
    pub kind: FetchErrorKind,
    /// Location that was requested.
    pub location: String,
    /// Backend identifier (e.g., "Http", "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FetchError {
    /// Create a new fetch error.
    #[must_use]
    pub fn new(kind: FetchErrorKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            backend: None,
            source: None,
        }
    }

    /// Create a non-success status error.
    #[must_use]
    pub fn status(status: u16, location: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Status(status), location)
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a fetch error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, location: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => FetchErrorKind::Missing,
            std::io::ErrorKind::InvalidData => FetchErrorKind::Decode,
            _ => FetchErrorKind::Io,
        };
        Self::new(kind, location).with_source(err)
    }

    /// HTTP status code, if the server answered.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            FetchErrorKind::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Whether the failure means the document is unavailable.
    ///
    /// Callers substitute their not-found document in this case. Only
    /// undecodable content is treated as a generic failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        !matches!(self.kind, FetchErrorKind::Decode)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: source (location: guide.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        match self.kind {
            FetchErrorKind::Status(status) => write!(f, "HTTP {status}")?,
            FetchErrorKind::Transport => write!(f, "Transport error")?,
            FetchErrorKind::Missing => write!(f, "Not found")?,
            FetchErrorKind::InvalidLocation => write!(f, "Invalid location")?,
            FetchErrorKind::Io => write!(f, "I/O error")?,
            FetchErrorKind::Decode => write!(f, "Invalid UTF-8")?,
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        write!(f, " (location: {})", self.location)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
