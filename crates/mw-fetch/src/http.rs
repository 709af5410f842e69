//! HTTP fetcher backed by a shared `ureq` agent.

use std::time::Duration;

use tracing::debug;
use ureq::Agent;
use url::Url;

use crate::error::{FetchError, FetchErrorKind};
use crate::path::is_absolute_url;
use crate::Fetcher;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

const BACKEND: &str = "Http";

/// Create an agent that reports error statuses as responses.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Fetches documents over HTTP.
///
/// Relative locations are joined onto the configured origin; without an
/// origin only absolute URLs can be fetched.
pub struct HttpFetcher {
    agent: Agent,
    origin: Option<Url>,
}

impl HttpFetcher {
    /// Create a fetcher for absolute URLs only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: create_agent(Duration::from_secs(DEFAULT_TIMEOUT)),
            origin: None,
        }
    }

    /// Create a fetcher resolving relative locations against `origin`.
    ///
    /// A trailing slash is added to `origin` so that its last segment is
    /// treated as a directory.
    ///
    /// # Errors
    ///
    /// Returns [`FetchErrorKind::InvalidLocation`] if `origin` is not a URL.
    pub fn with_origin(origin: &str) -> Result<Self, FetchError> {
        let normalized = if origin.ends_with('/') {
            origin.to_owned()
        } else {
            format!("{origin}/")
        };
        let origin = Url::parse(&normalized).map_err(|e| {
            FetchError::new(FetchErrorKind::InvalidLocation, origin)
                .with_backend(BACKEND)
                .with_source(e)
        })?;
        Ok(Self {
            origin: Some(origin),
            ..Self::new()
        })
    }

    /// Set HTTP timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Turn a location into the URL that is requested.
    fn target(&self, location: &str) -> Result<String, FetchError> {
        if is_absolute_url(location) {
            return Ok(location.to_owned());
        }
        let invalid =
            || FetchError::new(FetchErrorKind::InvalidLocation, location).with_backend(BACKEND);
        let origin = self.origin.as_ref().ok_or_else(invalid)?;
        origin
            .join(location.trim_start_matches('/'))
            .map(String::from)
            .map_err(|e| invalid().with_source(e))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let url = self.target(location)?;
        debug!(url = %url, "Fetching document");

        let response = self.agent.get(&url).call().map_err(|e| {
            FetchError::new(FetchErrorKind::Transport, location)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Non-success response");
            return Err(FetchError::status(status.as_u16(), location).with_backend(BACKEND));
        }

        response.into_body().read_to_string().map_err(|e| {
            FetchError::new(FetchErrorKind::Decode, location)
                .with_backend(BACKEND)
                .with_source(e)
        })
    }
}
