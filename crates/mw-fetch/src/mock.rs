//! Mock fetcher implementation for testing.
//!
//! Provides [`MockFetcher`] for unit testing without network or filesystem access.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::Fetcher;
use crate::error::{FetchError, FetchErrorKind};

const BACKEND: &str = "Mock";

/// Mock fetcher for testing.
///
/// Serves documents from memory and records every requested location.
/// Unknown locations answer with HTTP 404.
///
/// # Example
///
/// ```ignore
/// use mw_fetch::{Fetcher, MockFetcher};
///
/// let fetcher = MockFetcher::new()
///     .with_document("README.md", "# Home")
///     .with_status("broken.md", 500);
///
/// assert_eq!(fetcher.fetch("README.md").unwrap(), "# Home");
/// assert_eq!(fetcher.requests(), vec!["README.md"]);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    documents: RwLock<HashMap<String, String>>,
    statuses: RwLock<HashMap<String, u16>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` at `location`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_document(self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents
            .write()
            .unwrap()
            .insert(location.into(), content.into());
        self
    }

    /// Answer `location` with a non-success HTTP status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_status(self, location: impl Into<String>, status: u16) -> Self {
        self.statuses
            .write()
            .unwrap()
            .insert(location.into(), status);
        self
    }

    /// Locations requested so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of times `location` was requested.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn request_count(&self, location: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| *requested == location)
            .count()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(location.to_owned());

        if let Some(status) = self.statuses.read().unwrap().get(location) {
            return Err(FetchError::status(*status, location).with_backend(BACKEND));
        }

        self.documents
            .read()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| {
                FetchError::new(FetchErrorKind::Status(404), location).with_backend(BACKEND)
            })
    }
}
