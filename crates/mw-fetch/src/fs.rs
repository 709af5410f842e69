//! Static-directory fetcher.
//!
//! Serves relative locations from a root directory, the way a static file
//! host would, and hands absolute URLs to an [`HttpFetcher`].

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{FetchError, FetchErrorKind};
use crate::http::HttpFetcher;
use crate::path::is_absolute_url;
use crate::Fetcher;

const BACKEND: &str = "Fs";

/// Fetches documents from a directory on disk.
pub struct FsFetcher {
    root: PathBuf,
    remote: HttpFetcher,
}

impl FsFetcher {
    /// Create a fetcher rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            remote: HttpFetcher::new(),
        }
    }

    /// Replace the fetcher used for absolute URLs.
    #[must_use]
    pub fn with_remote(mut self, remote: HttpFetcher) -> Self {
        self.remote = remote;
        self
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative location to a file below the root.
    ///
    /// Locations escaping the root (`..`) or carrying a drive/root prefix
    /// after the leading slash is stripped are rejected.
    fn file_path(&self, location: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(location.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(
                FetchError::new(FetchErrorKind::InvalidLocation, location).with_backend(BACKEND)
            );
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for FsFetcher {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if is_absolute_url(location) {
            return self.remote.fetch(location);
        }

        let path = self.file_path(location)?;
        debug!(path = %path.display(), "Reading document");
        std::fs::read_to_string(&path)
            .map_err(|e| FetchError::io(e, location).with_backend(BACKEND))
    }
}
