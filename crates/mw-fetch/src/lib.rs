//! Path resolution and content fetching for the markdown wiki runtime.
//!
//! This crate provides the two leaf components every other component builds on:
//!
//! - path helpers ([`resolve_path`], [`resolve_url`], [`proxied_url`]) that turn
//!   configured base paths and document references into fetchable locations
//! - the [`Fetcher`] trait with an HTTP backend ([`HttpFetcher`]), a static
//!   directory backend ([`FsFetcher`]) and an in-memory [`MockFetcher`] for
//!   tests (behind the `mock` feature flag)
//!
//! # Error Classification
//!
//! Every failure to obtain a document (non-2xx status, transport failure,
//! missing file) is reported as a [`FetchError`] whose
//! [`is_not_found`](FetchError::is_not_found) is `true`. Only a body that
//! cannot be decoded as UTF-8 is classified otherwise.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use mw_fetch::{Fetcher, FsFetcher, resolve_path};
//!
//! let fetcher = FsFetcher::new(PathBuf::from("site"));
//! let markdown = fetcher.fetch(&resolve_path("docs", "guide.md"))?;
//! ```

mod error;
mod fs;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod path;

pub use error::{FetchError, FetchErrorKind};
pub use fs::FsFetcher;
pub use http::HttpFetcher;
#[cfg(feature = "mock")]
pub use mock::MockFetcher;
pub use path::{is_absolute_url, proxied_url, resolve_path, resolve_url};

/// Source of document text.
///
/// `location` is either a path relative to the site root (already joined with
/// the configured base path) or an absolute `http(s)` URL.
pub trait Fetcher: Send + Sync {
    /// Fetch the text at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the document cannot be obtained.
    fn fetch(&self, location: &str) -> Result<String, FetchError>;
}
