//! Flat fragment router.
//!
//! A fragment such as `#/docs/guide#setup` is split into the navigation path
//! `/docs/guide` and the anchor `setup`. The path maps to exactly one content
//! file:
//!
//! | Path               | File                          |
//! |--------------------|-------------------------------|
//! | `/`                | `files.default_page`          |
//! | `/remote/<base64>` | decoded absolute URL          |
//! | `/docs/guide`      | `docs/guide.md`               |

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use mw_config::Config;
use mw_fetch::is_absolute_url;
use tracing::{debug, warn};

/// Path prefix of remote-document routes.
pub const REMOTE_PREFIX: &str = "/remote/";

/// URL-safe base64 without padding; padded input is accepted too.
const REMOTE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Navigation path for an externally hosted document.
///
/// # Examples
///
/// ```
/// use mw_site::{encode_remote_path, remote_url};
///
/// let path = encode_remote_path("https://example.com/a.md");
/// assert_eq!(path, "/remote/aHR0cHM6Ly9leGFtcGxlLmNvbS9hLm1k");
/// assert_eq!(remote_url(&path).as_deref(), Some("https://example.com/a.md"));
/// ```
#[must_use]
pub fn encode_remote_path(url: &str) -> String {
    format!("{REMOTE_PREFIX}{}", REMOTE_ENGINE.encode(url.as_bytes()))
}

/// Decode the URL embedded in a remote path.
///
/// Returns `None` for non-remote paths and for payloads that are not
/// base64url-encoded absolute URLs.
#[must_use]
pub fn remote_url(path: &str) -> Option<String> {
    let encoded = path.strip_prefix(REMOTE_PREFIX)?;
    let bytes = REMOTE_ENGINE.decode(encoded).ok()?;
    let url = String::from_utf8(bytes).ok()?;
    is_absolute_url(&url).then_some(url)
}

/// Normalize a path for lookups.
///
/// Strips query and anchor, guarantees a leading slash and removes trailing
/// slashes except for the root.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// Key identifying `path` in the sidebar link map.
///
/// Remote paths are keyed by their decoded URL, local paths by their
/// normalized form.
#[must_use]
pub fn lookup_key(path: &str) -> String {
    remote_url(path).unwrap_or_else(|| normalize_path(path))
}

/// Resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Normalized navigation path, without anchor.
    pub path: String,
    /// In-page anchor to scroll to after rendering.
    pub anchor: Option<String>,
    /// Content file (relative path or absolute URL).
    pub file_path: String,
}

/// Maps URL fragments to content files.
#[derive(Debug)]
pub struct Router {
    default_page: String,
    current: Option<Route>,
}

impl Router {
    /// Create a router using the configured default page.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_page: config.files.default_page.clone(),
            current: None,
        }
    }

    /// Start routing and resolve the initial fragment.
    ///
    /// The returned route is the first navigation; later fragment changes go
    /// through [`handle_change`](Self::handle_change).
    pub fn init(&mut self, fragment: &str) -> Route {
        debug!(fragment, "Router initialized");
        self.navigate(fragment)
    }

    /// Whether [`init`](Self::init) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// React to a fragment change.
    ///
    /// Returns `None` until the router has been initialized.
    pub fn handle_change(&mut self, fragment: &str) -> Option<Route> {
        if !self.is_initialized() {
            debug!(fragment, "Ignoring fragment change before router init");
            return None;
        }
        Some(self.navigate(fragment))
    }

    fn navigate(&mut self, fragment: &str) -> Route {
        let route = self.resolve(fragment);
        self.current = Some(route.clone());
        route
    }

    /// Resolve a fragment without changing the current route.
    #[must_use]
    pub fn resolve(&self, fragment: &str) -> Route {
        let (path, anchor) = split_fragment(fragment);
        let file_path = self.get_file_path(&path);
        Route {
            path,
            anchor,
            file_path,
        }
    }

    /// Current navigation path, `/` before the first navigation.
    #[must_use]
    pub fn get_current_path(&self) -> &str {
        self.current.as_ref().map_or("/", |route| route.path.as_str())
    }

    /// Current route.
    #[must_use]
    pub fn current_route(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Map a navigation path to its content file.
    ///
    /// A remote path whose payload cannot be decoded maps to the default
    /// page.
    #[must_use]
    pub fn get_file_path(&self, path: &str) -> String {
        if path == "/" {
            return self.default_page.clone();
        }
        if path.starts_with(REMOTE_PREFIX) {
            return remote_url(path).unwrap_or_else(|| {
                warn!(path, "Invalid remote path, showing default page");
                self.default_page.clone()
            });
        }
        format!("{}.md", path.strip_prefix('/').unwrap_or(path))
    }
}

/// Split a fragment into normalized path and anchor.
fn split_fragment(fragment: &str) -> (String, Option<String>) {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let (path, anchor) = match fragment.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (fragment, None),
    };
    let anchor = anchor.filter(|a| !a.is_empty()).map(str::to_owned);
    (normalize_path(path), anchor)
}
