//! Path and URL resolution helpers.

use url::Url;

/// Whether `location` is an absolute `http(s)` URL.
#[must_use]
pub fn is_absolute_url(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join a base path with a relative resource path.
///
/// Absolute URLs are returned unchanged. `./` segments and repeated slashes
/// in `relative` are dropped, and a leading slash is treated as relative to
/// `base` rather than to the filesystem root.
///
/// # Examples
///
/// ```
/// use mw_fetch::resolve_path;
///
/// assert_eq!(resolve_path("docs", "guide.md"), "docs/guide.md");
/// assert_eq!(resolve_path("docs/", "./a//b.md"), "docs/a/b.md");
/// assert_eq!(resolve_path("", "/README.md"), "README.md");
/// assert_eq!(resolve_path("docs", "https://x.org/a.md"), "https://x.org/a.md");
/// ```
#[must_use]
pub fn resolve_path(base: &str, relative: &str) -> String {
    if is_absolute_url(relative) {
        return relative.to_owned();
    }

    let relative = relative
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    let base = base.trim_end_matches('/');
    if base.is_empty() || base == "." {
        relative
    } else {
        format!("{base}/{relative}")
    }
}

/// Prefix an absolute URL with a CORS proxy, when one is configured.
///
/// Relative locations are never proxied.
#[must_use]
pub fn proxied_url(location: &str, proxy: Option<&str>) -> String {
    match proxy {
        Some(proxy) if !proxy.is_empty() && is_absolute_url(location) => {
            format!("{proxy}{location}")
        }
        _ => location.to_owned(),
    }
}

/// Resolve `reference` against the address of the document containing it.
///
/// Returns `None` if `document_url` is not a valid absolute URL or the
/// reference cannot be joined.
#[must_use]
pub fn resolve_url(document_url: &str, reference: &str) -> Option<String> {
    let base = Url::parse(document_url).ok()?;
    base.join(reference).ok().map(String::from)
}
