//! URL validation shared by every source loader.

use url::Url;

/// Returns `true` if `candidate` is an absolute `http` or `https` URL with a
/// non-empty host.
///
/// # Examples
///
/// ```
/// use bulkfetch_core::is_valid_url;
///
/// assert!(is_valid_url("http://a.b"));
/// assert!(!is_valid_url("ftp://a.b"));
/// assert!(!is_valid_url("http://"));
/// assert!(!is_valid_url("/just/a/path"));
/// ```
#[must_use]
pub fn is_valid_url(candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https")
        && parsed.host_str().is_some_and(|host| !host.is_empty())
}
