//! Destination path resolution for fetched URLs.
//!
//! Maps a URL to a file under the output root, either flattened to the URL
//! path's basename or mirroring the whole URL path. Resolution is lexical and
//! pure: it never touches the filesystem, and the result never escapes the
//! output root.

use std::path::{Path, PathBuf};

use url::Url;

use super::constants::{PLACEHOLDER_FILENAME, TRAVERSAL_REPLACEMENT};

/// Resolves the destination path for `url` under `output_root`.
///
/// - Flatten mode (`preserve_path == false`): `output_root/<basename>`, or
///   `output_root/downloaded_file` when the URL path has no basename.
/// - Preserve mode: `output_root/<url path>`, with a trailing `/` completed by
///   `downloaded_file`, `.` and `..` collapsed, and any remaining leading `..`
///   replaced by `_`.
///
/// Query strings and fragments never contribute to the path. A URL that does
/// not parse resolves to the placeholder name.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use bulkfetch_core::resolve_destination;
///
/// let out = Path::new("out");
/// assert_eq!(
///     resolve_destination("http://h/dir/file.txt", out, false),
///     out.join("file.txt")
/// );
/// assert_eq!(
///     resolve_destination("http://h/dir/file.txt", out, true),
///     out.join("dir").join("file.txt")
/// );
/// ```
#[must_use]
pub fn resolve_destination(url: &str, output_root: &Path, preserve_path: bool) -> PathBuf {
    let url_path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_default();

    if preserve_path {
        output_root.join(sanitize_relative_path(&url_path))
    } else {
        output_root.join(basename(&url_path))
    }
}

/// Last path segment, or the placeholder when there is none.
fn basename(url_path: &str) -> &str {
    match url_path.rsplit('/').next() {
        Some(name) if !matches!(name, "" | "." | "..") => name,
        _ => PLACEHOLDER_FILENAME,
    }
}

/// Turns a URL path into a relative path that stays under its root.
pub(crate) fn sanitize_relative_path(url_path: &str) -> PathBuf {
    let mut path = url_path.trim_start_matches('/').to_string();
    if path.is_empty() || path.ends_with('/') {
        path.push_str(PLACEHOLDER_FILENAME);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    // Only leading `..` can survive normalization.
    let sanitized: PathBuf = segments
        .into_iter()
        .map(|segment| {
            if segment == ".." {
                TRAVERSAL_REPLACEMENT
            } else {
                segment
            }
        })
        .collect();

    if sanitized.as_os_str().is_empty() {
        PathBuf::from(PLACEHOLDER_FILENAME)
    } else {
        sanitized
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Component;

    use super::*;

    fn out() -> PathBuf {
        PathBuf::from("/srv/out")
    }

    fn assert_under_root(path: &Path, root: &Path) {
        assert!(path.starts_with(root), "{} escapes {}", path.display(), root.display());
        assert!(
            !path.components().any(|c| c == Component::ParentDir),
            "{} contains ..",
            path.display()
        );
    }

    // ==================== Flatten Mode ====================

    #[test]
    fn test_flatten_uses_basename() {
        let path = resolve_destination("http://h/dir/file.txt", &out(), false);
        assert_eq!(path, out().join("file.txt"));
    }

    #[test]
    fn test_flatten_trailing_slash_uses_placeholder() {
        let path = resolve_destination("http://h/dir/", &out(), false);
        assert_eq!(path, out().join("downloaded_file"));
    }

    #[test]
    fn test_flatten_bare_host_uses_placeholder() {
        let path = resolve_destination("https://example.com", &out(), false);
        assert_eq!(path, out().join("downloaded_file"));
    }

    #[test]
    fn test_flatten_ignores_query_and_fragment() {
        let path = resolve_destination("http://h/a/report.pdf?x=1#top", &out(), false);
        assert_eq!(path, out().join("report.pdf"));
    }

    #[test]
    fn test_unparseable_url_uses_placeholder() {
        let path = resolve_destination("not a url", &out(), false);
        assert_eq!(path, out().join("downloaded_file"));
    }

    // ==================== Preserve Mode ====================

    #[test]
    fn test_preserve_mirrors_hierarchy() {
        let path = resolve_destination("http://h/a/b/c.bin", &out(), true);
        assert_eq!(path, out().join("a").join("b").join("c.bin"));
    }

    #[test]
    fn test_preserve_trailing_slash_appends_placeholder() {
        let path = resolve_destination("http://h/docs/", &out(), true);
        assert_eq!(path, out().join("docs").join("downloaded_file"));
    }

    #[test]
    fn test_preserve_root_path_uses_placeholder() {
        let path = resolve_destination("http://h/", &out(), true);
        assert_eq!(path, out().join("downloaded_file"));
    }

    #[test]
    fn test_preserve_traversal_url_stays_under_root() {
        let path = resolve_destination("http://h/../../etc/passwd", &out(), true);
        assert_under_root(&path, &out());
        assert!(path.ends_with("etc/passwd"));
    }

    #[test]
    fn test_preserve_encoded_traversal_stays_under_root() {
        let path = resolve_destination("http://h/a/%2e%2e/%2E%2E/%2e%2e/secret", &out(), true);
        assert_under_root(&path, &out());
    }

    // ==================== Sanitizer ====================

    #[test]
    fn test_sanitize_replaces_leading_parent_segments() {
        assert_eq!(
            sanitize_relative_path("/../../etc/passwd"),
            PathBuf::from("_/_/etc/passwd")
        );
    }

    #[test]
    fn test_sanitize_collapses_inner_segments() {
        assert_eq!(
            sanitize_relative_path("/a/./b/../c.txt"),
            PathBuf::from("a/c.txt")
        );
        assert_eq!(sanitize_relative_path("a/../../b"), PathBuf::from("_/b"));
        assert_eq!(sanitize_relative_path("//a//b"), PathBuf::from("a/b"));
    }

    #[test]
    fn test_sanitize_fully_cancelled_path_uses_placeholder() {
        assert_eq!(
            sanitize_relative_path("/a/.."),
            PathBuf::from("downloaded_file")
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let url = "http://h/x/../y/z.dat";
        for preserve in [false, true] {
            let first = resolve_destination(url, &out(), preserve);
            let second = resolve_destination(url, &out(), preserve);
            assert_eq!(first, second);
        }
    }
}
