//! Constants for the download module.

use std::time::Duration;

/// Upper bound on the TCP connect phase of a request.
///
/// The configured request timeout still bounds the whole attempt; this only
/// keeps an unreachable host from holding a fetch slot for the full timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name used when a URL path has no basename (e.g. ends in `/`).
pub const PLACEHOLDER_FILENAME: &str = "downloaded_file";

/// Segment substituted for `..` segments that would escape the output root.
pub const TRAVERSAL_REPLACEMENT: &str = "_";
