//! Literal lists and line-delimited sources (files and standard input).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{instrument, warn};

use super::error::SourceError;
use super::insert_if_valid;

/// Validates each literal URL.
#[must_use]
pub fn load_from_list<I, S>(candidates: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut urls = BTreeSet::new();
    for candidate in candidates {
        insert_if_valid(&mut urls, candidate.as_ref(), "list");
    }
    urls
}

/// Reads one URL per line from `path`.
///
/// Lines are trimmed and blank lines skipped. A missing or unopenable file is
/// logged and yields an empty set; a read error part way through keeps the
/// URLs read before it.
#[must_use]
#[instrument(fields(path = %path.display()))]
pub fn load_from_file(path: &Path) -> BTreeSet<String> {
    try_load_from_file(path).unwrap_or_else(|e| {
        warn!(error = %e, "URL file not loaded");
        BTreeSet::new()
    })
}

fn try_load_from_file(path: &Path) -> Result<BTreeSet<String>, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
    Ok(read_lines(BufReader::new(file), "file"))
}

/// Reads one URL per line from standard input until end-of-stream.
///
/// The read runs on the blocking thread pool.
pub async fn load_from_stdin() -> BTreeSet<String> {
    read_blocking(|| load_from_reader(io::stdin().lock())).await
}

/// Reads one URL per line from any buffered reader.
///
/// A read error stops reading; URLs collected before it are kept.
#[must_use]
pub fn load_from_reader<R: BufRead>(reader: R) -> BTreeSet<String> {
    read_lines(reader, "stdin")
}

async fn read_blocking<F>(read: F) -> BTreeSet<String>
where
    F: FnOnce() -> BTreeSet<String> + Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "line reader task failed");
            BTreeSet::new()
        })
}

fn read_lines<R: BufRead>(reader: R, origin: &str) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    for line in reader.lines() {
        match line {
            Ok(line) => insert_if_valid(&mut urls, &line, origin),
            Err(e) => {
                warn!(source = origin, error = %e, "stopped reading URLs");
                break;
            }
        }
    }
    urls
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_from_list_dedups_and_filters() {
        let urls = load_from_list([
            "http://a.b/1",
            "http://a.b/1",
            "not a url",
            " https://a.b/2 ",
        ]);
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://a.b/2"));
    }

    #[test]
    fn test_load_from_file_skips_blank_and_invalid_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("urls.txt");
        std::fs::write(
            &path,
            "https://example.com/a\n\n   \n  https://example.com/b  \r\n# comment\nftp://x/y\n",
        )
        .unwrap();

        let urls = load_from_file(&path);
        assert_eq!(
            urls.into_iter().collect::<Vec<_>>(),
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string()
            ]
        );
    }

    #[test]
    fn test_load_from_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load_from_file(&temp.path().join("absent.txt")).is_empty());
    }

    #[test]
    fn test_load_from_file_keeps_urls_before_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("urls.txt");
        std::fs::write(&path, b"https://example.com/a\n\xff\xfe\nhttps://example.com/b\n").unwrap();

        let urls = load_from_file(&path);
        assert_eq!(
            urls.into_iter().collect::<Vec<_>>(),
            vec!["https://example.com/a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_read_blocking_leaves_runtime_free() {
        let (tx, rx) = std::sync::mpsc::channel::<String>();
        let sender = tokio::spawn(async move {
            tx.send("https://example.com/late".to_string()).unwrap();
        });

        // Only completes if the closure runs off the single runtime thread.
        let urls = read_blocking(move || {
            rx.recv_timeout(std::time::Duration::from_secs(5))
                .map(|line| load_from_list([line]))
                .unwrap_or_default()
        })
        .await;

        sender.await.unwrap();
        assert!(urls.contains("https://example.com/late"));
    }

    #[test]
    fn test_load_from_reader_reads_to_end() {
        let input = Cursor::new("http://h/1\nhttp://h/2\nhttp://h/1\n");
        let urls = load_from_reader(input);
        assert_eq!(urls.len(), 2);
    }
}
