//! JSON document source.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::SourceError;
use super::insert_if_valid;

/// Reads URLs from a JSON document.
///
/// See [`extract_json_urls`] for how the document is walked. A missing file
/// or malformed document is logged and yields an empty set.
#[must_use]
#[instrument(fields(path = %path.display()))]
pub fn load_from_json(path: &Path, key: Option<&str>) -> BTreeSet<String> {
    try_load_from_json(path, key).unwrap_or_else(|e| {
        warn!(error = %e, "JSON source not loaded");
        BTreeSet::new()
    })
}

fn try_load_from_json(path: &Path, key: Option<&str>) -> Result<BTreeSet<String>, SourceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extract_json_urls(&document, key))
}

/// Extracts URLs from a parsed JSON document.
///
/// - A top-level array whose elements are all strings contributes them,
///   whether or not a key is given.
/// - Any other top-level array resolves the key-path in each object element;
///   without a key it contributes nothing.
/// - A top-level object with a key resolves the key-path once.
/// - A top-level object without a key contributes every top-level string
///   value and the strings of every top-level array value.
///
/// The key-path is dot-separated and descends through objects only. A
/// resolved string is one candidate; a resolved array contributes its string
/// elements. Anything else contributes nothing. An empty key counts as no key.
#[must_use]
pub fn extract_json_urls(document: &Value, key: Option<&str>) -> BTreeSet<String> {
    let key = key.filter(|k| !k.is_empty());
    let mut urls = BTreeSet::new();

    match (document, key) {
        (Value::Array(items), _) if items.iter().all(Value::is_string) => {
            collect_strings(&mut urls, items);
        }
        (Value::Array(items), Some(key)) => {
            for item in items {
                if let Some(found) = resolve_key_path(item, key) {
                    collect_value(&mut urls, found);
                }
            }
        }
        (Value::Array(_), None) => debug!("JSON list is not all strings and no key given"),
        (Value::Object(_), Some(key)) => match resolve_key_path(document, key) {
            Some(found) => collect_value(&mut urls, found),
            None => debug!(key, "JSON key-path not found"),
        },
        (Value::Object(map), None) => {
            for value in map.values() {
                collect_value(&mut urls, value);
            }
        }
        _ => debug!("JSON document is neither an object nor an array"),
    }
    urls
}

fn resolve_key_path<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

fn collect_value(urls: &mut BTreeSet<String>, value: &Value) {
    match value {
        Value::String(candidate) => insert_if_valid(urls, candidate, "json"),
        Value::Array(items) => collect_strings(urls, items),
        _ => {}
    }
}

fn collect_strings(urls: &mut BTreeSet<String>, items: &[Value]) {
    for candidate in items.iter().filter_map(Value::as_str) {
        insert_if_valid(urls, candidate, "json");
    }
}
