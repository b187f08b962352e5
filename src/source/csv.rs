//! CSV column source.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use ::csv::ReaderBuilder;
use tracing::{debug, instrument, warn};

use super::error::SourceError;
use super::insert_if_valid;

/// Reads URLs from the column named `column` of a headed CSV file.
///
/// The column is matched exactly against the header row. Rows that are too
/// short or fail to parse are skipped. A missing file or missing column is
/// logged and yields an empty set.
#[must_use]
#[instrument(fields(path = %path.display()))]
pub fn load_from_csv(path: &Path, column: &str) -> BTreeSet<String> {
    try_load_from_csv(path, column).unwrap_or_else(|e| {
        warn!(error = %e, "CSV source not loaded");
        BTreeSet::new()
    })
}

fn try_load_from_csv(path: &Path, column: &str) -> Result<BTreeSet<String>, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let Some(index) = headers.iter().position(|name| name == column) else {
        return Err(SourceError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        });
    };

    let mut urls = BTreeSet::new();
    for (row, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                if let Some(value) = record.get(index) {
                    insert_if_valid(&mut urls, value, "csv");
                }
            }
            Err(e) => debug!(row = row + 1, error = %e, "skipped malformed CSV row"),
        }
    }
    Ok(urls)
}
