//! Sitemap XML source, local or remote.

use std::collections::BTreeSet;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{instrument, warn};

use super::error::SourceError;
use super::{insert_if_valid, is_valid_url};
use crate::download::HttpClient;

/// Reads URLs from the `<loc>` elements of a sitemap.
///
/// `origin` is fetched with `client` when it is a valid URL and read from
/// disk otherwise. Any fetch, read, or parse failure is logged and yields an
/// empty set.
#[instrument(skip(client))]
pub async fn load_from_sitemap(origin: &str, client: &HttpClient) -> BTreeSet<String> {
    match try_load_from_sitemap(origin, client).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "sitemap not loaded");
            BTreeSet::new()
        }
    }
}

async fn try_load_from_sitemap(
    origin: &str,
    client: &HttpClient,
) -> Result<BTreeSet<String>, SourceError> {
    let body = if is_valid_url(origin) {
        client.fetch(origin).await?
    } else {
        tokio::fs::read(origin)
            .await
            .map_err(|e| SourceError::io(origin, e))?
    };
    let locs = extract_sitemap_locs(&body).map_err(|e| SourceError::xml(origin, e))?;

    let mut urls = BTreeSet::new();
    for loc in &locs {
        insert_if_valid(&mut urls, loc, "sitemap");
    }
    Ok(urls)
}

/// Returns the text of every element whose tag name ends in `loc`.
///
/// Matching ignores case and works with or without a namespace prefix. Only
/// the text before an element's first child is taken.
///
/// # Errors
///
/// Returns the parser error if the document is not well-formed.
pub fn extract_sitemap_locs(document: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(document);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                locs.extend(current.take());
                if is_loc_tag(e.name().as_ref()) {
                    current = Some(String::new());
                }
            }
            Event::Text(t) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Empty(_) | Event::End(_) => locs.extend(current.take()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(locs)
}

fn is_loc_tag(name: &[u8]) -> bool {
    name.len() >= 3 && name[name.len() - 3..].eq_ignore_ascii_case(b"loc")
}
