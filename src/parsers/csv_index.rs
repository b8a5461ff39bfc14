//! CSV index resolution.
//!
//! Open-data portals publish an index CSV listing their datasets. This module
//! finds the row whose description mentions a track product and returns the
//! link stored in that row.

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use super::decode::decode_text;
use crate::error::{Error, Result};

/// Descriptions that identify a typhoon track product.
pub const DEFAULT_TRACK_KEYWORDS: &[&str] = &[
    "typhoon track",
    "tropical cyclone",
    "forecast track",
    "颱風路徑",
    "颱風警報",
    "熱帶氣旋",
    "路徑潛勢",
];

// ---

/// Header names accepted for the link and description columns.
#[derive(Debug, Clone)]
pub struct IndexColumns {
    pub link: Vec<String>,
    pub description: Vec<String>,
}

impl Default for IndexColumns {
    fn default() -> Self {
        // ---
        let names = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            link: names(&["data link", "datalink", "link", "url", "資料連結", "檔案連結", "下載連結"]),
            description: names(&["description", "title", "資料說明", "說明", "資料名稱", "資料集名稱"]),
        }
    }
}

/// Decode index bytes: UTF-8 (with or without BOM) first, then Big5.
pub fn decode_index(bytes: &[u8]) -> Result<Cow<'_, str>> {
    decode_text(bytes, None, "CSV index")
}

/// Resolve the link of the first row whose description matches a keyword,
/// using the default header names.
pub fn resolve_csv_link(bytes: &[u8], keywords: &[&str]) -> Result<Option<String>> {
    resolve_csv_link_with(bytes, keywords, &IndexColumns::default())
}

/// Resolve a link from raw index bytes.
///
/// Returns `Ok(None)` when no row matches; that means "no current data", not
/// a failure. Fails with [`Error::MissingColumn`] when either column is absent
/// and [`Error::Encoding`] when the bytes cannot be decoded.
pub fn resolve_csv_link_with(
    bytes: &[u8],
    keywords: &[&str],
    columns: &IndexColumns,
) -> Result<Option<String>> {
    // ---
    let text = decode_index(bytes)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let link_idx = find_column(&headers, &columns.link)
        .ok_or_else(|| Error::MissingColumn(columns.link.first().cloned().unwrap_or_default()))?;
    let description_idx = find_column(&headers, &columns.description).ok_or_else(|| {
        Error::MissingColumn(columns.description.first().cloned().unwrap_or_default())
    })?;

    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    let needed = link_idx.max(description_idx) + 1;

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable CSV index row {}: {}", row + 2, e);
                continue;
            }
        };
        if record.len() < needed {
            debug!("Skipping short CSV index row {}", row + 2);
            continue;
        }

        let description = record[description_idx].to_lowercase();
        if keywords.iter().any(|k| description.contains(k.as_str())) {
            let link = record[link_idx].to_string();
            info!("CSV index matched row {}: {}", row + 2, link);
            return Ok(Some(link));
        }
    }

    info!("CSV index has no row matching the track keywords");
    Ok(None)
}

/// Position of the header matching the earliest possible candidate name.
fn find_column(headers: &StringRecord, candidates: &[String]) -> Option<usize> {
    // ---
    let normalize = |s: &str| s.trim_start_matches('\u{feff}').trim().to_lowercase();

    candidates.iter().find_map(|c| {
        let wanted = normalize(c);
        headers.iter().position(|h| normalize(h) == wanted)
    })
}
