//! Byte-to-text decoding of upstream documents.
//!
//! Upstream portals mix UTF-8 with Big5, the legacy encoding of Taiwanese
//! government sites. A UTF-8 byte order mark always means UTF-8. Otherwise a
//! declared encoding is tried first, then UTF-8, then Big5. Decoding never
//! replaces invalid sequences: a document either decodes cleanly or fails.

use std::borrow::Cow;

use encoding_rs::{Encoding, BIG5, UTF_8};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Only the XML declaration is inspected for an encoding label.
const DECLARATION_LIMIT: usize = 256;

// ---

/// Decode `bytes`, trying `declared` (when given) before UTF-8 and Big5.
///
/// `document` names the input in logs and in [`Error::Encoding`].
pub fn decode_text<'a>(
    bytes: &'a [u8],
    declared: Option<&'static Encoding>,
    document: &'static str,
) -> Result<Cow<'a, str>> {
    // ---
    let candidates: Vec<&'static Encoding> = match bytes.strip_prefix(UTF8_BOM) {
        Some(_) => vec![UTF_8],
        None => {
            let mut list: Vec<&'static Encoding> = declared.into_iter().collect();
            for fallback in [UTF_8, BIG5] {
                if !list.contains(&fallback) {
                    list.push(fallback);
                }
            }
            list
        }
    };
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    for encoding in candidates.iter().copied() {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            if encoding != UTF_8 {
                debug!("Decoded {} as {}", document, encoding.name());
            }
            return Ok(text);
        }
    }

    let tried: Vec<&str> = candidates.iter().map(|e| e.name()).collect();
    warn!("{} could not be decoded as {}", document, tried.join(" or "));
    Err(Error::Encoding {
        document,
        tried: tried.join(", "),
    })
}

/// Decode an XML document, honouring the `encoding` of its declaration.
pub fn decode_xml<'a>(bytes: &'a [u8], document: &'static str) -> Result<Cow<'a, str>> {
    decode_text(bytes, declared_xml_encoding(bytes), document)
}

/// Encoding named by `<?xml ... encoding="..."?>`, when it is one the
/// declaration itself could have been written in.
fn declared_xml_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    // ---
    let head = &bytes[..bytes.len().min(DECLARATION_LIMIT)];
    let head = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let declaration = &head[..head.windows(2).position(|w| w == b"?>")?];

    let start = declaration
        .windows(b"encoding".len())
        .position(|w| w == b"encoding")?
        + b"encoding".len();
    let rest = skip_whitespace(skip_whitespace(&declaration[start..]).strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label = &rest[..rest.iter().position(|&b| b == quote)?];

    Encoding::for_label(label).filter(|e| e.is_ascii_compatible())
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    &bytes[start..]
}
