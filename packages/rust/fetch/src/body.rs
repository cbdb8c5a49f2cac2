//! Body classification, gzip unwrapping and charset decoding.

use std::io::Read;
use std::sync::LazyLock;

use encoding_rs::Encoding;
use flate2::read::GzDecoder;
use regex::Regex;

use crate::headers::Headers;

/// Bytes inspected when sniffing for NUL.
const SNIFF_LEN: usize = 2048;

static CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*"?([A-Za-z0-9._:-]+)"#).expect("charset regex")
});

/// Whether a body is treated as text or stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Text,
    Binary,
}

/// Textual when the content type names text, JSON or XML; otherwise textual
/// unless a NUL byte shows up in the first 2 KiB.
pub fn looks_textlike(headers: &Headers, body: &[u8]) -> bool {
    let content_type = headers.content_type().to_ascii_lowercase();
    if ["text/", "application/json", "application/xml", "application/xhtml"]
        .iter()
        .any(|marker| content_type.contains(marker))
    {
        return true;
    }

    !body[..body.len().min(SNIFF_LEN)].contains(&0)
}

/// Classify a body with [`looks_textlike`].
pub fn classify(headers: &Headers, body: &[u8]) -> BodyKind {
    if looks_textlike(headers, body) {
        BodyKind::Text
    } else {
        BodyKind::Binary
    }
}

/// Decompress the body when the server says it is gzip-encoded, then again
/// when the URL ends in `.gz` and the result is not yet plain XML. A layer
/// that fails to decompress is kept as it is.
pub fn maybe_gunzip(url: &str, headers: &Headers, body: Vec<u8>) -> Vec<u8> {
    let declared = headers
        .get("content-encoding")
        .is_some_and(|enc| enc.to_ascii_lowercase().contains("gzip"));

    let mut body = body;
    if declared {
        body = inflate_or_keep(url, body);
    }
    if url.to_ascii_lowercase().ends_with(".gz") && !body.starts_with(b"<?xml") {
        body = inflate_or_keep(url, body);
    }
    body
}

fn inflate_or_keep(url: &str, body: Vec<u8>) -> Vec<u8> {
    match gunzip(&body) {
        Some(inflated) => inflated,
        None => {
            tracing::debug!(url, "gzip decode failed, keeping raw body");
            body
        }
    }
}

fn gunzip(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).ok()?;
    Some(out)
}

/// Charset label declared in a `Content-Type` value, if any.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    CHARSET_RE
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decode with the declared charset, falling back to UTF-8 with replacement
/// characters when the label is missing or unknown.
pub fn decode_bytes(body: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    match encoding {
        Some(encoding) => {
            let (text, _, _) = encoding.decode(body);
            text.into_owned()
        }
        None => String::from_utf8_lossy(body).into_owned(),
    }
}
