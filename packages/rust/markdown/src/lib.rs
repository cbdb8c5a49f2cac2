//! HTML to text conversion.
//!
//! Two converters share one document-order walk over the parsed tree:
//!
//! - [`html_to_markdownish`] keeps headings (`#`), list markers, fenced
//!   `pre` blocks and inline code, after stripping page chrome.
//! - [`html_to_plain_text`] produces flat paragraphs separated by single
//!   blank lines, for indexers that want no markup at all.

mod cleanup;
mod markdownish;
mod plain;
mod prefilter;
mod walk;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use markdownish::MarkdownWriter;
use plain::PlainWriter;
use walk::walk;

pub use prefilter::{extract_main_html, prefilter, strip_chrome};

/// Convert an HTML page to markdown-ish text.
///
/// `<nav>`, `<aside>` and `<footer>` are removed and the input is narrowed to
/// the longest `<main>`/`<article>` when present. The result is trimmed and
/// ends with exactly one newline.
#[instrument(skip_all, fields(len = html.len()))]
pub fn html_to_markdownish(html: &str) -> String {
    let content = prefilter(html);

    let mut writer = MarkdownWriter::default();
    walk(&content, &mut writer);
    let text = cleanup::run_pipeline(&writer.finish());

    debug!(out_len = text.len(), "markdown-ish conversion complete");
    text
}

/// Convert an HTML page to flat text: whitespace collapsed per line, blank
/// lines squeezed to one. Returns an empty string for a page with no text.
#[instrument(skip_all, fields(len = html.len()))]
pub fn html_to_plain_text(html: &str) -> String {
    let mut writer = PlainWriter::default();
    walk(html, &mut writer);
    cleanup::flatten_lines(&writer.finish())
}

/// Text of the document's `<title>`, whitespace collapsed. `None` when absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?.text().collect::<String>();
    let title = cleanup::collapse_whitespace(&title).trim().to_string();
    (!title.is_empty()).then_some(title)
}
