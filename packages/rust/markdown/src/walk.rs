//! Document-order event stream over a parsed HTML tree.

use ego_tree::iter::Edge;
use scraper::{Html, Node};

/// Subtrees that never produce output.
const SKIPPED: &[&str] = &["script", "style", "noscript", "head", "template"];

/// Receives open/close/text events in document order.
pub(crate) trait HtmlSink {
    fn open(&mut self, tag: &str);
    fn close(&mut self, tag: &str);
    fn text(&mut self, data: &str);
}

/// Parse `html` and replay it into `sink`, suppressing skipped subtrees.
///
/// Tag names arrive lowercased and character references are already decoded.
pub(crate) fn walk(html: &str, sink: &mut impl HtmlSink) {
    let document = Html::parse_document(html);
    let mut skip_depth = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) => {
                    let tag = element.name();
                    if SKIPPED.contains(&tag) {
                        skip_depth += 1;
                    } else if skip_depth == 0 {
                        sink.open(tag);
                    }
                }
                Node::Text(text) if skip_depth == 0 => sink.text(text),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    let tag = element.name();
                    if SKIPPED.contains(&tag) {
                        skip_depth = skip_depth.saturating_sub(1);
                    } else if skip_depth == 0 {
                        sink.close(tag);
                    }
                }
            }
        }
    }
}
