//! Flat text writer: line breaks around blocks, no markdown syntax beyond `- ` markers.

use crate::walk::HtmlSink;

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "header",
    "footer",
    "nav",
    "main",
    "aside",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "table",
    "tr",
    "ul",
    "ol",
    "li",
    "pre",
    "code",
    "blockquote",
];

#[derive(Debug, Default)]
pub(crate) struct PlainWriter {
    out: String,
}

impl PlainWriter {
    pub(crate) fn finish(self) -> String {
        self.out
    }
}

impl HtmlSink for PlainWriter {
    fn open(&mut self, tag: &str) {
        if BLOCK_TAGS.contains(&tag) {
            self.out.push('\n');
        }
        match tag {
            "li" => self.out.push_str("- "),
            "br" => self.out.push('\n'),
            _ => {}
        }
    }

    fn close(&mut self, tag: &str) {
        if BLOCK_TAGS.contains(&tag) {
            self.out.push('\n');
        }
    }

    fn text(&mut self, data: &str) {
        self.out.push_str(data);
    }
}
