//! Markdown-ish writer: headings, list markers, fenced `pre` and inline code.

use crate::cleanup::collapse_whitespace;
use crate::walk::HtmlSink;

/// Tags that open and close a paragraph.
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
    "table",
    "tr",
    "ul",
    "ol",
    "blockquote",
];

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct MarkdownWriter {
    out: String,
    in_pre: bool,
    in_inline_code: bool,
    pending_heading: Option<usize>,
    list_marker_pending: bool,
}

impl MarkdownWriter {
    pub(crate) fn finish(self) -> String {
        self.out
    }

    /// Emit the heading prefix if one is armed; at most once per heading.
    fn begin_content(&mut self) {
        if let Some(level) = self.pending_heading.take() {
            self.out.push_str(&"#".repeat(level.clamp(1, 6)));
            self.out.push(' ');
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }
}

impl HtmlSink for MarkdownWriter {
    fn open(&mut self, tag: &str) {
        if let Some(level) = heading_level(tag) {
            self.out.push_str("\n\n");
            self.pending_heading = Some(level);
            return;
        }
        match tag {
            "br" => self.out.push('\n'),
            "li" => {
                self.out.push_str("\n- ");
                self.list_marker_pending = true;
            }
            "pre" => {
                self.in_pre = true;
                self.out.push_str("\n\n```text\n");
            }
            "code" if !self.in_pre => {
                self.begin_content();
                self.in_inline_code = true;
                self.out.push('`');
            }
            _ if BLOCK_TAGS.contains(&tag) => self.out.push_str("\n\n"),
            _ => {}
        }
    }

    fn close(&mut self, tag: &str) {
        if heading_level(tag).is_some() {
            self.out.push_str("\n\n");
            self.pending_heading = None;
            return;
        }
        match tag {
            "li" => self.out.push('\n'),
            "pre" => {
                self.in_pre = false;
                self.out.push_str("\n```\n\n");
            }
            "code" if self.in_inline_code => {
                self.in_inline_code = false;
                self.out.push('`');
            }
            _ if BLOCK_TAGS.contains(&tag) => self.out.push_str("\n\n"),
            _ => {}
        }
    }

    fn text(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if self.in_pre {
            self.out.push_str(data);
            return;
        }

        let collapsed = collapse_whitespace(data);
        let mut chunk = collapsed.as_str();

        if self.pending_heading.is_some() {
            chunk = chunk.trim_start();
            if chunk.is_empty() {
                return;
            }
            self.begin_content();
        }
        if self.list_marker_pending || self.at_line_start() {
            chunk = chunk.trim_start();
        }
        if chunk.is_empty() {
            return;
        }

        self.list_marker_pending = false;
        self.out.push_str(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::walk;

    fn raw(html: &str) -> String {
        let mut writer = MarkdownWriter::default();
        walk(html, &mut writer);
        writer.finish()
    }

    #[test]
    fn heading_prefix_written_once_across_chunks() {
        let out = raw("<h3>Hello <em>big</em> world</h3>");
        assert_eq!(out.matches("###").count(), 1);
        assert!(out.contains("### Hello big world"));
    }

    #[test]
    fn heading_levels_are_mapped() {
        assert!(raw("<h1>A</h1>").contains("# A"));
        assert!(raw("<h6>F</h6>").contains("###### F"));
    }

    #[test]
    fn inline_code_inside_heading_follows_prefix() {
        assert!(raw("<h2><code>run()</code></h2>").contains("## `run()`"));
    }

    #[test]
    fn list_items_have_clean_markers() {
        let out = raw("<ul>\n  <li>\n    one  </li><li><a href=x>two</a></li></ul>");
        assert!(out.contains("\n- one"));
        assert!(out.contains("\n- two"));
        assert!(!out.contains("-  "));
    }

    #[test]
    fn pre_is_fenced_and_literal() {
        let out = raw("<pre><code>fn main() {\n    x  =  1;\n}</code></pre>");
        assert!(out.contains("```text\nfn main() {\n    x  =  1;\n}\n```"));
        assert!(!out.contains("`fn"));
    }

    #[test]
    fn br_breaks_line() {
        assert!(raw("<p>a<br>b</p>").contains("a\nb"));
    }
}
