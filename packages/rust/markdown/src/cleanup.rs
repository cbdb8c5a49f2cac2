//! Post-conversion cleanup passes.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Run the markdown-ish cleanup pipeline.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = trim_trailing_whitespace(text);
    result = clean_blank_lines(&result);
    ensure_trailing_newline(result.trim())
}

/// Collapse every whitespace run to a single space.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 1: Trailing whitespace
// ---------------------------------------------------------------------------

/// Drop spaces and tabs sitting before a newline.
fn trim_trailing_whitespace(text: &str) -> String {
    static TRAILING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex"));

    TRAILING_RE.replace_all(text, "\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 4+ newlines into exactly two blank lines.
fn clean_blank_lines(text: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(text, "\n\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Trailing newline
// ---------------------------------------------------------------------------

/// Ensure the text ends with exactly one newline.
fn ensure_trailing_newline(text: &str) -> String {
    let trimmed = text.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Flat text
// ---------------------------------------------------------------------------

/// Collapse whitespace per line, trim each line and keep at most one blank
/// line between paragraphs. Empty input stays empty.
pub(crate) fn flatten_lines(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = collapse_whitespace(line).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        } else if lines.last().is_some_and(|last| !last.is_empty()) {
            lines.push(String::new());
        }
    }

    let joined = lines.join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        String::new()
    } else {
        format!("{joined}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_whitespace_is_trimmed() {
        assert_eq!(trim_trailing_whitespace("a  \nb\t\nc"), "a\nb\nc");
    }

    #[test]
    fn blank_lines_collapse_to_two() {
        assert_eq!(clean_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(clean_blank_lines("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn trailing_newline_normalized() {
        assert_eq!(ensure_trailing_newline("x"), "x\n");
        assert_eq!(ensure_trailing_newline("x\n\n\n"), "x\n");
    }

    #[test]
    fn pipeline_trims_and_terminates() {
        assert_eq!(run_pipeline("\n\n  Title \n\n\n\n\nBody\n\n"), "Title\n\n\nBody\n");
        assert_eq!(run_pipeline(""), "\n");
    }

    #[test]
    fn flatten_keeps_single_blank_lines() {
        assert_eq!(
            flatten_lines("\n  a   b \n\n\n\n c\n- d\n\n"),
            "a b\n\nc\n- d\n"
        );
        assert_eq!(flatten_lines(" \n\t\n"), "");
    }
}
