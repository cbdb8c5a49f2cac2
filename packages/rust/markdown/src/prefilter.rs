//! Regex-level chrome removal applied before parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Page chrome removed wholesale: `<nav>`, `<aside>` and `<footer>` subtrees.
static CHROME_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["nav", "aside", "footer"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}>")).expect("chrome regex"))
        .collect()
});

/// Content containers considered for narrowing.
static CONTENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["main", "article"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}>")).expect("content regex")
        })
        .collect()
});

/// Strip chrome, then narrow to the longest `<main>`/`<article>` body when one exists.
pub fn prefilter(html: &str) -> String {
    let stripped = strip_chrome(html);
    extract_main_html(&stripped)
        .map(str::to_string)
        .unwrap_or(stripped)
}

/// Remove `<nav>`, `<aside>` and `<footer>` subtrees (non-greedy, best effort).
pub fn strip_chrome(html: &str) -> String {
    CHROME_RES
        .iter()
        .fold(html.to_string(), |acc, re| re.replace_all(&acc, " ").into_owned())
}

/// Inner HTML of the longest `<main>` or `<article>` element, if any.
pub fn extract_main_html(html: &str) -> Option<&str> {
    CONTENT_RES
        .iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .max_by_key(|inner| inner.len())
}
