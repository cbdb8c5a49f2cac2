//! Best-effort link scraping from a page's navigation chrome.

use std::collections::HashSet;

use docgrab_fetch::FetchClient;
use docgrab_shared::{SiteTarget, normalize_url};
use ego_tree::iter::Edge;
use scraper::{Html, Node};
use tracing::{debug, instrument};
use url::Url;

use crate::scope::{in_scope, without_fragment};

/// Class/id fragments that mark an element as navigation.
const NAV_KEYWORDS: &[&str] = &["sidebar", "menu", "nav", "toc", "docs", "navigation"];

/// Subtrees whose links are never collected.
const SKIPPED: &[&str] = &["script", "style", "noscript"];

/// Fetch the base page and scrape its navigation links.
#[instrument(skip_all, fields(base = %target.base_url))]
pub async fn probe_navigation(client: &FetchClient, target: &SiteTarget) -> Vec<Url> {
    let Some(page) = client.fetch(&target.base_url).await else {
        debug!("base page unreachable");
        return Vec::new();
    };
    if !page.is_ok() {
        debug!(status = page.status_code, "base page unusable");
        return Vec::new();
    }

    extract_nav_links(&page.decode(), target)
}

fn is_nav_element(name: &str, class: &str, id: &str) -> bool {
    if name == "nav" || name == "aside" {
        return true;
    }
    let blob = format!("{class} {id}").to_ascii_lowercase();
    NAV_KEYWORDS.iter().any(|keyword| blob.contains(keyword))
}

/// Walk the document in order, keeping an ancestry stack; every `<a href>`
/// with a navigation ancestor is a candidate.
pub fn extract_nav_links(html: &str, target: &SiteTarget) -> Vec<Url> {
    let document = Html::parse_document(html);
    // relative hrefs resolve against the base treated as a directory
    let Ok(base_dir) = Url::parse(&format!("{}/", target.base_url)) else {
        return Vec::new();
    };

    let mut ancestry: Vec<bool> = Vec::new();
    let mut skip_depth = 0usize;
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => {
                let Node::Element(element) = node.value() else {
                    continue;
                };
                let name = element.name();
                if SKIPPED.contains(&name) {
                    skip_depth += 1;
                    continue;
                }
                if skip_depth > 0 {
                    continue;
                }

                let marks_nav = is_nav_element(
                    name,
                    element.attr("class").unwrap_or(""),
                    element.attr("id").unwrap_or(""),
                );
                ancestry.push(marks_nav);

                if name != "a" || !ancestry.iter().any(|nav| *nav) {
                    continue;
                }
                let Some(url) = element.attr("href").and_then(|href| resolve(href, &base_dir))
                else {
                    continue;
                };
                if in_scope(&url, target) && seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
            Edge::Close(node) => {
                let Node::Element(element) = node.value() else {
                    continue;
                };
                if SKIPPED.contains(&element.name()) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 {
                    ancestry.pop();
                }
            }
        }
    }

    debug!(count = links.len(), "navigation links");
    links
}

/// Resolve an href to an absolute URL, dropping fragment-only and `javascript:` links.
fn resolve(href: &str, base_dir: &Url) -> Option<Url> {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();
    if href.is_empty() || href.starts_with('#') || lowered.starts_with("javascript:") {
        return None;
    }
    let joined = without_fragment(base_dir.join(href).ok()?);
    Url::parse(&normalize_url(joined.as_str())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(html: &str, base: &str) -> Vec<String> {
        let target = SiteTarget::from_input(base).unwrap();
        extract_nav_links(html, &target)
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn collects_links_inside_nav_and_keyword_containers() {
        let html = r##"<html><body>
            <nav><a href="/docs/intro">Intro</a></nav>
            <div class="Sidebar-Wrapper"><ul><li><a href="setup">Setup</a></li></ul></div>
            <div id="toc"><a href="/docs/api#methods">API</a></div>
            <main><a href="/docs/not-nav">Body link</a></main>
        </body></html>"##;

        assert_eq!(
            links(html, "https://example.com/docs"),
            vec![
                "https://example.com/docs/intro",
                "https://example.com/docs/setup",
                "https://example.com/docs/api",
            ]
        );
    }

    #[test]
    fn drops_fragments_javascript_and_off_scope() {
        let html = r##"<aside>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">Toggle</a>
            <a href="https://other.com/docs/x">Other</a>
            <a href="/blog/post">Blog</a>
            <a href="/docs/guide/">Guide</a>
            <a href="/docs/guide">Guide again</a>
            <a>No href</a>
        </aside>"##;

        assert_eq!(
            links(html, "https://example.com/docs"),
            vec!["https://example.com/docs/guide"]
        );
    }

    #[test]
    fn ignores_script_subtrees_and_pops_ancestry() {
        let html = r##"<body>
            <nav><script>var a = '<a href="/docs/hidden">x</a>';</script></nav>
            <div class="content"><a href="/docs/body">Body</a></div>
        </body>"##;

        assert!(links(html, "https://example.com/docs").is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        assert!(is_nav_element("div", "DocsLayout", ""));
        assert!(is_nav_element("ul", "", "main-menu"));
        assert!(is_nav_element("aside", "", ""));
        assert!(!is_nav_element("div", "content", "article"));
    }
}
