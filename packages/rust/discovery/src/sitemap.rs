//! `sitemap.xml` probing with one level of sitemap-index expansion.

use std::collections::{HashSet, VecDeque};

use docgrab_fetch::FetchClient;
use docgrab_shared::{DocgrabError, Result, SiteTarget, normalize_url};
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use tracing::{debug, info, instrument};
use url::Url;

use crate::scope::{in_scope, without_fragment};

/// Index documents are expanded this many levels deep; deeper indices are ignored.
const MAX_INDEX_DEPTH: u8 = 1;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations.
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of further sitemap documents.
    Index(Vec<String>),
}

/// Parse sitemap XML, matching elements in the root element's namespace.
///
/// Only `<loc>` children of `<url>` (or `<sitemap>` in an index) that share
/// the root's namespace are collected. Any other root element is an error.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<(Vec<u8>, bool)> = None; // (namespace, is_index)
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| DocgrabError::parse(format!("sitemap XML: {e}")))?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => ns.as_ref().to_vec(),
            _ => Vec::new(),
        };

        match event {
            Event::Start(start) => {
                let local = start.local_name().as_ref().to_vec();
                if root.is_none() {
                    let is_index = match local.as_slice() {
                        b"urlset" => false,
                        b"sitemapindex" => true,
                        other => {
                            return Err(DocgrabError::parse(format!(
                                "not a sitemap: root element <{}>",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    };
                    root = Some((namespace, is_index));
                } else if root.as_ref().is_some_and(|(ns, _)| *ns != namespace) {
                    // foreign namespace: keep depth, never matches
                    stack.push(Vec::new());
                    continue;
                }
                stack.push(local);
                current.clear();
            }
            Event::End(_) => {
                if let (Some((_, is_index)), Some(name)) = (&root, stack.last()) {
                    let entry: &[u8] = if *is_index { b"sitemap" } else { b"url" };
                    let in_entry = stack.len() == 3 && stack[1] == entry;
                    if in_entry && name == b"loc" {
                        let loc = current.trim();
                        if !loc.is_empty() {
                            locs.push(loc.to_string());
                        }
                    }
                }
                stack.pop();
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DocgrabError::parse(format!("sitemap XML: {e}")))?;
                current.push_str(&text);
            }
            Event::CData(data) => {
                current.push_str(&String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        Some((_, true)) => Ok(SitemapDocument::Index(locs)),
        Some((_, false)) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(DocgrabError::parse("empty sitemap document")),
    }
}

/// Candidate sitemap locations in probe order, duplicates removed.
fn sitemap_candidates(target: &SiteTarget) -> Vec<String> {
    let mut candidates = Vec::new();
    for name in ["sitemap.xml", "sitemap.xml.gz"] {
        for dir in [&target.base_url, &target.root_url] {
            let url = format!("{dir}/{name}");
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }
    candidates
}

/// Fetch and parse one sitemap document. Failures are logged and yield `None`.
async fn fetch_document(client: &FetchClient, url: &str) -> Option<SitemapDocument> {
    let result = client.fetch(url).await?;
    if !result.is_ok() {
        debug!(url, status = result.status_code, "no sitemap");
        return None;
    }
    match parse_sitemap(&result.decode()) {
        Ok(document) => Some(document),
        Err(e) => {
            debug!(url, error = %e, "sitemap did not parse");
            None
        }
    }
}

/// Probe the well-known sitemap locations and return in-scope page URLs in
/// discovery order.
#[instrument(skip_all, fields(base = %target.base_url))]
pub async fn probe_sitemap(client: &FetchClient, target: &SiteTarget) -> Vec<Url> {
    let mut root_document = None;
    for candidate in sitemap_candidates(target) {
        if let Some(document) = fetch_document(client, &candidate).await {
            info!(url = %candidate, "using sitemap");
            root_document = Some(document);
            break;
        }
    }

    let locs = match root_document {
        None => return Vec::new(),
        Some(SitemapDocument::UrlSet(locs)) => locs,
        Some(SitemapDocument::Index(children)) => expand_index(client, children).await,
    };

    filter_locations(locs, target)
}

/// Expand sitemap-index children with an explicit depth-bounded worklist.
async fn expand_index(client: &FetchClient, children: Vec<String>) -> Vec<String> {
    let mut pending: VecDeque<(String, u8)> =
        children.into_iter().map(|loc| (loc, 1)).collect();
    let mut locs = Vec::new();

    while let Some((url, depth)) = pending.pop_front() {
        match fetch_document(client, &url).await {
            Some(SitemapDocument::UrlSet(found)) => {
                debug!(%url, count = found.len(), "child sitemap");
                locs.extend(found);
            }
            Some(SitemapDocument::Index(nested)) if depth < MAX_INDEX_DEPTH => {
                pending.extend(nested.into_iter().map(|loc| (loc, depth + 1)));
            }
            Some(SitemapDocument::Index(_)) => {
                debug!(%url, "nested sitemap index not followed");
            }
            None => {}
        }
    }

    locs
}

/// Normalize, scope-filter and deduplicate sitemap locations, keeping order.
fn filter_locations(locs: Vec<String>, target: &SiteTarget) -> Vec<Url> {
    let mut seen = HashSet::new();
    locs.iter()
        .filter_map(|loc| Url::parse(&normalize_url(loc)).ok())
        .map(without_fragment)
        .filter(|url| in_scope(url, target))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/docs/intro</loc>
    <image:image><image:loc>https://example.com/img.png</image:loc></image:image>
  </url>
  <url><loc> https://example.com/docs/setup/ </loc><lastmod>2024-01-01</lastmod></url>
</urlset>"#;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-2.xml</loc></sitemap>
</sitemapindex>"#;

    #[test]
    fn parses_urlset_in_root_namespace_only() {
        let doc = parse_sitemap(URLSET).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::UrlSet(vec![
                "https://example.com/docs/intro".into(),
                "https://example.com/docs/setup/".into(),
            ])
        );
    }

    #[test]
    fn parses_index() {
        let SitemapDocument::Index(children) = parse_sitemap(INDEX).unwrap() else {
            panic!("expected index");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], "https://example.com/sitemap-2.xml");
    }

    #[test]
    fn parses_without_namespace() {
        let doc = parse_sitemap("<urlset><url><loc>https://a.dev/x</loc></url></urlset>").unwrap();
        assert_eq!(doc, SitemapDocument::UrlSet(vec!["https://a.dev/x".into()]));
    }

    #[test]
    fn rejects_html_and_garbage() {
        assert!(parse_sitemap("<html><body>404</body></html>").is_err());
        assert!(parse_sitemap("").is_err());
        assert!(parse_sitemap("<urlset><url><loc>x</url></urlset>").is_err());
    }

    #[test]
    fn candidates_deduplicate_at_root() {
        let root = SiteTarget::from_input("https://example.com").unwrap();
        assert_eq!(
            sitemap_candidates(&root),
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap.xml.gz"
            ]
        );

        let docs = SiteTarget::from_input("https://example.com/docs").unwrap();
        assert_eq!(sitemap_candidates(&docs).len(), 4);
        assert_eq!(sitemap_candidates(&docs)[0], "https://example.com/docs/sitemap.xml");
    }

    #[test]
    fn filter_keeps_order_and_scope() {
        let target = SiteTarget::from_input("https://example.com/docs").unwrap();
        let locs = vec![
            "https://example.com/docs/b".to_string(),
            "https://example.com/docs/a/".to_string(),
            "https://example.com/docsearch".to_string(),
            "https://other.com/docs/c".to_string(),
            "https://example.com/docs/b#top".to_string(),
            "https://example.com/docs/a".to_string(),
        ];
        let urls: Vec<_> = filter_locations(locs, &target)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            urls,
            vec!["https://example.com/docs/b", "https://example.com/docs/a"]
        );
    }
}
