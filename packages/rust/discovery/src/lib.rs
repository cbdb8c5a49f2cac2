//! Documentation page discovery.
//!
//! Three probes run in priority order and the first one that yields pages
//! wins:
//!
//! 1. `llms.txt` manifests (per <https://llmstxt.org/>), scanned for links.
//! 2. `sitemap.xml` / `sitemap.xml.gz`, with one level of index expansion.
//! 3. Links scraped from the base page's navigation chrome.
//!
//! Manifest files found by the first probe are always returned, even when the
//! page list comes from a later probe or stays empty.

mod manifest;
mod navigation;
mod scope;
mod sitemap;

use std::collections::BTreeMap;

use docgrab_fetch::{FetchClient, FetchResult};
use docgrab_shared::{DiscoveryMethod, SiteTarget};
use tracing::{info, instrument};
use url::Url;

pub use manifest::{
    Candidate, ManifestKind, parse_candidate, probe_manifests, scan_manifest_links,
};
pub use navigation::{extract_nav_links, probe_navigation};
pub use scope::{in_scope, path_within, without_fragment};
pub use sitemap::{SitemapDocument, parse_sitemap, probe_sitemap};

// ---------------------------------------------------------------------------
// DiscoveryResult
// ---------------------------------------------------------------------------

/// Outcome of running the discovery probes against one target.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// The probe that produced `page_urls`.
    pub method: DiscoveryMethod,
    /// In-scope page URLs, deduplicated.
    pub page_urls: Vec<Url>,
    /// Manifest files found, keyed by variant.
    pub manifest_files: BTreeMap<ManifestKind, FetchResult>,
}

impl DiscoveryResult {
    /// A result with no pages and no manifests.
    pub fn empty() -> Self {
        Self {
            method: DiscoveryMethod::None,
            page_urls: Vec::new(),
            manifest_files: BTreeMap::new(),
        }
    }

    pub fn manifest(&self, kind: ManifestKind) -> Option<&FetchResult> {
        self.manifest_files.get(&kind)
    }

    /// Whether the richest manifest (`llms-full.txt`) was found.
    pub fn has_full_manifest(&self) -> bool {
        self.manifest_files.contains_key(&ManifestKind::Full)
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Run the probes in order. Never fails: unreachable or malformed sources
/// simply fall through to the next probe.
#[instrument(skip_all, fields(base = %target.base_url))]
pub async fn discover(client: &FetchClient, target: &SiteTarget) -> DiscoveryResult {
    let manifest_files = probe_manifests(client, target).await;

    if let Some(standard) = manifest_files.get(&ManifestKind::Standard) {
        let page_urls = scan_manifest_links(&standard.decode(), target);
        if !page_urls.is_empty() {
            info!(pages = page_urls.len(), "pages from llms.txt");
            return DiscoveryResult {
                method: DiscoveryMethod::Manifest,
                page_urls,
                manifest_files,
            };
        }
    }

    let page_urls = probe_sitemap(client, target).await;
    if !page_urls.is_empty() {
        info!(pages = page_urls.len(), "pages from sitemap");
        return DiscoveryResult {
            method: DiscoveryMethod::Sitemap,
            page_urls,
            manifest_files,
        };
    }

    let page_urls = probe_navigation(client, target).await;
    if !page_urls.is_empty() {
        info!(pages = page_urls.len(), "pages from navigation");
        return DiscoveryResult {
            method: DiscoveryMethod::Navigation,
            page_urls,
            manifest_files,
        };
    }

    info!(manifests = manifest_files.len(), "no pages discovered");
    DiscoveryResult {
        manifest_files,
        ..DiscoveryResult::empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use docgrab_shared::FetchConfig;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> FetchClient {
        FetchClient::new(FetchConfig {
            timeout: Duration::from_secs(5),
            retries: 0,
            user_agent: "docgrab-test".into(),
        })
        .unwrap()
    }

    async fn serve(server: &MockServer, at: &str, status: u16, body: &str, mime: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), mime))
            .mount(server)
            .await;
    }

    fn target(server: &MockServer, base_path: &str) -> SiteTarget {
        SiteTarget::from_input(&format!("{}{base_path}", server.uri())).unwrap()
    }

    fn paths(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(Url::path).collect()
    }

    #[tokio::test]
    async fn manifest_links_win_and_off_host_links_are_dropped() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/docs/llms.txt",
            200,
            "# Example\n\n- [Intro](/docs/intro)\n\nSee https://other.com/x\n",
            "text/plain",
        )
        .await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::Manifest);
        assert_eq!(paths(&result.page_urls), vec!["/docs/intro"]);
        assert!(result.manifest(ManifestKind::Standard).is_some());
        assert!(!result.has_full_manifest());
    }

    #[tokio::test]
    async fn first_copy_of_each_manifest_is_kept() {
        let server = MockServer::start().await;
        serve(&server, "/docs/llms-full.txt", 200, "# Full at base", "text/plain").await;
        serve(&server, "/llms-full.txt", 200, "# Full at root", "text/plain").await;
        serve(&server, "/llms-small.txt", 200, "# Small at root", "text/plain").await;
        serve(&server, "/docs/llms.txt", 200, "", "text/plain").await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::None);
        assert_eq!(result.manifest_files.len(), 2);
        assert_eq!(
            result.manifest(ManifestKind::Full).unwrap().decode(),
            "# Full at base"
        );
        assert!(result.manifest(ManifestKind::Small).is_some());
        assert!(result.manifest(ManifestKind::Standard).is_none());
    }

    #[tokio::test]
    async fn root_target_also_probes_docs_directory() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/docs/llms.txt",
            200,
            "[Start](/docs/start)\n[Home](/)",
            "text/plain",
        )
        .await;

        let result = discover(&client(), &target(&server, "")).await;

        assert_eq!(result.method, DiscoveryMethod::Manifest);
        assert_eq!(paths(&result.page_urls), vec!["/", "/docs/start"]);
    }

    #[tokio::test]
    async fn sitemap_index_yields_union_of_leaf_sitemaps() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let index = format!(
            r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{uri}/sitemap-a.xml</loc></sitemap>
  <sitemap><loc>{uri}/sitemap-b.xml</loc></sitemap>
  <sitemap><loc>{uri}/sitemap-nested.xml</loc></sitemap>
</sitemapindex>"#
        );
        let leaf = |pages: &[&str]| {
            let urls: String = pages
                .iter()
                .map(|p| format!("<url><loc>{uri}{p}</loc></url>"))
                .collect();
            format!(
                r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}</urlset>"#
            )
        };
        let nested = format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{uri}/sitemap-deep.xml</loc></sitemap>
</sitemapindex>"#
        );

        let xml = "application/xml";
        serve(&server, "/sitemap.xml", 200, &index, xml).await;
        serve(&server, "/sitemap-a.xml", 200, &leaf(&["/docs/a", "/blog/x"]), xml).await;
        serve(&server, "/sitemap-b.xml", 200, &leaf(&["/docs/b", "/docs/a"]), xml).await;
        serve(&server, "/sitemap-nested.xml", 200, &nested, xml).await;
        Mock::given(method("GET"))
            .and(path("/sitemap-deep.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(leaf(&["/docs/deep"]), xml))
            .expect(0)
            .mount(&server)
            .await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::Sitemap);
        assert_eq!(paths(&result.page_urls), vec!["/docs/a", "/docs/b"]);
    }

    #[tokio::test]
    async fn gzipped_sitemap_is_used_when_plain_is_missing() {
        let server = MockServer::start().await;
        let xml = format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>{}/docs/zipped</loc></url></urlset>"#,
            server.uri()
        );
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        serve(&server, "/docs/sitemap.xml", 200, "<html>not found page</html>", "text/html").await;
        Mock::given(method("GET"))
            .and(path("/docs/sitemap.xml.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(gz, "application/octet-stream"))
            .mount(&server)
            .await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::Sitemap);
        assert_eq!(paths(&result.page_urls), vec!["/docs/zipped"]);
    }

    #[tokio::test]
    async fn navigation_is_the_last_resort() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/docs",
            200,
            r#"<html><body>
                <nav class="sidebar"><a href="/docs/one">One</a><a href="two">Two</a></nav>
                <main><a href="/docs/three">Three</a></main>
            </body></html>"#,
            "text/html",
        )
        .await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::Navigation);
        assert_eq!(paths(&result.page_urls), vec!["/docs/one", "/docs/two"]);
    }

    #[tokio::test]
    async fn nothing_found_is_none() {
        let server = MockServer::start().await;

        let result = discover(&client(), &target(&server, "/docs")).await;

        assert_eq!(result.method, DiscoveryMethod::None);
        assert!(result.page_urls.is_empty());
        assert!(result.manifest_files.is_empty());
    }
}
