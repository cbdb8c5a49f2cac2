//! `llms.txt` manifest probing and link scanning.
//!
//! Sites following <https://llmstxt.org/> publish up to three manifest files.
//! The standard one lists pages as markdown links; the full one carries the
//! whole documentation inline and can stand in for a complete download.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use docgrab_fetch::{FetchClient, FetchResult};
use docgrab_shared::SiteTarget;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::scope::{in_scope, without_fragment};

/// Bracketed markdown links: `[text](target)`.
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\(([^)]+)\)").expect("markdown link regex"));

/// Bare absolute URLs.
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()"']+"#).expect("bare url regex"));

/// Trailing punctuation commonly glued to URLs in prose.
const PUNCTUATION: &[char] = &['.', ',', ';', ':'];

// ---------------------------------------------------------------------------
// ManifestKind
// ---------------------------------------------------------------------------

/// The three well-known manifest variants, richest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestKind {
    /// `llms-full.txt`: the whole documentation in one file.
    Full,
    /// `llms.txt`: an index of links.
    Standard,
    /// `llms-small.txt`: a condensed variant.
    Small,
}

impl ManifestKind {
    /// Probe order.
    pub const ALL: [ManifestKind; 3] = [Self::Full, Self::Standard, Self::Small];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Full => "llms-full.txt",
            Self::Standard => "llms.txt",
            Self::Small => "llms-small.txt",
        }
    }
}

impl std::fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Directories probed for manifests: the base path, the site root and, for a
/// root target, the conventional `/docs` directory. Duplicates are removed.
fn manifest_dirs(target: &SiteTarget) -> Vec<String> {
    let mut dirs = vec![target.base_url.clone(), target.root_url.clone()];
    if target.base_path().is_empty() {
        dirs.push(format!("{}/docs", target.root_url));
    }
    dirs.dedup();
    dirs
}

/// Fetch every manifest variant, keeping the first usable copy of each.
///
/// A copy is usable when it came back `200` with a non-empty textual body.
pub async fn probe_manifests(
    client: &FetchClient,
    target: &SiteTarget,
) -> BTreeMap<ManifestKind, FetchResult> {
    let mut found = BTreeMap::new();

    for dir in manifest_dirs(target) {
        for kind in ManifestKind::ALL {
            if found.contains_key(&kind) {
                continue;
            }
            let url = format!("{dir}/{}", kind.file_name());
            let Some(result) = client.fetch(&url).await else {
                continue;
            };
            if !result.is_ok() || !result.is_text() {
                debug!(%url, status = result.status_code, "manifest candidate rejected");
                continue;
            }
            info!(%url, "found {kind}");
            found.insert(kind, result);
        }
    }

    found
}

// ---------------------------------------------------------------------------
// Link scanning
// ---------------------------------------------------------------------------

/// Outcome of examining one link candidate from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// An in-scope page, fragment removed.
    Keep(Url),
    /// Relative, malformed, off-host or outside the base path.
    Skip,
}

/// Examine one raw link target found in manifest text.
pub fn parse_candidate(raw: &str, target: &SiteTarget) -> Candidate {
    let link = raw.trim().trim_matches(PUNCTUATION);

    let parsed = if link.starts_with('/') {
        target.base().join(link)
    } else if link.starts_with("http://") || link.starts_with("https://") {
        Url::parse(link)
    } else {
        return Candidate::Skip;
    };

    // Placeholder hosts such as `https://[team].vercel.app` fail here.
    let Ok(url) = parsed else {
        debug!(link, "skipping unparseable manifest link");
        return Candidate::Skip;
    };

    if in_scope(&url, target) {
        Candidate::Keep(without_fragment(url))
    } else {
        Candidate::Skip
    }
}

/// Collect the in-scope page URLs referenced by a manifest, sorted and deduplicated.
pub fn scan_manifest_links(text: &str, target: &SiteTarget) -> Vec<Url> {
    let raw_links: BTreeSet<&str> = MD_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .chain(BARE_URL_RE.find_iter(text))
        .map(|m| m.as_str())
        .collect();

    let pages: BTreeSet<Url> = raw_links
        .into_iter()
        .filter_map(|raw| match parse_candidate(raw, target) {
            Candidate::Keep(url) => Some(url),
            Candidate::Skip => None,
        })
        .collect();

    pages.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(raw: &str) -> SiteTarget {
        SiteTarget::from_input(raw).unwrap()
    }

    #[test]
    fn manifest_dirs_for_path_and_root() {
        assert_eq!(
            manifest_dirs(&target("https://vercel.com/docs")),
            vec!["https://vercel.com/docs", "https://vercel.com"]
        );
        assert_eq!(
            manifest_dirs(&target("https://example.com")),
            vec!["https://example.com", "https://example.com/docs"]
        );
    }

    #[test]
    fn scan_keeps_in_scope_links_only() {
        let text = "# Docs\n\n- [Intro](/docs/intro)\n\nSee https://other.com/x\n";
        let pages = scan_manifest_links(text, &target("https://example.com/docs"));
        let pages: Vec<_> = pages.iter().map(Url::as_str).collect();
        assert_eq!(pages, vec!["https://example.com/docs/intro"]);
    }

    #[test]
    fn scan_strips_punctuation_and_fragments_and_sorts() {
        let text = "\
- [B](https://example.com/docs/b#usage)
- Read https://example.com/docs/a.
- [A again](https://example.com/docs/a)
- [Blog](https://example.com/blog/post)
- [Relative](guide/start)
";
        let pages = scan_manifest_links(text, &target("https://example.com/docs"));
        let pages: Vec<_> = pages.iter().map(Url::as_str).collect();
        assert_eq!(
            pages,
            vec!["https://example.com/docs/a", "https://example.com/docs/b"]
        );
    }

    #[test]
    fn placeholder_host_is_skipped_not_fatal() {
        let t = target("https://vercel.com/docs");
        assert_eq!(
            parse_candidate("https://[team].vercel.app/docs/x", &t),
            Candidate::Skip
        );

        let text = "[Team](https://[team].vercel.app/docs)\n[Ok](/docs/ok)";
        let pages = scan_manifest_links(text, &t);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].as_str(), "https://vercel.com/docs/ok");
    }

    #[test]
    fn root_target_accepts_any_path_on_host() {
        let t = target("https://example.com");
        assert!(matches!(
            parse_candidate("/anything", &t),
            Candidate::Keep(url) if url.as_str() == "https://example.com/anything"
        ));
    }

    #[test]
    fn kinds_are_ordered_richest_first() {
        let names: Vec<_> = ManifestKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names, vec!["llms-full.txt", "llms.txt", "llms-small.txt"]);
        assert!(ManifestKind::Full < ManifestKind::Small);
    }
}
