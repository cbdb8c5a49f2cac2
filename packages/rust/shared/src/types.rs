//! Core domain types shared by discovery, download and the CLI.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocgrabError, Result};
use crate::urls::{normalize_url, slug_from_url};

// ---------------------------------------------------------------------------
// SiteTarget
// ---------------------------------------------------------------------------

/// A documentation site to grab, derived once per run from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    /// Canonical `scheme://host[:port]/path` without trailing slash.
    pub base_url: String,
    /// `scheme://host[:port]` only.
    pub root_url: String,
    /// Filesystem-safe identifier for the site's output directory.
    pub filesystem_slug: String,
    base: Url,
}

impl SiteTarget {
    /// Build a target from raw user input (quotes, missing scheme and
    /// trailing slashes are tolerated).
    ///
    /// Fails with a validation error when nothing usable remains.
    pub fn from_input(raw: &str) -> Result<Self> {
        let normalized = normalize_url(raw);
        if normalized.is_empty() {
            return Err(DocgrabError::validation("empty URL"));
        }

        let parsed = Url::parse(&normalized)
            .map_err(|e| DocgrabError::validation(format!("invalid URL '{normalized}': {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DocgrabError::validation(format!("URL has no host: {normalized}")))?;

        let root_url = match parsed.port() {
            Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
            None => format!("{}://{host}", parsed.scheme()),
        };
        let path = parsed.path().trim_end_matches('/');
        let base_url = format!("{root_url}{path}");

        let base = Url::parse(&base_url)
            .map_err(|e| DocgrabError::validation(format!("invalid URL '{base_url}': {e}")))?;

        Ok(Self {
            filesystem_slug: slug_from_url(&base_url),
            base_url,
            root_url,
            base,
        })
    }

    /// The base URL in parsed form.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Path component of the base URL without trailing slash (`""` at the root).
    pub fn base_path(&self) -> &str {
        self.base.path().trim_end_matches('/')
    }

    /// Name of the per-site output directory.
    pub fn dir_name(&self) -> String {
        format!("docgrab__{}", self.filesystem_slug)
    }
}

// ---------------------------------------------------------------------------
// DiscoveryMethod
// ---------------------------------------------------------------------------

/// Which discovery strategy produced the page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMethod {
    /// Links scanned from a published `llms.txt`.
    Manifest,
    /// `<loc>` entries from `sitemap.xml` (or its index).
    Sitemap,
    /// Links scraped from the base page's navigation chrome.
    Navigation,
    /// Nothing found.
    None,
}

impl DiscoveryMethod {
    /// Stable lowercase label used in logs and `meta.json`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Sitemap => "sitemap",
            Self::Navigation => "navigation",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunManifest
// ---------------------------------------------------------------------------

/// The `meta.json` record written once at the end of a target run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Canonical base URL of the target.
    pub base_url: String,
    /// Strategy that produced the page list.
    pub discovery_method: DiscoveryMethod,
    /// Pages fetched, converted and written.
    pub page_count: usize,
    /// Pages the selection asked for (before the max-page cap).
    pub selection_count: usize,
    /// Seconds since the Unix epoch when the record was created.
    pub unix_timestamp: i64,
    /// Pages that were selected but could not be fetched or written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl RunManifest {
    /// Create a record stamped with the current time.
    pub fn new(
        base_url: impl Into<String>,
        discovery_method: DiscoveryMethod,
        page_count: usize,
        selection_count: usize,
        skipped: Vec<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            discovery_method,
            page_count,
            selection_count,
            unix_timestamp: Utc::now().timestamp(),
            skipped,
        }
    }
}
