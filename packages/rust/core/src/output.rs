//! Per-site output directory writer.
//!
//! Layout under `<output_root>/docgrab__<slug>/`:
//! ```text
//! ├── llms/<manifest-file>        raw manifest bytes
//! ├── raw/<page-slug>.<ext>       raw page bytes
//! ├── md/<page-slug>.md           converted pages (markdown mode)
//! ├── txt/<page-slug>.txt         converted pages (plain mode)
//! ├── combined.md | combined.txt  concatenated pages
//! ├── combined__llms-full.txt     manifest shortcut
//! └── meta.json                   run record
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use docgrab_discovery::ManifestKind;
use docgrab_fetch::FetchResult;
use docgrab_shared::{DocgrabError, OutputFormat, Result, RunManifest, SiteTarget};
use tracing::{debug, info, warn};

/// Separator placed after every page in a combined document.
const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Handle to one site's output directory.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    /// Create (or reuse) the site directory under `output_root`.
    pub fn create(output_root: &Path, target: &SiteTarget) -> Result<Self> {
        let root = output_root.join(target.dir_name());
        std::fs::create_dir_all(&root).map_err(|e| DocgrabError::io(&root, e))?;
        info!(path = %root.display(), "output directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save every discovered manifest under `llms/`.
    pub fn write_manifest_files(
        &self,
        files: &BTreeMap<ManifestKind, FetchResult>,
    ) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let dir = self.subdir("llms")?;
        for (kind, result) in files {
            write_bytes(&dir.join(kind.file_name()), &result.body)?;
        }
        Ok(())
    }

    /// Save raw page bytes as `raw/<slug><ext>`.
    pub fn write_raw(&self, slug: &str, extension: &str, body: &[u8]) -> Result<PathBuf> {
        let path = self.subdir("raw")?.join(format!("{slug}{extension}"));
        write_bytes(&path, body)?;
        Ok(path)
    }

    /// Save a converted page as `md/<slug>.md` or `txt/<slug>.txt`.
    pub fn write_page_text(&self, format: OutputFormat, slug: &str, text: &str) -> Result<PathBuf> {
        let (dir, extension) = match format {
            OutputFormat::Markdown => ("md", "md"),
            OutputFormat::Plain => ("txt", "txt"),
        };
        let path = self.subdir(dir)?.join(format!("{slug}.{extension}"));
        write_bytes(&path, text.as_bytes())?;
        Ok(path)
    }

    /// Concatenate page files, in order, into the combined document.
    ///
    /// Files that cannot be read back are left out.
    pub fn write_combined(
        &self,
        format: OutputFormat,
        title: &str,
        pages: &[PathBuf],
    ) -> Result<PathBuf> {
        let (name, mut combined) = match format {
            OutputFormat::Markdown => ("combined.md", format!("# {title}\n\n")),
            OutputFormat::Plain => ("combined.txt", format!("{title}\n\n")),
        };

        for page in pages {
            match std::fs::read_to_string(page) {
                Ok(text) => {
                    combined.push_str(&text);
                    combined.push_str(PAGE_SEPARATOR);
                }
                Err(e) => warn!(path = %page.display(), error = %e, "page missing from combined document"),
            }
        }

        let path = self.root.join(name);
        write_bytes(&path, combined.as_bytes())?;
        info!(path = %path.display(), pages = pages.len(), "wrote combined document");
        Ok(path)
    }

    /// Write a manifest verbatim as `combined__<manifest-file>`.
    pub fn write_manifest_shortcut(&self, kind: ManifestKind, body: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(format!("combined__{}", kind.file_name()));
        write_bytes(&path, body)?;
        info!(path = %path.display(), "wrote {kind} as combined document");
        Ok(path)
    }

    /// Write `meta.json`.
    pub fn write_run_manifest(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let path = self.root.join("meta.json");
        write_json(&path, manifest)?;
        Ok(path)
    }

    fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        std::fs::create_dir_all(&dir).map_err(|e| DocgrabError::io(&dir, e))?;
        Ok(dir)
    }
}

/// Raw-file extension for a `Content-Type` value (`.html` unless recognised).
pub fn raw_extension(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("text/markdown") {
        ".md"
    } else if content_type.contains("text/plain") {
        ".txt"
    } else if content_type.contains("application/json") {
        ".json"
    } else {
        ".html"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| DocgrabError::io(path, e))?;
    debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

/// Write a JSON file (pretty-printed).
fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| DocgrabError::validation(format!("JSON serialization failed: {e}")))?;
    write_bytes(path, json.as_bytes())
}
