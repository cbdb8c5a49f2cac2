//! Per-target pipeline: input → discovery → selection → download → combined document.

use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tracing::{info, instrument, warn};
use url::Url;

use docgrab_discovery::{DiscoveryResult, ManifestKind, discover};
use docgrab_fetch::{FetchClient, FetchResult};
use docgrab_markdown::{extract_title, html_to_markdownish, html_to_plain_text};
use docgrab_shared::{
    DiscoveryMethod, DocgrabError, DownloadConfig, OutputFormat, Result, RunManifest, SiteTarget,
    page_slug,
};

use crate::output::{SiteLayout, raw_extension};
use crate::selection::{Action, AutoMode, Prompter, choose_action};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for the pipeline.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each page request.
    fn page_fetched(&self, url: &str, current: usize, total: usize);
    /// Called when a page could not be fetched, converted or written.
    fn page_skipped(&self, url: &str, reason: &str);
    /// Called when the target is finished.
    fn done(&self, outcome: &TargetOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn page_skipped(&self, _url: &str, _reason: &str) {}
    fn done(&self, _outcome: &TargetOutcome) {}
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A target whose output directory exists and whose discovery has run.
#[derive(Debug)]
pub struct PreparedTarget {
    pub target: SiteTarget,
    pub layout: SiteLayout,
    pub discovery: DiscoveryResult,
}

/// One fetched page, alive only between fetch and persist.
#[derive(Debug)]
pub struct Page {
    pub source_url: Url,
    pub slug: String,
    pub content_type: String,
    pub raw: Vec<u8>,
    /// Converted text with its header; `None` for binary bodies.
    pub converted: Option<String>,
}

/// Result of running one target.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub base_url: String,
    pub site_dir: PathBuf,
    pub method: DiscoveryMethod,
    /// False when the user (or selection) chose to skip the target.
    pub executed: bool,
    pub pages_written: usize,
    pub skipped: Vec<String>,
    pub combined: Option<PathBuf>,
    /// The combined document is the site's own `llms-full.txt`.
    pub from_manifest: bool,
}

impl TargetOutcome {
    fn new(prepared: &PreparedTarget) -> Self {
        Self {
            base_url: prepared.target.base_url.clone(),
            site_dir: prepared.layout.root().to_path_buf(),
            method: prepared.discovery.method,
            executed: false,
            pages_written: 0,
            skipped: Vec::new(),
            combined: None,
            from_manifest: false,
        }
    }

    /// An executed target that produced no page and no manifest shortcut.
    pub fn fetched_nothing(&self) -> bool {
        self.executed && self.pages_written == 0 && !self.from_manifest
    }
}

#[derive(Debug, Default)]
struct DownloadReport {
    written: Vec<PathBuf>,
    skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate the input, create the site directory, run discovery and save any
/// manifest files.
///
/// Input errors return before anything touches the filesystem.
#[instrument(skip_all, fields(input = raw))]
pub async fn prepare_target(
    raw: &str,
    client: &FetchClient,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<PreparedTarget> {
    let target = SiteTarget::from_input(raw)?;
    let layout = SiteLayout::create(&config.output_root, &target)?;

    progress.phase("Discovering pages");
    let discovery = discover(client, &target).await;
    layout.write_manifest_files(&discovery.manifest_files)?;

    info!(
        base = %target.base_url,
        method = %discovery.method,
        pages = discovery.page_urls.len(),
        manifests = discovery.manifest_files.len(),
        "discovery finished"
    );

    Ok(PreparedTarget {
        target,
        layout,
        discovery,
    })
}

/// Carry out `action` for a prepared target.
#[instrument(skip_all, fields(base = %prepared.target.base_url))]
pub async fn execute(
    prepared: &PreparedTarget,
    action: &Action,
    client: &FetchClient,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<TargetOutcome> {
    let PreparedTarget {
        target,
        layout,
        discovery,
    } = prepared;
    let mut outcome = TargetOutcome::new(prepared);

    let urls = match action {
        Action::Skip => {
            info!("target skipped");
            progress.done(&outcome);
            return Ok(outcome);
        }
        Action::Combined => {
            if let Some(full) = discovery.manifest(ManifestKind::Full) {
                return write_full_manifest(prepared, full, outcome, progress);
            }
            pages_or_base(target, discovery)
        }
        Action::AllPages => pages_or_base(target, discovery),
        Action::StartPage => vec![target.base().clone()],
        Action::Selected(urls) => urls.clone(),
    };

    progress.phase("Downloading pages");
    let report = download_pages(&urls, layout, client, config, progress).await;

    progress.phase("Writing combined document");
    let combined = layout.write_combined(config.format, &target.base_url, &report.written)?;
    layout.write_run_manifest(&RunManifest::new(
        &target.base_url,
        discovery.method,
        report.written.len(),
        urls.len(),
        report.skipped.clone(),
    ))?;

    outcome.executed = true;
    outcome.pages_written = report.written.len();
    outcome.skipped = report.skipped;
    outcome.combined = Some(combined);

    info!(
        written = outcome.pages_written,
        skipped = outcome.skipped.len(),
        "target finished"
    );
    progress.done(&outcome);
    Ok(outcome)
}

/// Prepare a target and execute the action mapped from `mode`, without prompting.
pub async fn run_target_auto(
    raw: &str,
    mode: AutoMode,
    client: &FetchClient,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<TargetOutcome> {
    let prepared = prepare_target(raw, client, config, progress).await?;
    execute(&prepared, &mode.action(), client, config, progress).await
}

/// Prepare a target, ask `prompter` what to do, then execute it.
pub async fn run_target(
    raw: &str,
    prompter: &mut dyn Prompter,
    client: &FetchClient,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<TargetOutcome> {
    let prepared = prepare_target(raw, client, config, progress).await?;
    let action = choose_action(prompter, &prepared.target, &prepared.discovery)?;
    execute(&prepared, &action, client, config, progress).await
}

// ---------------------------------------------------------------------------
// Download loop
// ---------------------------------------------------------------------------

fn pages_or_base(target: &SiteTarget, discovery: &DiscoveryResult) -> Vec<Url> {
    if discovery.page_urls.is_empty() {
        vec![target.base().clone()]
    } else {
        discovery.page_urls.clone()
    }
}

fn write_full_manifest(
    prepared: &PreparedTarget,
    full: &FetchResult,
    mut outcome: TargetOutcome,
    progress: &dyn ProgressReporter,
) -> Result<TargetOutcome> {
    progress.phase("Writing llms-full.txt");
    let layout = &prepared.layout;
    let path = layout.write_manifest_shortcut(ManifestKind::Full, &full.body)?;
    layout.write_run_manifest(&RunManifest::new(
        &prepared.target.base_url,
        prepared.discovery.method,
        0,
        0,
        Vec::new(),
    ))?;

    outcome.executed = true;
    outcome.from_manifest = true;
    outcome.combined = Some(path);
    progress.done(&outcome);
    Ok(outcome)
}

/// Fetch, convert and persist each URL in order, up to `max_pages`.
///
/// A failing page is logged and recorded as skipped; the queue always runs
/// to the end.
async fn download_pages(
    urls: &[Url],
    layout: &SiteLayout,
    client: &FetchClient,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> DownloadReport {
    let queue = &urls[..urls.len().min(config.max_pages)];
    if queue.len() < urls.len() {
        info!(selected = urls.len(), max = config.max_pages, "page list capped");
    }

    let mut report = DownloadReport::default();
    for (i, url) in queue.iter().enumerate() {
        if i > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        progress.page_fetched(url.as_str(), i + 1, queue.len());

        let saved = match fetch_page(client, url, config.format).await {
            Ok(page) => persist_page(layout, &page, config.format),
            Err(e) => Err(e),
        };
        match saved {
            Ok(path) => report.written.push(path),
            Err(e) => {
                warn!(%url, error = %e, "page skipped");
                progress.page_skipped(url.as_str(), &e.to_string());
                report.skipped.push(url.to_string());
            }
        }
    }
    report
}

async fn fetch_page(client: &FetchClient, url: &Url, format: OutputFormat) -> Result<Page> {
    let result = client
        .fetch(url.as_str())
        .await
        .ok_or_else(|| DocgrabError::Network(format!("{url}: no response")))?;
    if !result.is_ok() {
        return Err(DocgrabError::Network(format!(
            "{url}: HTTP {} ({} bytes)",
            result.status_code,
            result.body.len()
        )));
    }

    let converted = result.text().map(|text| convert(url, result.content_type(), &text, format));
    Ok(Page {
        source_url: url.clone(),
        slug: page_slug(url),
        content_type: result.content_type().to_string(),
        converted,
        raw: result.body,
    })
}

/// Convert a decoded body and prepend the page header.
fn convert(url: &Url, content_type: &str, text: &str, format: OutputFormat) -> String {
    let is_html = content_type.to_ascii_lowercase().contains("text/html")
        || raw_extension(content_type) == ".html";

    match format {
        OutputFormat::Markdown => {
            let body = if is_html {
                html_to_markdownish(text)
            } else {
                with_trailing_newline(text)
            };
            format!("# {url}\n> Source: {url}\n\n{body}")
        }
        OutputFormat::Plain => {
            let (title, body) = if is_html {
                (extract_title(text), html_to_plain_text(text))
            } else {
                (None, with_trailing_newline(text))
            };
            let title = title.unwrap_or_else(|| "(unknown)".into());
            let fetched = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            format!("Source: {url}\nTitle: {title}\nFetched: {fetched}\n\n{body}")
        }
    }
}

fn with_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

/// Write raw bytes, then the converted text. Binary bodies are kept raw only
/// and reported as an error so the caller records them as skipped.
fn persist_page(layout: &SiteLayout, page: &Page, format: OutputFormat) -> Result<PathBuf> {
    layout.write_raw(&page.slug, raw_extension(&page.content_type), &page.raw)?;
    match &page.converted {
        Some(text) => layout.write_page_text(format, &page.slug, text),
        None => Err(DocgrabError::Conversion(format!(
            "{}: binary body ({})",
            page.source_url, page.content_type
        ))),
    }
}
