//! Application configuration for docgrab.
//!
//! User config lives at `~/.docgrab/docgrab.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocgrabError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docgrab.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docgrab";

// ---------------------------------------------------------------------------
// Config structs (matching docgrab.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch policy.
    #[serde(default)]
    pub fetch: FetchPolicyConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory under which per-site output directories are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Upper bound on pages fetched per target.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Automated selection mode: "full", "all" or "start".
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
            mode: default_mode(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}
fn default_max_pages() -> usize {
    250
}
fn default_mode() -> String {
    "full".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPolicyConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a network-level failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between page requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchPolicyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            delay_ms: default_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_retries() -> u32 {
    2
}
fn default_delay_ms() -> u64 {
    150
}
fn default_user_agent() -> String {
    concat!("docgrab/", env!("CARGO_PKG_VERSION")).into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration handed to the fetch client at construction.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Additional attempts after a network-level failure.
    pub retries: u32,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            retries: config.fetch.retries,
            user_agent: config.fetch.user_agent.clone(),
        }
    }
}

/// Which converter the download orchestrator runs on HTML pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown-ish text under `md/`, combined into `combined.md`.
    #[default]
    Markdown,
    /// Flat paragraphs under `txt/`, combined into `combined.txt`.
    Plain,
}

/// Runtime download configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory under which `docgrab__<slug>` site directories are created.
    pub output_root: PathBuf,
    /// Upper bound on pages fetched per target.
    pub max_pages: usize,
    /// Pause between page requests.
    pub delay: Duration,
    /// Converter used for HTML pages.
    pub format: OutputFormat,
}

impl From<&AppConfig> for DownloadConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_root: expand_home(&config.defaults.output_dir),
            max_pages: config.defaults.max_pages,
            delay: Duration::from_millis(config.fetch.delay_ms),
            format: OutputFormat::Markdown,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docgrab/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocgrabError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docgrab/docgrab.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocgrabError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocgrabError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocgrabError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocgrabError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocgrabError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
