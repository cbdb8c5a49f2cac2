//! Shared types, error model, and configuration for docgrab.
//!
//! This crate is the foundation depended on by all other docgrab crates.
//! It provides:
//! - [`DocgrabError`], the unified error type
//! - Domain types ([`SiteTarget`], [`RunManifest`], [`DiscoveryMethod`])
//! - URL normalization and slug derivation ([`normalize_url`], [`safe_slug`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`DownloadConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;
pub mod urls;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, DownloadConfig, FetchConfig, FetchPolicyConfig, OutputFormat,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DocgrabError, Result};
pub use types::{DiscoveryMethod, RunManifest, SiteTarget};
pub use urls::{
    MAX_SLUG_LEN, normalize_url, page_slug, safe_slug, same_origin, slug_from_url,
};
