//! Download orchestration and selection for docgrab.
//!
//! This crate ties discovery, fetching and conversion together into the
//! per-target workflow (`prepare_target` → choose an [`Action`] → `execute`),
//! and writes each site's output directory.

pub mod output;
pub mod pipeline;
pub mod selection;

pub use output::{SiteLayout, raw_extension};
pub use pipeline::{
    Page, PreparedTarget, ProgressReporter, SilentProgress, TargetOutcome, execute,
    prepare_target, run_target, run_target_auto,
};
pub use selection::{
    Action, AutoMode, MenuChoice, PREVIEW_LIMIT, Prompter, choose_action, filter_by_pattern,
    parse_selection, preview, summary_lines,
};
