//! Selection controller: turns a discovery result into an [`Action`], either
//! through an interactive [`Prompter`] or from an [`AutoMode`].

use std::collections::BTreeSet;
use std::str::FromStr;

use docgrab_discovery::{DiscoveryResult, ManifestKind};
use docgrab_shared::{DocgrabError, Result, SiteTarget};
use regex::Regex;
use tracing::debug;
use url::Url;

/// How many page URLs the summary and regex previews list.
pub const PREVIEW_LIMIT: usize = 12;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What to do with one discovered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch the base page only.
    StartPage,
    /// One combined document: the full manifest if present, otherwise every
    /// discovered page (or the base page when nothing was discovered).
    Combined,
    /// Every discovered page (or the base page when nothing was discovered).
    AllPages,
    /// An explicit subset of the discovered pages.
    Selected(Vec<Url>),
    /// Do nothing for this target.
    Skip,
}

/// Non-interactive selection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoMode {
    #[default]
    Full,
    All,
    Start,
}

impl AutoMode {
    pub fn action(self) -> Action {
        match self {
            Self::Full => Action::Combined,
            Self::All => Action::AllPages,
            Self::Start => Action::StartPage,
        }
    }
}

impl FromStr for AutoMode {
    type Err = DocgrabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "all" => Ok(Self::All),
            "start" => Ok(Self::Start),
            other => Err(DocgrabError::config(format!(
                "unknown mode '{other}' (expected full, all or start)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

/// One entry of the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    StartPage,
    Combined,
    AllPages,
    PickByIndex,
    FilterByRegex,
    Skip,
}

impl MenuChoice {
    pub fn label(self) -> &'static str {
        match self {
            Self::StartPage => "Start page only",
            Self::Combined => "One combined document",
            Self::AllPages => "All pages",
            Self::PickByIndex => "Pick by index",
            Self::FilterByRegex => "Filter by regex",
            Self::Skip => "Skip",
        }
    }

    /// Menu entries offered for a target; page-list entries only when pages exist.
    pub fn menu(has_pages: bool) -> Vec<Self> {
        let mut choices = vec![Self::StartPage, Self::Combined];
        if has_pages {
            choices.extend([Self::AllPages, Self::PickByIndex, Self::FilterByRegex]);
        }
        choices.push(Self::Skip);
        choices
    }
}

impl std::fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The interactive side of the selection controller.
pub trait Prompter {
    /// Pick one of `choices`.
    fn choose(&mut self, choices: &[MenuChoice]) -> Result<MenuChoice>;
    /// Read an index selection such as `1,3,10-20` for a list of `count` pages.
    fn ask_indices(&mut self, count: usize) -> Result<String>;
    /// Read a regular expression.
    fn ask_pattern(&mut self) -> Result<String>;
    /// Show a line of text to the user.
    fn notify(&mut self, message: &str);
}

/// Show the discovery summary, then prompt until the user settles on an action.
///
/// Empty index selections, invalid regexes and regexes without matches
/// re-prompt.
pub fn choose_action(
    prompter: &mut dyn Prompter,
    target: &SiteTarget,
    discovery: &DiscoveryResult,
) -> Result<Action> {
    for line in summary_lines(target, discovery) {
        prompter.notify(&line);
    }

    let pages = &discovery.page_urls;
    let choices = MenuChoice::menu(!pages.is_empty());

    loop {
        let choice = prompter.choose(&choices)?;
        debug!(%choice, "menu choice");
        match choice {
            MenuChoice::StartPage => return Ok(Action::StartPage),
            MenuChoice::Combined => return Ok(Action::Combined),
            MenuChoice::AllPages => return Ok(Action::AllPages),
            MenuChoice::Skip => return Ok(Action::Skip),
            MenuChoice::PickByIndex => {
                let input = prompter.ask_indices(pages.len())?;
                let picked: Vec<Url> = parse_selection(&input, pages.len())
                    .into_iter()
                    .map(|i| pages[i - 1].clone())
                    .collect();
                if picked.is_empty() {
                    prompter.notify("Nothing selected.");
                    continue;
                }
                return Ok(Action::Selected(picked));
            }
            MenuChoice::FilterByRegex => {
                let pattern = prompter.ask_pattern()?;
                match filter_by_pattern(pages, &pattern) {
                    Err(e) => prompter.notify(&format!("Invalid regex: {e}")),
                    Ok(matched) if matched.is_empty() => prompter.notify("No pages matched."),
                    Ok(matched) => {
                        prompter.notify(&format!("Matched {} pages:", matched.len()));
                        for line in preview(&matched, PREVIEW_LIMIT) {
                            prompter.notify(&line);
                        }
                        return Ok(Action::Selected(matched));
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Parse `1,3,10-20` into sorted, unique 1-based indices within `1..=count`.
///
/// Reversed ranges are swapped; unparseable tokens and out-of-range indices
/// are ignored.
pub fn parse_selection(input: &str, count: usize) -> Vec<usize> {
    let mut picked = BTreeSet::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => match (a.trim().parse::<usize>(), b.trim().parse::<usize>()) {
                (Ok(a), Ok(b)) => (a.min(b), a.max(b)),
                _ => continue,
            },
            None => match token.parse::<usize>() {
                Ok(n) => (n, n),
                Err(_) => continue,
            },
        };
        picked.extend(start.max(1)..=end.min(count));
    }
    picked.into_iter().collect()
}

/// Pages whose URL matches `pattern` anywhere, in their original order.
pub fn filter_by_pattern(
    pages: &[Url],
    pattern: &str,
) -> std::result::Result<Vec<Url>, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(pages.iter().filter(|u| re.is_match(u.as_str())).cloned().collect())
}

/// Numbered preview lines for the first `limit` URLs, plus `... (+K more)`.
pub fn preview(urls: &[Url], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = urls
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, url)| format!("  {:>3}. {url}", i + 1))
        .collect();
    if urls.len() > limit {
        lines.push(format!("  ... (+{} more)", urls.len() - limit));
    }
    lines
}

/// Summary shown before the menu.
pub fn summary_lines(target: &SiteTarget, discovery: &DiscoveryResult) -> Vec<String> {
    let yes_no = |found: bool| if found { "yes" } else { "no" };
    let mut lines = vec![
        format!("Base:          {}", target.base_url),
        format!(
            "Method:        {} ({} pages)",
            discovery.method,
            discovery.page_urls.len()
        ),
        format!("llms-full.txt: {}", yes_no(discovery.has_full_manifest())),
        format!(
            "llms.txt:      {}",
            yes_no(discovery.manifest(ManifestKind::Standard).is_some())
        ),
    ];
    lines.extend(preview(&discovery.page_urls, PREVIEW_LIMIT));
    lines
}
