//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docgrab_core::{
    AutoMode, ProgressReporter, TargetOutcome, run_target, run_target_auto,
};
use docgrab_fetch::FetchClient;
use docgrab_shared::{
    AppConfig, DocgrabError, DownloadConfig, FetchConfig, OutputFormat, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::prompt::{self, InquirePrompter};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docgrab: download a documentation site into local text files.
#[derive(Parser)]
#[command(
    name = "docgrab",
    version,
    about = "Discover a documentation site's pages and save them as markdown or plain text.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover and download one or more documentation sites.
    Grab(GrabArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
pub(crate) struct GrabArgs {
    /// Documentation base URLs. Prompts for URLs when none are given.
    pub urls: Vec<String>,

    /// Do not prompt; use the mode from --all/--start or the config file.
    #[arg(long)]
    pub auto: bool,

    /// Download every discovered page (implies --auto).
    #[arg(long, conflicts_with = "start")]
    pub all: bool,

    /// Download only the start page (implies --auto).
    #[arg(long)]
    pub start: bool,

    /// Write flat plain text (txt/, combined.txt) instead of markdown.
    #[arg(long)]
    pub plain: bool,

    /// Directory under which site directories are created.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Maximum pages fetched per site.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after a network failure.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Pause between page requests, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl GrabArgs {
    /// The non-interactive mode, if any. `--all`/`--start` win over the config file.
    fn auto_mode(&self, config: &AppConfig) -> Result<Option<AutoMode>> {
        if self.all {
            return Ok(Some(AutoMode::All));
        }
        if self.start {
            return Ok(Some(AutoMode::Start));
        }
        if self.auto {
            return Ok(Some(config.defaults.mode.parse()?));
        }
        Ok(None)
    }

    fn fetch_config(&self, config: &AppConfig) -> FetchConfig {
        let mut fetch = FetchConfig::from(config);
        if let Some(secs) = self.timeout {
            fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.retries {
            fetch.retries = retries;
        }
        fetch
    }

    fn download_config(&self, config: &AppConfig) -> DownloadConfig {
        let mut download = DownloadConfig::from(config);
        if let Some(out) = &self.out {
            download.output_root = out.clone();
        }
        if let Some(max) = self.max_pages {
            download.max_pages = max;
        }
        if let Some(ms) = self.delay_ms {
            download.delay = Duration::from_millis(ms);
        }
        if self.plain {
            download.format = OutputFormat::Plain;
        }
        download
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docgrab=info",
        1 => "docgrab=debug",
        _ => "docgrab=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Grab(args) => cmd_grab(args).await,
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init()?,
                ConfigAction::Show => cmd_config_show()?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// grab
// ---------------------------------------------------------------------------

/// Everything one target run needs, built once per invocation.
struct GrabContext {
    client: FetchClient,
    download: DownloadConfig,
    mode: Option<AutoMode>,
}

async fn cmd_grab(args: GrabArgs) -> Result<ExitCode> {
    let config = load_config()?;
    let mode = args.auto_mode(&config)?;
    if mode.is_some() && args.urls.is_empty() {
        return Err(eyre!("automatic mode needs at least one URL"));
    }

    let ctx = GrabContext {
        client: FetchClient::new(args.fetch_config(&config))?,
        download: args.download_config(&config),
        mode,
    };
    info!(
        targets = args.urls.len(),
        output = %ctx.download.output_root.display(),
        auto = ?ctx.mode,
        "starting"
    );

    let mut failed = 0usize;
    if args.urls.is_empty() {
        while let Some(url) = prompt::next_url()? {
            if grab_one(&ctx, &url).await? {
                failed += 1;
            }
        }
    } else {
        for url in &args.urls {
            if grab_one(&ctx, url).await? {
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} site(s) produced no pages.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run one target. Returns `true` when it ran but fetched nothing.
///
/// Unusable input only skips the target; an interrupted prompt aborts the run.
async fn grab_one(ctx: &GrabContext, url: &str) -> Result<bool> {
    let progress = CliProgress::new();
    let result = match ctx.mode {
        Some(mode) => run_target_auto(url, mode, &ctx.client, &ctx.download, &progress).await,
        None => {
            let mut prompter = InquirePrompter::new(progress.spinner.clone());
            run_target(url, &mut prompter, &ctx.client, &ctx.download, &progress).await
        }
    };
    progress.finish();

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(outcome.fetched_nothing())
        }
        Err(e) if e.is_input_error() => {
            eprintln!("  Skipping '{url}': {e}");
            Ok(false)
        }
        Err(e @ DocgrabError::Prompt(_)) => Err(e.into()),
        Err(e) => {
            eprintln!("  {url}: {e}");
            Ok(true)
        }
    }
}

fn print_outcome(outcome: &TargetOutcome) {
    println!();
    if !outcome.executed {
        println!("  Skipped {}", outcome.base_url);
        println!();
        return;
    }
    println!("  Site:     {}", outcome.base_url);
    println!("  Method:   {}", outcome.method);
    if outcome.from_manifest {
        println!("  Pages:    llms-full.txt used as-is");
    } else {
        println!(
            "  Pages:    {} written, {} skipped",
            outcome.pages_written,
            outcome.skipped.len()
        );
    }
    if let Some(combined) = &outcome.combined {
        println!("  Combined: {}", combined.display());
    }
    println!("  Output:   {}", outcome.site_dir.display());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn page_skipped(&self, url: &str, reason: &str) {
        self.spinner.println(format!("  ! skipped {url}: {reason}"));
    }

    fn done(&self, _outcome: &TargetOutcome) {
        self.finish();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
