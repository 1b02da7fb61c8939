//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use scholardigest_core::{
    DigestRun, GeminiClient, Pipeline, ProgressReporter, RunReport, TermExpander, TextGenerator,
    run_digest,
};
use scholardigest_search::SerpApiClient;
use scholardigest_shared::{
    AppConfig, OutputDocument, SweepMode, init_config, init_config_at, load_config,
    load_config_from, resolve_api_key,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// scholardigest - scholarly article digests as HTML emails.
#[derive(Parser)]
#[command(
    name = "scholardigest",
    version,
    about = "Search Google Scholar for your topics, summarize new papers and render them as HTML emails.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.scholardigest/scholardigest.toml).
    #[arg(long, global = true, env = "SCHOLARDIGEST_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Search, summarize and render emails for the configured topics.
    Run {
        /// Topic to digest (repeatable). Defaults to `[topics] interests`.
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Scratch worklist: current-result or full-sweep.
        #[arg(long)]
        sweep_mode: Option<SweepMode>,
    },

    /// Print the search terms a topic expands to.
    Expand {
        /// Topic to expand.
        topic: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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
        0 => "scholardigest=info",
        1 => "scholardigest=debug",
        _ => "scholardigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { topics, sweep_mode } => cmd_run(config_path, topics, sweep_mode).await,
        Command::Expand { topic } => cmd_expand(config_path, &topic),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&Path>,
    topics: Vec<String>,
    sweep_mode: Option<SweepMode>,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(mode) = sweep_mode {
        config.pipeline.sweep_mode = mode;
    }

    let topics = if topics.is_empty() {
        config.topics.interests.clone()
    } else {
        topics
    };

    // Validate credentials before doing anything
    let search_key = resolve_api_key(&config.search.api_key_env)?;
    let generation_key = resolve_api_key(&config.generation.api_key_env)?;

    let expander = TermExpander::new(&config.expansions)?;
    let search = SerpApiClient::new(&config.search, search_key)?;
    let generator: Arc<dyn TextGenerator> =
        Arc::new(GeminiClient::new(config.generation.clone(), generation_key)?);
    let pipeline = Pipeline::from_config(&config, generator)?;

    info!(
        topics = ?topics,
        sweep_mode = %config.pipeline.sweep_mode,
        model = %config.generation.model,
        "starting digest"
    );

    let run = DigestRun::from_config(&config, topics);
    let reporter = CliProgress::new();
    let report = run_digest(&run, &search, &pipeline, &expander, &reporter).await?;

    let totals = &report.totals;
    println!();
    println!("  Digest complete!");
    println!("  Run:      {}", report.run_id);
    println!("  Terms:    {}", report.terms_searched);
    println!("  Results:  {}", totals.results_processed);
    println!("  Fetched:  {} ({} failed)", totals.scratch_written, totals.fetch_failures);
    println!("  Emails:   {} ({} skipped)", totals.emails_written, totals.emails_skipped);
    println!("  Output:   {}", config.paths.output_dir.display());
    println!(
        "  Time:     {:.1}s",
        report.elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

fn cmd_expand(config_path: Option<&Path>, topic: &str) -> Result<()> {
    let config = resolve_config(config_path)?;
    let expander = TermExpander::new(&config.expansions)?;

    for term in expander.expand(topic) {
        println!("{term}");
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn result_started(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {title}"));
    }

    fn email_written(&self, output: &OutputDocument) {
        self.spinner
            .println(format!("  wrote {}", output.path.display()));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
