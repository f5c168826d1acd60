//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use lunathink_core::{DigestRequest, run_digest};
use lunathink_shared::{
    AppConfig, ExhaustionPolicy, RunSettings, init_config, init_config_at, load_config,
    load_config_from,
    validate_api_keys,
};

use crate::progress::CliProgress;
use crate::wiring;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lunathink — personalized research digests.
#[derive(Parser)]
#[command(
    name = "lunathink",
    version,
    about = "Search, summarize and review recent web content into one emailed digest.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.lunathink/lunathink.toml.
    #[arg(long, global = true, env = "LUNATHINK_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Build a digest for the given topics and email it.
    Run {
        /// Recipient name used in the greeting.
        #[arg(long)]
        name: String,

        /// Recipient email address.
        #[arg(long)]
        email: String,

        /// Topic to research (repeatable).
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// File with one topic per line.
        #[arg(long)]
        topics_file: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides of config file values.
#[derive(clap::Args, Debug, Default, Clone)]
pub(crate) struct Overrides {
    /// Chat model for every role.
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum drafting rounds before giving up.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Send the last draft if the review cap is reached.
    #[arg(long)]
    pub accept_last: bool,

    /// Pages fetched and summarized in parallel.
    #[arg(long)]
    pub concurrency: Option<u32>,
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
        0 => "lunathink=info",
        1 => "lunathink=debug",
        _ => "lunathink=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            name,
            email,
            topics,
            topics_file,
            overrides,
        } => {
            cmd_run(
                config_path.as_deref(),
                &name,
                &email,
                topics,
                topics_file.as_deref(),
                &overrides,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
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

/// Fold command-line overrides into the loaded config.
pub(crate) fn apply_overrides(config: &mut AppConfig, overrides: &Overrides) {
    if let Some(model) = &overrides.model {
        config.openai.model = model.clone();
    }
    if let Some(rounds) = overrides.max_rounds {
        config.review.max_rounds = rounds;
    }
    if overrides.accept_last {
        config.review.on_exhausted = ExhaustionPolicy::AcceptLast;
    }
    if let Some(concurrency) = overrides.concurrency {
        config.pipeline.concurrency = concurrency;
    }
}

/// Topics from `--topic` flags followed by those in `--topics-file`.
fn collect_topics(mut topics: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read topics file '{}'", path.display()))?;
        topics.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from),
        );
    }
    Ok(topics)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&Path>,
    name: &str,
    email: &str,
    topics: Vec<String>,
    topics_file: Option<&Path>,
    overrides: &Overrides,
) -> Result<()> {
    let topics = collect_topics(topics, topics_file)?;
    let request = DigestRequest::new(&topics, name, email)?;

    let mut config = resolve_config(config_path)?;
    apply_overrides(&mut config, overrides);

    let settings = RunSettings::from(&config);
    settings.validate()?;
    validate_api_keys(&config)?;

    let collaborators = wiring::build_collaborators(&config)?;

    info!(
        topics = request.topics().len(),
        model = %config.openai.model,
        max_rounds = settings.review.max_rounds,
        concurrency = settings.concurrency,
        "starting digest"
    );

    let reporter = CliProgress::new();
    let report = match run_digest(&request, &collaborators, &settings, &reporter).await {
        Ok(report) => report,
        Err(e) => {
            reporter.abandon();
            return Err(e).wrap_err("digest run failed");
        }
    };

    println!();
    println!("  Digest sent to {}", request.recipient().email);
    println!("  Run:       {}", report.run_id);
    println!("  Topics:    {}", report.topics);
    println!("  Results:   {} found, {} relevant", report.hits_found, report.hits_relevant);
    println!(
        "  Pages:     {} fetched, {} summarized",
        report.pages_acquired, report.pages_summarized
    );
    println!(
        "  Review:    {} round(s){}",
        report.review_rounds,
        if report.approved { "" } else { ", sent without approval" }
    );
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => init_config_at(p)?,
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
