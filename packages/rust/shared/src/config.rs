//! Application configuration for Lunathink.
//!
//! User config lives at `~/.lunathink/lunathink.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file, only the names of the
//! environment variables holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LunathinkError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lunathink.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lunathink";

// ---------------------------------------------------------------------------
// Config structs (matching lunathink.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding prompt overrides (`relevance_check.md`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<String>,

    /// OpenAI settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Page scraping settings.
    #[serde(default)]
    pub scraping: ScrapingConfig,

    /// Email delivery settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Per-page summarization settings.
    #[serde(default)]
    pub summarize: SummarizeConfig,

    /// Drafter/critic review loop settings.
    #[serde(default)]
    pub review: ReviewConfig,

    /// Pipeline execution settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Model used for every role.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (override for proxies or compatible providers).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            model: default_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_openai_timeout() -> u64 {
    120
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Two-letter country code results are localized to.
    #[serde(default = "default_country")]
    pub country: String,

    /// Maximum hits requested per topic.
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Recency window (`qdr:h`, `qdr:d`, `qdr:w`, ...).
    #[serde(default = "default_time_window")]
    pub time_window: String,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            endpoint: default_search_endpoint(),
            country: default_country(),
            num_results: default_num_results(),
            time_window: default_time_window(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_country() -> String {
    "gb".into()
}
fn default_num_results() -> u32 {
    30
}
fn default_time_window() -> String {
    "qdr:d".into()
}
fn default_search_timeout() -> u64 {
    30
}

/// `[scraping]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingConfig {
    #[serde(default = "default_scraping_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_scraping_endpoint")]
    pub endpoint: String,

    /// Ask the scraping service to execute JavaScript before returning HTML.
    #[serde(default = "default_true")]
    pub render_js: bool,

    #[serde(default = "default_scraping_timeout")]
    pub timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_scraping_key_env(),
            endpoint: default_scraping_endpoint(),
            render_js: true,
            timeout_secs: default_scraping_timeout(),
        }
    }
}

fn default_scraping_key_env() -> String {
    "SCRAPING_API_KEY".into()
}
fn default_scraping_endpoint() -> String {
    "https://scraping.narf.ai/api/v1/".into()
}
fn default_true() -> bool {
    true
}
fn default_scraping_timeout() -> u64 {
    90
}

/// `[email]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_email_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_email_key_env(),
            endpoint: default_email_endpoint(),
            sender_name: default_sender_name(),
            sender_email: default_sender_email(),
            subject: default_subject(),
        }
    }
}

fn default_email_key_env() -> String {
    "BREVO_API_KEY".into()
}
fn default_email_endpoint() -> String {
    "https://api.brevo.com/v3/smtp/email".into()
}
fn default_sender_name() -> String {
    "Lunathink".into()
}
fn default_sender_email() -> String {
    "digest@lunathink.example".into()
}
fn default_subject() -> String {
    "Your Personalized AI Research Summary".into()
}

/// `[summarize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeConfig {
    /// Page text is cut to this many words before summarization.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
        }
    }
}

fn default_max_words() -> usize {
    2000
}

/// What to do when the review loop reaches `max_rounds` without approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy {
    /// Fail the run with a not-converged error.
    #[default]
    Fail,
    /// Deliver the last draft anyway.
    AcceptLast,
}

/// `[review]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Maximum drafting rounds (each followed by one critique).
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    #[serde(default)]
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            on_exhausted: ExhaustionPolicy::default(),
        }
    }
}

fn default_max_rounds() -> u32 {
    5
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pages acquired/summarized in parallel. 1 means strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> u32 {
    4
}

// ---------------------------------------------------------------------------
// Run settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime knobs for one pipeline run — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Word cap applied to page text before summarization.
    pub max_words: usize,
    /// Parallelism for acquisition and summarization.
    pub concurrency: u32,
    /// Review loop cap and fallback.
    pub review: ReviewConfig,
}

impl RunSettings {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.review.max_rounds == 0 {
            return Err(LunathinkError::config("review.max_rounds must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(LunathinkError::config("pipeline.concurrency must be at least 1"));
        }
        if self.max_words == 0 {
            return Err(LunathinkError::config("summarize.max_words must be at least 1"));
        }
        Ok(())
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RunSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_words: config.summarize.max_words,
            concurrency: config.pipeline.concurrency,
            review: config.review.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lunathink/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LunathinkError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lunathink/lunathink.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LunathinkError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LunathinkError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| LunathinkError::io(dir, e))?;
    }

    let path = path.to_path_buf();
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LunathinkError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LunathinkError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an API key from the named environment variable.
pub fn api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(LunathinkError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that every collaborator's API key env var is set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    let missing: Vec<&str> = [
        config.openai.api_key_env.as_str(),
        config.search.api_key_env.as_str(),
        config.scraping.api_key_env.as_str(),
        config.email.api_key_env.as_str(),
    ]
    .into_iter()
    .filter(|name| api_key(name).is_err())
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LunathinkError::config(format!(
            "API key not found. Set the following environment variables: {}",
            missing.join(", ")
        )))
    }
}
