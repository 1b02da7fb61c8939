//! Application configuration for scholardigest.
//!
//! User config lives at `~/.scholardigest/scholardigest.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScholarDigestError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scholardigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scholardigest";

// ---------------------------------------------------------------------------
// Config structs (matching scholardigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Text-generation model settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Scratch/output directories and the email template.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Result-processing behavior.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Topics of interest to digest.
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Extra topic expansions, merged over the curated table.
    #[serde(default)]
    pub expansions: BTreeMap<String, Vec<String>>,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SerpApi engine name.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Interface language passed as `hl`.
    #[serde(default = "default_language")]
    pub language: String,

    /// Results requested per search term.
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Restrict results to the current year and sort by date.
    #[serde(default = "default_true")]
    pub recency_filter: bool,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Provider base URL.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            language: default_language(),
            num_results: default_num_results(),
            recency_filter: true,
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
        }
    }
}

fn default_engine() -> String {
    "google_scholar".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_num_results() -> u32 {
    8
}
fn default_true() -> bool {
    true
}
fn default_search_key_env() -> String {
    "SERPAPI_API_KEY".into()
}
fn default_search_base_url() -> String {
    "https://serpapi.com".into()
}

/// `[generation]` section.
///
/// Passed explicitly to the generation client at construction; the
/// summarizer and email renderer share that client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus-sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling cutoff.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum tokens in a single response.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Threshold applied to every content-safety category.
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: String,

    /// API base URL.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_generation_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            safety_threshold: default_safety_threshold(),
            base_url: default_generation_base_url(),
        }
    }
}

fn default_generation_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-1.5-pro-latest".into()
}
fn default_temperature() -> f32 {
    0.01
}
fn default_top_p() -> f32 {
    0.95
}
fn default_top_k() -> u32 {
    32
}
fn default_max_output_tokens() -> u32 {
    1024
}
fn default_safety_threshold() -> String {
    "BLOCK_NONE".into()
}
fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Scratch directory for fetched artifacts.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Output directory for rendered emails.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// HTML email skeleton with `{{placeholder}}` tokens.
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            output_dir: default_output_dir(),
            template_path: default_template_path(),
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("temp")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("emails")
}
fn default_template_path() -> PathBuf {
    PathBuf::from("emailtemplate.txt")
}

/// Which scratch artifacts are summarized for each search result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepMode {
    /// Only the artifacts fetched for the result being processed.
    #[default]
    CurrentResult,
    /// Every file in the scratch directory, including leftovers from earlier
    /// results, summarized against the current result's metadata.
    FullSweep,
}

impl SweepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentResult => "current-result",
            Self::FullSweep => "full-sweep",
        }
    }
}

impl FromStr for SweepMode {
    type Err = ScholarDigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "current-result" => Ok(Self::CurrentResult),
            "full-sweep" => Ok(Self::FullSweep),
            other => Err(ScholarDigestError::config(format!(
                "unknown sweep mode '{other}': expected 'current-result' or 'full-sweep'"
            ))),
        }
    }
}

impl std::fmt::Display for SweepMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scratch worklist selection.
    #[serde(default)]
    pub sweep_mode: SweepMode,

    /// Word budget requested from the model for each summary.
    #[serde(default = "default_word_limit")]
    pub summary_word_limit: u32,

    /// Delete the scratch directory once every topic has been processed.
    #[serde(default)]
    pub cleanup_scratch: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sweep_mode: SweepMode::default(),
            summary_word_limit: default_word_limit(),
            cleanup_scratch: false,
        }
    }
}

fn default_word_limit() -> u32 {
    400
}

/// `[topics]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Topics expanded and searched on every run.
    #[serde(default = "default_interests")]
    pub interests: Vec<String>,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            interests: default_interests(),
        }
    }
}

fn default_interests() -> Vec<String> {
    vec!["artificial intelligence".into()]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.scholardigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScholarDigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.scholardigest/scholardigest.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ScholarDigestError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ScholarDigestError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ScholarDigestError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScholarDigestError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ScholarDigestError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Read a credential from the named env var, rejecting unset or empty values.
pub fn resolve_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ScholarDigestError::config(format!(
            "API key not found. Set the {var_name} environment variable (a .env file works too)."
        ))),
    }
}
