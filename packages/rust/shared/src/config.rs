//! Application configuration for ReviewCrew.
//!
//! User config lives at `~/.reviewcrew/reviewcrew.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReviewCrewError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reviewcrew.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reviewcrew";

// ---------------------------------------------------------------------------
// Config structs (matching reviewcrew.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// What to research and how to phrase it for the agents.
    #[serde(default)]
    pub run: RunSection,

    /// Output file locations.
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// Scrape client settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Search service credentials (env var names only).
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Product or product category to collect reviews for.
    #[serde(default = "default_product_type")]
    pub product_type: String,

    /// Comma-separated attributes the collector should capture.
    #[serde(default = "default_review_attributes")]
    pub review_attributes: String,

    /// Hints about which kinds of sources to consult.
    #[serde(default = "default_source_hints")]
    pub source_hints: String,

    /// Things the agents should stay away from.
    #[serde(default = "default_avoid_types")]
    pub avoid_types: String,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            product_type: default_product_type(),
            review_attributes: default_review_attributes(),
            source_hints: default_source_hints(),
            avoid_types: default_avoid_types(),
        }
    }
}

fn default_product_type() -> String {
    "NETGEAR RAXE300 Reviews".into()
}
fn default_review_attributes() -> String {
    "price range, ratings, title, urls, name, ports available, and features description, \
     mobile dropping connection issues"
        .into()
}
fn default_source_hints() -> String {
    "like tech review sites, amazon reviews,".into()
}
fn default_avoid_types() -> String {
    "Do Not look at other devices.".into()
}

/// `[outputs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// Markdown table destination.
    #[serde(default = "default_markdown_output")]
    pub markdown: String,

    /// CSV destination.
    #[serde(default = "default_csv_output")]
    pub csv: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            markdown: default_markdown_output(),
            csv: default_csv_output(),
        }
    }
}

fn default_markdown_output() -> String {
    "router_review.md".into()
}
fn default_csv_output() -> String {
    "router_review.csv".into()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Truncate scraped content to this many characters (0 = unlimited).
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Maximum concurrent scrapes when several URLs are given at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_content_chars: default_max_content_chars(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_content_chars() -> usize {
    20_000
}
fn default_concurrency() -> u32 {
    4
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Env var holding the Serper web-search key (never store the key itself).
    #[serde(default = "default_serper_key_env")]
    pub serper_api_key_env: String,

    /// Env var holding the Exa search key.
    #[serde(default = "default_exa_key_env")]
    pub exa_api_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key_env: default_serper_key_env(),
            exa_api_key_env: default_exa_key_env(),
        }
    }
}

fn default_serper_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_exa_key_env() -> String {
    "EXA_API_KEY".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crew configuration, merged from config file + CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub product_type: String,
    pub review_attributes: String,
    pub source_hints: String,
    pub avoid_types: String,
    /// Markdown table destination.
    pub markdown_output: PathBuf,
    /// CSV destination.
    pub csv_output: PathBuf,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            product_type: config.run.product_type.clone(),
            review_attributes: config.run.review_attributes.clone(),
            source_hints: config.run.source_hints.clone(),
            avoid_types: config.run.avoid_types.clone(),
            markdown_output: PathBuf::from(&config.outputs.markdown),
            csv_output: PathBuf::from(&config.outputs.csv),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reviewcrew/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReviewCrewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reviewcrew/reviewcrew.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ReviewCrewError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReviewCrewError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReviewCrewError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReviewCrewError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReviewCrewError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that both search-service key env vars are set and non-empty.
///
/// The search tools themselves belong to the agent framework, but a run
/// without keys fails late and confusingly, so the CLI checks up front.
pub fn validate_search_keys(config: &AppConfig) -> Result<()> {
    let missing: Vec<&str> = [
        config.search.serper_api_key_env.as_str(),
        config.search.exa_api_key_env.as_str(),
    ]
    .into_iter()
    .filter(|var| std::env::var(var).map(|v| v.is_empty()).unwrap_or(true))
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReviewCrewError::config(format!(
            "search API key not found. Set the {} environment variable(s).",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("product_type"));
        assert!(toml_str.contains("SERPER_API_KEY"));
        assert!(toml_str.contains("router_review.csv"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.scrape.timeout_secs, 30);
        assert_eq!(parsed.run.product_type, "NETGEAR RAXE300 Reviews");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[run]
product_type = "fitness trackers"
review_attributes = "price, battery life, features, accuracy"

[outputs]
markdown = "fitness_trackers_review.md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.run.product_type, "fitness trackers");
        assert_eq!(config.run.avoid_types, "Do Not look at other devices.");
        assert_eq!(config.outputs.markdown, "fitness_trackers_review.md");
        assert_eq!(config.outputs.csv, "router_review.csv");
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.markdown_output, PathBuf::from("router_review.md"));
        assert_eq!(run.csv_output, PathBuf::from("router_review.csv"));
        assert_eq!(run.source_hints, "like tech review sites, amazon reviews,");
    }

    #[test]
    fn search_key_validation() {
        let mut config = AppConfig::default();
        // Unique names so parallel tests don't interfere
        config.search.serper_api_key_env = "RC_TEST_NONEXISTENT_SERPER_12345".into();
        config.search.exa_api_key_env = "RC_TEST_NONEXISTENT_EXA_12345".into();
        let err = validate_search_keys(&config).unwrap_err();
        assert!(err.to_string().contains("RC_TEST_NONEXISTENT_SERPER_12345"));
        assert!(err.to_string().contains("RC_TEST_NONEXISTENT_EXA_12345"));
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here/reviewcrew.toml")).unwrap_err();
        assert!(matches!(err, ReviewCrewError::Io { .. }));
    }
}
