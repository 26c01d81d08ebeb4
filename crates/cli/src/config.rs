//! # Application Configuration
//!
//! Defines the `moodmap` configuration and loads it in layers:
//!
//! 1. programmatic defaults (the serde default functions below),
//! 2. an optional YAML file (`--config`, else `moodmap.yml` in the working
//!    directory) with `${VAR}` placeholders expanded from the environment,
//! 3. `MOODMAP_`-prefixed environment variables, with `__` separating nested
//!    keys (e.g. `MOODMAP_ANALYSIS__API_KEY`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use moodmap::constants::{
    DEFAULT_CACHE_FILE, DEFAULT_MAX_AGE_DAYS, DEFAULT_MISSING_FIELDS_LOG, DEFAULT_OUTPUT_FILE,
};
use moodmap::geocode::DEFAULT_QUALIFIER;
use moodmap::placement::{Placement, ANGLE_STEP_DEGREES, OFFSET_RADIUS};
use moodmap::providers::factory::{ProviderKind, ProviderSettings};
use moodmap::providers::geo::nominatim::{DEFAULT_USER_AGENT, NOMINATIM_BASE_URL};
use moodmap::providers::geo::onemap::ONEMAP_BASE_URL;
use moodmap::recency::SGT_OFFSET_SECS;
use moodmap::relevance::RelevanceRule;
use moodmap::retry::RetryPolicy;
use moodmap::types::BoundingBox;
use moodmap_rss::{default_feeds, FeedSource};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// The file looked for in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "moodmap.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(String),
    #[error("Config file not found at '{0}'")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `moodmap.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    /// JSON-lines log of records missing a field. Empty disables it.
    #[serde(default = "default_missing_fields_log")]
    pub missing_fields_log: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub bounds: BoundingBox,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSource>,
    #[serde(default)]
    pub recency: RecencyConfig,
}

fn default_cache_path() -> String {
    DEFAULT_CACHE_FILE.to_string()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_missing_fields_log() -> String {
    DEFAULT_MISSING_FIELDS_LOG.to_string()
}

/// Which AI provider analyses articles, and how patiently.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    /// Retries after a rate limit. Values above one are treated as one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub default_retry_delay_secs: f64,
    #[serde(default = "default_max_retry_delay_secs")]
    pub max_retry_delay_secs: f64,
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_secs() -> f64 {
    2.0
}

fn default_max_retry_delay_secs() -> f64 {
    60.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_url: None,
            api_key: None,
            model: None,
            system_prompt: None,
            user_prompt: None,
            max_retries: default_max_retries(),
            default_retry_delay_secs: default_retry_delay_secs(),
            max_retry_delay_secs: default_max_retry_delay_secs(),
        }
    }
}

impl AnalysisConfig {
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            provider: self.provider,
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }

    /// Negative or non-finite delays fall back to zero.
    pub fn retry_policy(&self) -> RetryPolicy {
        let secs = |v: f64| Duration::try_from_secs_f64(v).unwrap_or(Duration::ZERO);
        RetryPolicy {
            max_retries: self.max_retries,
            default_delay: secs(self.default_retry_delay_secs),
            max_delay: secs(self.max_retry_delay_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Providers in the order they are asked: `onemap`, `nominatim`.
    #[serde(default = "default_geocoders")]
    pub providers: Vec<String>,
    #[serde(default = "default_onemap_url")]
    pub onemap_url: String,
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Appended to every Nominatim query.
    #[serde(default = "default_nominatim_suffix")]
    pub nominatim_suffix: String,
    /// Appended to a place name when its first lookup lands out of bounds.
    #[serde(default = "default_qualifier")]
    pub qualifier: String,
}

fn default_geocoders() -> Vec<String> {
    vec!["onemap".to_string(), "nominatim".to_string()]
}

fn default_onemap_url() -> String {
    ONEMAP_BASE_URL.to_string()
}

fn default_nominatim_url() -> String {
    NOMINATIM_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_nominatim_suffix() -> String {
    ", Singapore".to_string()
}

fn default_qualifier() -> String {
    DEFAULT_QUALIFIER.to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            providers: default_geocoders(),
            onemap_url: default_onemap_url(),
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            nominatim_suffix: default_nominatim_suffix(),
            qualifier: default_qualifier(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelevanceConfig {
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default = "default_local_categories")]
    pub local_category_markers: Vec<String>,
}

fn default_keyword() -> String {
    RelevanceRule::default().keyword
}

fn default_local_categories() -> Vec<String> {
    RelevanceRule::default().local_category_markers
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            local_category_markers: default_local_categories(),
        }
    }
}

impl From<&RelevanceConfig> for RelevanceRule {
    fn from(config: &RelevanceConfig) -> Self {
        RelevanceRule {
            keyword: config.keyword.clone(),
            local_category_markers: config.local_category_markers.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlacementConfig {
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_angle_step")]
    pub angle_step_degrees: u32,
}

fn default_radius() -> f64 {
    OFFSET_RADIUS
}

fn default_angle_step() -> u32 {
    ANGLE_STEP_DEGREES
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            angle_step_degrees: default_angle_step(),
        }
    }
}

impl From<&PlacementConfig> for Placement {
    fn from(config: &PlacementConfig) -> Self {
        Placement {
            radius: config.radius,
            angle_step_degrees: config.angle_step_degrees,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecencyConfig {
    /// Articles older than this are dropped. Zero keeps everything.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
    /// Keep only articles published on the current local day.
    #[serde(default)]
    pub today_only: bool,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_max_age_days() -> i64 {
    DEFAULT_MAX_AGE_DAYS
}

fn default_utc_offset_hours() -> i32 {
    SGT_OFFSET_SECS / 3600
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            today_only: false,
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

// Reads a file and expands `${VAR}` placeholders from the environment.
// Unset variables expand to the empty string. Returns Ok(None) if the file
// does not exist.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded.into_owned()))
}

/// Loads the application configuration.
///
/// An explicit `config_path` must exist; the default `moodmap.yml` is
/// optional. After all layers, a missing analysis key is taken from
/// `AI_API_KEY`.
pub fn get_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    match config_path {
        Some(path) => {
            let content = read_and_substitute(path)?
                .ok_or_else(|| ConfigError::NotFound(path.display().to_string()))?;
            info!("Loading configuration from '{}'.", path.display());
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            if let Some(content) = read_and_substitute(Path::new(DEFAULT_CONFIG_FILE))? {
                info!("Loading configuration from '{DEFAULT_CONFIG_FILE}'.");
                builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
            }
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("MOODMAP")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    if config.analysis.api_key.as_deref().map_or(true, str::is_empty) {
        if let Ok(key) = env::var("AI_API_KEY") {
            if !key.is_empty() {
                config.analysis.api_key = Some(key);
            }
        }
    }

    Ok(config)
}
