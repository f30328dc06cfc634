use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "PDCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for every environment override read by `PipelineConfig::from_env`.
pub const ENV_PREFIX: &str = "PDCARE_";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "pdcare=info"
}

/// Get the application data directory (~/.pdcare/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".pdcare"))
}

/// Directory holding deferred care-tip results, one JSON file per request.
pub fn care_tip_cache_dir() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("care_tip_cache"))
}

/// Tunables for retrieval, generation, and deferred delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Articles kept after diversification.
    pub articles_k: usize,
    /// Media items kept after diversification.
    pub media_k: usize,
    /// Characters of each article body passed to generation.
    pub excerpt_chars: usize,
    /// Generated text shorter than this (trimmed, in chars) is discarded.
    pub min_generated_chars: usize,
    /// Attempts per index query before it counts as failed.
    pub query_attempts: usize,
    pub ollama_url: String,
    pub ollama_model: String,
    pub generation_timeout_secs: u64,
    pub temperature: f32,
    pub classifier_url: String,
    pub classifier_timeout_secs: u64,
    /// `None` keeps deferred results in memory only. `PDCARE_PERSIST_RESULTS`
    /// points it at `care_tip_cache_dir()`.
    pub cache_dir: Option<PathBuf>,
    pub deferred_queue_capacity: usize,
    pub deferred_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            articles_k: 3,
            media_k: 2,
            excerpt_chars: 600,
            min_generated_chars: 50,
            query_attempts: 2,
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "medgemma:latest".into(),
            generation_timeout_secs: 120,
            temperature: 0.3,
            classifier_url: "http://localhost:8501".into(),
            classifier_timeout_secs: 10,
            cache_dir: None,
            deferred_queue_capacity: 64,
            deferred_workers: 2,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `PDCARE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `PDCARE_*` key. Split out from `from_env` so tests need not touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((k, v)) = get("ARTICLES_K") {
            config.articles_k = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("MEDIA_K") {
            config.media_k = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("EXCERPT_CHARS") {
            config.excerpt_chars = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("MIN_GENERATED_CHARS") {
            config.min_generated_chars = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("QUERY_ATTEMPTS") {
            config.query_attempts = parse_nonzero(&k, &v)?;
        }
        if let Some((_, v)) = get("OLLAMA_URL") {
            config.ollama_url = v;
        }
        if let Some((_, v)) = get("OLLAMA_MODEL") {
            config.ollama_model = v;
        }
        if let Some((k, v)) = get("GENERATION_TIMEOUT_SECS") {
            config.generation_timeout_secs = parse(&k, &v)?;
        }
        if let Some((k, v)) = get("TEMPERATURE") {
            config.temperature = parse(&k, &v)?;
        }
        if let Some((_, v)) = get("CLASSIFIER_URL") {
            config.classifier_url = v;
        }
        if let Some((k, v)) = get("CLASSIFIER_TIMEOUT_SECS") {
            config.classifier_timeout_secs = parse(&k, &v)?;
        }
        if let Some((_, v)) = get("CACHE_DIR") {
            config.cache_dir = if v.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            };
        }
        // An explicit CACHE_DIR wins over the default location.
        if let Some((k, v)) = get("PERSIST_RESULTS") {
            if parse::<bool>(&k, &v)? && config.cache_dir.is_none() {
                config.cache_dir = Some(care_tip_cache_dir()?);
            }
        }
        if let Some((k, v)) = get("DEFERRED_QUEUE_CAPACITY") {
            config.deferred_queue_capacity = parse_nonzero(&k, &v)?;
        }
        if let Some((k, v)) = get("DEFERRED_WORKERS") {
            config.deferred_workers = parse_nonzero(&k, &v)?;
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_nonzero(key: &str, value: &str) -> Result<usize, ConfigError> {
    match parse::<usize>(key, value)? {
        0 => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
        n => Ok(n),
    }
}
