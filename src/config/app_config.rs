//! Application configuration module for ragconsole
//!
//! Provides TOML-based configuration with environment variable override support.
//! Priority: CLI args > Environment variables > Config file > Defaults

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::path_resolver;
use super::{SearchMode, WeightVector};

/// Toggles applied to every new search session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DefaultToggles {
    /// Enable hybrid (lexical + vector) search by default
    #[serde(default)]
    pub hybrid: bool,
    /// Enable re-ranking by default
    #[serde(default)]
    pub reranking: bool,
    /// Enable live (debounced) search by default
    #[serde(default)]
    pub live_search: bool,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the RAG backend
    #[serde(default = "default_api_base_url")]
    api_base_url: String,

    /// Default number of results to request
    #[serde(default = "default_top_k")]
    default_top_k: usize,

    /// Default page size for paginated results
    #[serde(default = "default_page_size")]
    default_page_size: usize,

    /// Default search mode: plain or agentic
    #[serde(default)]
    default_search_mode: SearchMode,

    /// Default model key for code generation
    #[serde(default = "default_model_key")]
    default_model_key: String,

    /// Live-search debounce delay in milliseconds
    #[serde(default = "default_live_search_delay_ms")]
    live_search_delay_ms: u64,

    /// Optional per-request timeout; none means the HTTP client default
    #[serde(default)]
    request_timeout_secs: Option<u64>,

    /// Drop responses that arrive after a newer dispatch was already applied
    #[serde(default)]
    discard_stale_responses: bool,

    /// Where experiment presets are persisted (default: data dir)
    #[serde(default)]
    presets_file: Option<String>,

    /// Default rerank weights
    #[serde(default)]
    default_weights: WeightVector,

    /// Default toggles for new sessions
    #[serde(default)]
    default_toggles: DefaultToggles,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_page_size() -> usize {
    10
}

fn default_model_key() -> String {
    "mistral".to_string()
}

fn default_live_search_delay_ms() -> u64 {
    400
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            default_top_k: default_top_k(),
            default_page_size: default_page_size(),
            default_search_mode: SearchMode::default(),
            default_model_key: default_model_key(),
            live_search_delay_ms: default_live_search_delay_ms(),
            request_timeout_secs: None,
            discard_stale_responses: false,
            presets_file: None,
            default_weights: WeightVector::default(),
            default_toggles: DefaultToggles::default(),
        }
    }
}

impl AppConfig {
    /// Create config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Load the config file at `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RAGCONSOLE_API_BASE_URL") {
            config.api_base_url = url;
        }

        if let Ok(top_k) = std::env::var("RAGCONSOLE_TOP_K") {
            if let Ok(n) = top_k.parse() {
                config.default_top_k = n;
            }
        }

        if let Ok(mode) = std::env::var("RAGCONSOLE_SEARCH_MODE") {
            match mode.parse() {
                Ok(mode) => config.default_search_mode = mode,
                Err(e) => tracing::warn!("Ignoring RAGCONSOLE_SEARCH_MODE: {}", e),
            }
        }

        if let Ok(model) = std::env::var("RAGCONSOLE_MODEL_KEY") {
            config.default_model_key = model;
        }

        config
    }

    /// Merge with another config (other takes priority for non-default values)
    pub fn merge_with(&self, other: &Self) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: if other.api_base_url != defaults.api_base_url {
                other.api_base_url.clone()
            } else {
                self.api_base_url.clone()
            },
            default_top_k: if other.default_top_k != defaults.default_top_k {
                other.default_top_k
            } else {
                self.default_top_k
            },
            default_page_size: if other.default_page_size != defaults.default_page_size {
                other.default_page_size
            } else {
                self.default_page_size
            },
            default_search_mode: if other.default_search_mode != defaults.default_search_mode {
                other.default_search_mode
            } else {
                self.default_search_mode
            },
            default_model_key: if other.default_model_key != defaults.default_model_key {
                other.default_model_key.clone()
            } else {
                self.default_model_key.clone()
            },
            live_search_delay_ms: if other.live_search_delay_ms != defaults.live_search_delay_ms {
                other.live_search_delay_ms
            } else {
                self.live_search_delay_ms
            },
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            discard_stale_responses: other.discard_stale_responses
                || self.discard_stale_responses,
            presets_file: other
                .presets_file
                .clone()
                .or_else(|| self.presets_file.clone()),
            default_weights: if other.default_weights != defaults.default_weights {
                other.default_weights
            } else {
                self.default_weights
            },
            default_toggles: if other.default_toggles != defaults.default_toggles {
                other.default_toggles
            } else {
                self.default_toggles
            },
        }
    }

    /// Override api_base_url
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Override default_top_k
    pub fn with_default_top_k(mut self, k: usize) -> Self {
        self.default_top_k = k;
        self
    }

    /// Override default_search_mode
    pub fn with_default_search_mode(mut self, mode: SearchMode) -> Self {
        self.default_search_mode = mode;
        self
    }

    /// Override default_weights (snapped to the slider grid)
    pub fn with_default_weights(mut self, weights: WeightVector) -> Self {
        self.default_weights = WeightVector::new(weights.dense, weights.cross, weights.meta);
        self
    }

    /// Override default_toggles
    pub fn with_default_toggles(mut self, toggles: DefaultToggles) -> Self {
        self.default_toggles = toggles;
        self
    }

    /// Override live_search_delay_ms
    pub fn with_live_search_delay_ms(mut self, delay_ms: u64) -> Self {
        self.live_search_delay_ms = delay_ms;
        self
    }

    /// Override discard_stale_responses
    pub fn with_discard_stale_responses(mut self, discard: bool) -> Self {
        self.discard_stale_responses = discard;
        self
    }

    /// Override presets_file
    pub fn with_presets_file(mut self, path: &str) -> Self {
        self.presets_file = Some(path.to_string());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_top_k == 0 {
            return Err(anyhow!("default_top_k must be greater than 0"));
        }

        if self.default_page_size == 0 {
            return Err(anyhow!("default_page_size must be greater than 0"));
        }

        reqwest::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow!("Invalid api_base_url '{}': {}", self.api_base_url, e))?;

        if !self.default_weights.is_valid() {
            return Err(anyhow!(
                "default_weights must each lie within [0, 1], got {:?}",
                self.default_weights
            ));
        }

        if self.default_model_key.trim().is_empty() {
            return Err(anyhow!("default_model_key must not be empty"));
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize config: {}", e))
    }

    /// Persist to `path` so the values seed new sessions
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        path_resolver::write_atomic(path, &content)
    }

    // Getters
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn default_search_mode(&self) -> SearchMode {
        self.default_search_mode
    }

    pub fn default_model_key(&self) -> &str {
        &self.default_model_key
    }

    pub fn live_search_delay(&self) -> Duration {
        Duration::from_millis(self.live_search_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn discard_stale_responses(&self) -> bool {
        self.discard_stale_responses
    }

    pub fn default_weights(&self) -> WeightVector {
        self.default_weights
    }

    pub fn default_toggles(&self) -> DefaultToggles {
        self.default_toggles
    }

    /// Resolved preset file path
    pub fn presets_path(&self) -> PathBuf {
        match &self.presets_file {
            Some(path) => path_resolver::resolve_path(path).unwrap_or_else(|_| PathBuf::from(path)),
            None => path_resolver::get_default_presets_path(),
        }
    }
}
