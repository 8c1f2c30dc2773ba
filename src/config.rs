use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HippoConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

/// Hard cap on results per call; larger limits are clamped, not rejected.
pub const MAX_LIMIT: usize = 100;
/// Weight of semantic similarity in the recall score.
pub const SIMILARITY_WEIGHT: f64 = 0.7;
/// Weight of significance in the recall score.
pub const SIGNIFICANCE_WEIGHT: f64 = 0.3;
/// Vector candidates fetched per requested result before filtering.
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// Recall and pattern-completion settings. Only the default result count is
/// tunable; the score weights, the cap, and the candidate multiplier are fixed.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Result count when the caller does not pass a limit.
    pub default_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 7788,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_hippo_dir()
            .join("graph.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_hippo_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

/// Returns `~/.hippograph/`
pub fn default_hippo_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".hippograph")
}

/// Returns the default config file path: `~/.hippograph/config.toml`
pub fn default_config_path() -> PathBuf {
    default_hippo_dir().join("config.toml")
}

impl HippoConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            HippoConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside the ranges the engine supports.
    pub fn validate(&self) -> Result<()> {
        let default_limit = self.retrieval.default_limit;
        if !(1..=MAX_LIMIT).contains(&default_limit) {
            bail!("retrieval.default_limit must be in [1, {MAX_LIMIT}], got {default_limit}");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// (HIPPOGRAPH_DB, HIPPOGRAPH_LOG_LEVEL, HIPPOGRAPH_EMBEDDING_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HIPPOGRAPH_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("HIPPOGRAPH_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("HIPPOGRAPH_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

impl RetrievalConfig {
    /// Apply the default when absent and clamp into `[1, MAX_LIMIT]`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).clamp(1, MAX_LIMIT)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
