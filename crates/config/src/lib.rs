//! Configuration loading, validation, and management for Baton.
//!
//! Loads configuration from `~/.baton/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use baton_core::GenerationDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Document store path that selects the in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// The root configuration structure.
///
/// Maps directly to `~/.baton/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatonConfig {
    /// Text generation defaults and runtime location
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Document store settings
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// The default model used for text generation
    #[serde(default = "default_model")]
    pub model: String,

    /// The default number of output tokens
    #[serde(default = "default_tokens")]
    pub tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Base URL of the Ollama-compatible runtime
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_model() -> String {
    "gemma".into()
}
fn default_tokens() -> u32 {
    64
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f32 {
    0.9
}
fn default_url() -> String {
    "http://localhost:11434".into()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            tokens: default_tokens(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            url: default_url(),
        }
    }
}

impl GenerationConfig {
    /// The defaults handed to the generator.
    pub fn defaults(&self) -> GenerationDefaults {
        GenerationDefaults {
            model: self.model.clone(),
            tokens: self.tokens,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// `:memory:` for an ephemeral store, otherwise a JSON-lines file path
    #[serde(default = "default_documents_path")]
    pub path: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Default number of documents retrieved for injection
    #[serde(default = "default_result_count")]
    pub result_count: usize,
}

fn default_documents_path() -> String {
    IN_MEMORY.into()
}
fn default_collection() -> String {
    baton_core::document::DEFAULT_COLLECTION.into()
}
fn default_result_count() -> usize {
    10
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            path: default_documents_path(),
            collection: default_collection(),
            result_count: default_result_count(),
        }
    }
}

impl DocumentsConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,

    /// "pretty" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_filter() -> String {
    "info".into()
}
fn default_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base commands the shell tool may run. Empty allows everything.
    #[serde(default)]
    pub shell_allowlist: Vec<String>,
}

impl BatonConfig {
    /// Load configuration from the default path (~/.baton/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `BATON_MODEL`
    /// - `BATON_URL`
    /// - `BATON_DOCUMENTS`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("BATON_MODEL") {
            self.generation.model = model;
        }
        if let Some(url) = lookup("BATON_URL") {
            self.generation.url = url;
        }
        if let Some(path) = lookup("BATON_DOCUMENTS") {
            self.documents.path = path;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".baton")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&g.top_p) {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be between 0.0 and 1.0".into(),
            ));
        }
        if g.tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.tokens must be > 0".into(),
            ));
        }
        if g.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "generation.model must not be empty".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
