//! Configuration management for EatMate.
//!
//! Loads settings from `~/.config/eatmate/config.toml` with environment overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_RECIPES_URL: &str = "https://api.spoonacular.com";
pub const DEFAULT_ASSISTANT_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_RESULTS_PER_SEARCH: u32 = 10;

/// Shown in place of a configured secret.
pub const REDACTED: &str = "***";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub recipes: RecipesConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub app: AppConfig,
}

/// Recipe/nutrition API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipesConfig {
    #[serde(default = "default_recipes_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_results_per_search")]
    pub results_per_search: u32,
    /// 1 = maximize used ingredients, 2 = minimize missing ingredients.
    #[serde(default = "default_ranking")]
    pub ranking: u8,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// Completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_preferences_path")]
    pub preferences: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub log_verbosity: LogVerbosity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    Minimal,
    #[default]
    Compact,
    Verbose,
}

// Default value functions
fn default_recipes_url() -> String { DEFAULT_RECIPES_URL.to_string() }
fn default_assistant_url() -> String { DEFAULT_ASSISTANT_URL.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_max_tokens() -> u32 { DEFAULT_MAX_TOKENS }
fn default_results_per_search() -> u32 { DEFAULT_RESULTS_PER_SEARCH }
fn default_ranking() -> u8 { 1 }
fn default_cache_ttl_secs() -> u64 { 3600 }
fn default_preferences_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eatmate")
        .join("preferences.toml")
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            base_url: default_recipes_url(),
            api_key: None,
            results_per_search: default_results_per_search(),
            ranking: default_ranking(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences: default_preferences_path(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eatmate")
            .join("config.toml")
    }

    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("SPOONACULAR_API_KEY") {
            self.recipes.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.assistant.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("EATMATE_RECIPES_URL") {
            self.recipes.base_url = url;
        }
        if let Ok(url) = std::env::var("EATMATE_ASSISTANT_URL") {
            self.assistant.base_url = url;
        }
        if let Ok(model) = std::env::var("EATMATE_MODEL") {
            self.assistant.model = model;
        }
        self
    }

    /// Copy safe to print: configured API keys are masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for key in [&mut config.recipes.api_key, &mut config.assistant.api_key] {
            if key.is_some() {
                *key = Some(REDACTED.to_string());
            }
        }
        config
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, content).map_err(ConfigError::Io)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
