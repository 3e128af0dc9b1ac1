//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.callcoach.toml` files.

use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".callcoach.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Trend aggregation settings.
    #[serde(default)]
    pub trends: TrendsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Path to the JSON call store.
    #[serde(default = "default_store")]
    pub store: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            store: default_store(),
        }
    }
}

fn default_store() -> String {
    "calls.json".to_string()
}

/// Which completion backend to call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ollama chat API (default)
    #[default]
    Ollama,
    /// Google Gemini generateContent API
    Gemini,
}

impl ProviderKind {
    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "llama3.2:latest",
            ProviderKind::Gemini => "gemini-2.5-flash",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Completion backend.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model name. Defaults per provider when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Base API URL. Defaults per provider when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Environment variable holding the API key (Gemini only).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            name: None,
            url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ModelConfig {
    /// The configured model name, or the provider's default.
    pub fn model_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The configured base URL, or the provider's default.
    pub fn base_url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_url())
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    120
}

/// Trend aggregation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    /// Number of most recent calls considered.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Minimum calls (and analyzed calls) before trends are reported.
    #[serde(default = "default_min_calls")]
    pub min_calls: usize,

    /// Share of "Needs Improvement" calls that triggers the warning trend.
    #[serde(default = "default_needs_improvement_percent")]
    pub needs_improvement_percent: u32,

    /// Share of calls that makes a grade the prevailing one.
    #[serde(default = "default_majority_percent")]
    pub majority_percent: u32,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_calls: default_min_calls(),
            needs_improvement_percent: default_needs_improvement_percent(),
            majority_percent: default_majority_percent(),
        }
    }
}

fn default_window_size() -> usize {
    10
}

fn default_min_calls() -> usize {
    3
}

fn default_needs_improvement_percent() -> u32 {
    30
}

fn default_majority_percent() -> u32 {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            // Provider-specific defaults follow the provider unless set again below.
            if provider != self.model.provider {
                self.model.name = None;
                self.model.url = None;
            }
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = Some(model.clone());
        }
        if let Some(ref url) = args.provider_url {
            self.model.url = Some(url.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(window) = args.window {
            self.trends.window_size = window;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref store) = args.store {
            self.general.store = store.display().to_string();
        }
    }

    /// Validate values that parse but make no sense.
    pub fn validate(&self) -> Result<()> {
        let trends = &self.trends;

        if trends.window_size == 0 {
            bail!("trends.window_size must be at least 1");
        }
        if trends.min_calls == 0 {
            bail!("trends.min_calls must be at least 1");
        }
        if !(1..=100).contains(&trends.needs_improvement_percent) {
            bail!("trends.needs_improvement_percent must be between 1 and 100");
        }
        if !(1..=100).contains(&trends.majority_percent) {
            bail!("trends.majority_percent must be between 1 and 100");
        }

        if !(0.0..=1.0).contains(&self.model.temperature) {
            bail!("model.temperature must be between 0.0 and 1.0");
        }
        if self.model.timeout_seconds == 0 {
            bail!("model.timeout_seconds must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
