//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GenerationError, GenerationResult};
use crate::model::Provider;
use crate::settings::{AppSettings, DEFAULT_TIMEOUT};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Active provider identity.
    pub provider: Option<Provider>,
    /// Endpoint override for REST providers.
    pub base_url: Option<String>,
    /// Image model override for REST providers.
    pub image_model: Option<String>,
    /// Text model override for REST providers.
    pub text_model: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Single key written by older versions; belongs to `provider`.
    api_key: Option<String>,
    /// Per-provider API keys.
    #[serde(default)]
    pub keys: KeysConfig,
}

/// Per-provider API keys.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub google: Option<String>,
    /// `OpenAI` API key.
    pub openai: Option<String>,
    /// Custom gateway API key.
    pub custom: Option<String>,
}

impl KeysConfig {
    fn slot(&mut self, provider: &Provider) -> &mut Option<String> {
        match provider {
            Provider::Google => &mut self.google,
            Provider::OpenAi => &mut self.openai,
            Provider::Custom | Provider::Legacy(_) => &mut self.custom,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> GenerationResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::parse(&contents).map_err(|e| match e {
            GenerationError::Config(msg) => {
                GenerationError::Config(format!("{msg} ({})", path.display()))
            }
            other => other,
        })
    }

    /// Parse TOML text, migrating a legacy top-level `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML.
    pub fn parse(contents: &str) -> GenerationResult<Self> {
        let mut config: Self = toml::from_str(contents)
            .map_err(|e| GenerationError::Config(format!("Failed to parse config: {e}")))?;
        config.migrate_legacy_key();
        Ok(config)
    }

    fn migrate_legacy_key(&mut self) {
        let Some(key) = self.api_key.take().filter(|k| !k.trim().is_empty()) else {
            return;
        };
        let provider = self.provider.clone().unwrap_or(Provider::Google);
        let slot = self.keys.slot(&provider);
        if slot.is_none() {
            *slot = Some(key);
        }
    }

    /// Build settings from this file plus the process environment.
    #[must_use]
    pub fn to_settings(&self, provider_override: Option<Provider>) -> AppSettings {
        self.to_settings_with_env(provider_override, |var| std::env::var(var).ok())
    }

    /// Build settings, reading environment variables through `env`.
    ///
    /// Environment keys win over file keys. `API_KEY` is a fallback for the
    /// native provider only.
    pub fn to_settings_with_env(
        &self,
        provider_override: Option<Provider>,
        env: impl Fn(&str) -> Option<String>,
    ) -> AppSettings {
        let env = |var: &str| env(var).filter(|v| !v.trim().is_empty());
        let provider =
            provider_override.or_else(|| self.provider.clone()).unwrap_or(Provider::Google);

        let google = env(Provider::Google.env_var())
            .or_else(|| self.keys.google.clone())
            .or_else(|| env("API_KEY"));
        let openai = env(Provider::OpenAi.env_var()).or_else(|| self.keys.openai.clone());
        let custom = env(Provider::Custom.env_var()).or_else(|| self.keys.custom.clone());

        let mut settings = AppSettings {
            provider: provider.clone(),
            image_model: self.image_model.clone(),
            text_model: self.text_model.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            ..AppSettings::default()
        };
        for (slot, key) in
            [(Provider::Google, google), (Provider::OpenAi, openai), (Provider::Custom, custom)]
        {
            if let Some(key) = key {
                settings.keys.insert(slot, key);
            }
        }
        let active = match &provider {
            Provider::Legacy(_) => Provider::Custom,
            other => other.clone(),
        };
        settings.api_key = settings.keys.get(&active).cloned().unwrap_or_default();
        settings
    }
}

/// Discover the config file path:
/// 1. Explicit path (from `--config`)
/// 2. `STORYBOARD_CONFIG` environment variable
/// 3. `~/.config/storyboard/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("STORYBOARD_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/storyboard/config.toml")
    } else {
        PathBuf::from("storyboard.toml")
    }
}
