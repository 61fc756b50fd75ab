//! Provider settings passed read-only into every generation call.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::logging::redact;
use crate::model::Provider;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which provider is active and how to reach it.
///
/// The core only ever borrows this value. Edits happen outside the core by
/// building a new value, e.g. with [`AppSettings::with_provider`].
#[derive(Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Active provider identity.
    pub provider: Provider,
    /// Secret for the active provider.
    pub api_key: String,
    /// Remembered secret per provider.
    pub keys: HashMap<Provider, String>,
    /// Image model override for REST providers.
    pub image_model: Option<String>,
    /// Text model override for REST providers.
    pub text_model: Option<String>,
    /// Endpoint override for REST providers.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Google,
            api_key: String::new(),
            keys: HashMap::new(),
            image_model: None,
            text_model: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AppSettings {
    /// Settings for `provider` with a single remembered key.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let mut keys = HashMap::new();
        if !api_key.is_empty() {
            keys.insert(provider.clone(), api_key.clone());
        }
        Self { provider, api_key, keys, ..Self::default() }
    }

    /// Switch the active provider, restoring its remembered key.
    ///
    /// The current key is remembered for the current provider first, so no
    /// provider's key is lost.
    #[must_use]
    pub fn with_provider(&self, provider: Provider) -> Self {
        let mut keys = self.keys.clone();
        if !self.api_key.is_empty() {
            keys.insert(self.provider.clone(), self.api_key.clone());
        }
        let api_key = keys.get(&provider).cloned().unwrap_or_default();
        Self { provider, api_key, keys, ..self.clone() }
    }

    /// Remember `key` for `provider`, activating it when that provider is active.
    #[must_use]
    pub fn with_key(&self, provider: Provider, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut next = self.clone();
        if provider == next.provider {
            next.api_key.clone_from(&key);
        }
        next.keys.insert(provider, key);
        next
    }

    /// The active key, if non-blank.
    #[must_use]
    pub fn active_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// Image model for REST providers.
    #[must_use]
    pub fn rest_image_model(&self) -> String {
        non_blank(self.image_model.as_deref())
            .unwrap_or_else(|| self.provider.default_image_model())
            .to_string()
    }

    /// Text model for REST providers.
    #[must_use]
    pub fn rest_text_model(&self) -> String {
        non_blank(self.text_model.as_deref())
            .unwrap_or_else(|| self.provider.default_text_model())
            .to_string()
    }

    /// Endpoint override, if non-blank.
    #[must_use]
    pub fn base_url_override(&self) -> Option<&str> {
        non_blank(self.base_url.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: HashMap<&str, String> =
            self.keys.iter().map(|(p, k)| (p.as_str(), redact(k))).collect();
        f.debug_struct("AppSettings")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("keys", &keys)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
