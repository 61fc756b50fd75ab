//! Provider identities, model aliases and model tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flash-tier native image model.
pub const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Pro-tier native image model.
pub const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
/// Lightweight native model used for text completions.
pub const NATIVE_TEXT_MODEL: &str = "gemini-2.5-flash";
/// Placeholder model name nodes carry when they were produced by a REST provider.
pub const EXTERNAL_MODEL_PLACEHOLDER: &str = "External";

/// A configured provider identity.
///
/// Identities are persisted as plain strings. Anything unrecognized is kept as
/// [`Provider::Legacy`] so older settings still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    /// Google Gemini through its native multimodal API.
    Google,
    /// `OpenAI` REST API.
    OpenAi,
    /// Custom OpenAI-compatible gateway (`OpenRouter` by default).
    Custom,
    /// An identity this build does not know about.
    Legacy(String),
}

impl Provider {
    /// The persisted identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::Custom => "custom",
            Self::Legacy(name) => name,
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google",
            Self::OpenAi => "OpenAI",
            Self::Custom => "Custom/OpenRouter",
            Self::Legacy(name) => name,
        }
    }

    /// Environment variable that supplies this provider's key.
    #[must_use]
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Google => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Custom | Self::Legacy(_) => "OPENROUTER_API_KEY",
        }
    }

    /// Whether this provider talks to the native multimodal API.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Google)
    }

    /// Image model used by REST providers when settings carry no override.
    #[must_use]
    pub fn default_image_model(&self) -> &'static str {
        match self {
            Self::Google => FLASH_IMAGE_MODEL,
            Self::OpenAi => "dall-e-3",
            Self::Custom | Self::Legacy(_) => "google/gemini-3-pro-image-preview",
        }
    }

    /// Text model used by REST providers when settings carry no override.
    #[must_use]
    pub fn default_text_model(&self) -> &'static str {
        match self {
            Self::Google => NATIVE_TEXT_MODEL,
            Self::OpenAi => "gpt-4o-mini",
            Self::Custom | Self::Legacy(_) => "google/gemini-2.5-flash",
        }
    }
}

impl From<&str> for Provider {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Self::Google,
            "openai" => Self::OpenAi,
            "custom" => Self::Custom,
            _ => Self::Legacy(value.to_string()),
        }
    }
}

impl From<String> for Provider {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Provider> for String {
    fn from(value: Provider) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Native model tiers. Only the pro tier accepts an explicit image size hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Fast, lower-cost tier.
    Flash,
    /// Higher-quality tier.
    Pro,
}

impl ModelTier {
    /// Classify a resolved native model name.
    #[must_use]
    pub fn of(model: &str) -> Self {
        if model == PRO_IMAGE_MODEL || model.contains("-pro-") {
            Self::Pro
        } else {
            Self::Flash
        }
    }
}

/// Short name aliases for popular models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", FLASH_IMAGE_MODEL),
    ("nano-banana-pro", PRO_IMAGE_MODEL),
    ("flash", FLASH_IMAGE_MODEL),
    ("pro", PRO_IMAGE_MODEL),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    for &(alias, full) in ALIASES {
        if name == alias {
            return full.to_string();
        }
    }
    name.to_string()
}

/// Resolve the model a native image call should use.
///
/// Empty names and the REST placeholder fall back to the flash tier.
#[must_use]
pub fn resolve_native_image_model(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == EXTERNAL_MODEL_PLACEHOLDER {
        FLASH_IMAGE_MODEL.to_string()
    } else {
        resolve_model(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_nano_banana() {
        assert_eq!(resolve_model("nano-banana"), FLASH_IMAGE_MODEL);
        assert_eq!(resolve_model("nano-banana-pro"), PRO_IMAGE_MODEL);
    }

    #[test]
    fn resolve_exact_name_passthrough() {
        assert_eq!(resolve_model("gemini-3-pro-image-preview"), PRO_IMAGE_MODEL);
        assert_eq!(resolve_model("dall-e-3"), "dall-e-3");
    }

    #[test]
    fn placeholder_resolves_to_flash() {
        assert_eq!(resolve_native_image_model("External"), FLASH_IMAGE_MODEL);
        assert_eq!(resolve_native_image_model(""), FLASH_IMAGE_MODEL);
        assert_eq!(resolve_native_image_model("pro"), PRO_IMAGE_MODEL);
    }

    #[test]
    fn tier_detection() {
        assert_eq!(ModelTier::of(PRO_IMAGE_MODEL), ModelTier::Pro);
        assert_eq!(ModelTier::of(FLASH_IMAGE_MODEL), ModelTier::Flash);
    }

    #[test]
    fn provider_identity_parsing() {
        assert_eq!(Provider::from("google"), Provider::Google);
        assert_eq!(Provider::from("OpenAI"), Provider::OpenAi);
        assert_eq!(Provider::from("custom"), Provider::Custom);
        assert_eq!(Provider::from("openrouter"), Provider::Legacy("openrouter".into()));
    }

    #[test]
    fn provider_serde_keeps_legacy_identity() {
        let p: Provider = serde_json::from_str("\"openrouter\"").unwrap();
        assert_eq!(p, Provider::Legacy("openrouter".into()));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"openrouter\"");
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openai\"");
    }
}
