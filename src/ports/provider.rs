//! Provider port: the capability contract every generation backend satisfies.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::GenerationResult;
use crate::params::AspectRatio;
use crate::settings::AppSettings;

/// One image generation request.
///
/// Built once per request and never modified afterwards; the `with_*` methods
/// consume the value during construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    model: String,
    aspect_ratio: AspectRatio,
    #[serde(default)]
    style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    camera_angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lighting: Option<String>,
    prompt: String,
}

impl GenerationConfig {
    /// Start a config for `prompt` on `model` with a square aspect ratio.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            aspect_ratio: AspectRatio::default(),
            style: String::new(),
            shot_type: None,
            camera_angle: None,
            lighting: None,
            prompt: prompt.into(),
        }
    }

    /// Set the aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set the artistic style.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Set the shot type.
    #[must_use]
    pub fn with_shot_type(mut self, shot_type: impl Into<String>) -> Self {
        self.shot_type = Some(shot_type.into());
        self
    }

    /// Set the camera angle.
    #[must_use]
    pub fn with_camera_angle(mut self, camera_angle: impl Into<String>) -> Self {
        self.camera_angle = Some(camera_angle.into());
        self
    }

    /// Set the lighting.
    #[must_use]
    pub fn with_lighting(mut self, lighting: impl Into<String>) -> Self {
        self.lighting = Some(lighting.into());
        self
    }

    /// Provider-specific model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requested aspect ratio.
    #[must_use]
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Artistic style, possibly empty.
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Shot type, if set.
    #[must_use]
    pub fn shot_type(&self) -> Option<&str> {
        self.shot_type.as_deref()
    }

    /// Camera angle, if set.
    #[must_use]
    pub fn camera_angle(&self) -> Option<&str> {
        self.camera_angle.as_deref()
    }

    /// Lighting, if set.
    #[must_use]
    pub fn lighting(&self) -> Option<&str> {
        self.lighting.as_deref()
    }

    /// The user's base prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Boxed future resolving to a generated artifact: a `data:` URI or an HTTP(S) URL.
pub type ArtifactFuture<'a> = Pin<Box<dyn Future<Output = GenerationResult<String>> + Send + 'a>>;

/// Boxed future resolving to generated text.
pub type TextFuture<'a> = Pin<Box<dyn Future<Output = GenerationResult<String>> + Send + 'a>>;

/// Generates images and text through an external provider.
///
/// Implementations hold no per-request state. A provider lacking a capability
/// fails with [`crate::GenerationError::UnsupportedOperation`] instead of degrading.
pub trait ProviderAdapter: Send + Sync {
    /// Text/config-only image synthesis.
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a>;

    /// Image-conditioned synthesis. `input_image` is a data URI, a remote URL or bare base64.
    fn generate_variation<'a>(
        &'a self,
        input_image: &'a str,
        instruction: &'a str,
        model: &'a str,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a>;

    /// Plain completion. Returns an empty string when the provider sends no text.
    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a>;
}
