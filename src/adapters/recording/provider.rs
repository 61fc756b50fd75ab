//! Recording wrapper around any [`ProviderAdapter`].

use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::warn;

use super::{image_summary, settings_summary};
use crate::cassette::recorder::CassetteRecorder;
use crate::error::GenerationResult;
use crate::ports::provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
use crate::settings::AppSettings;

/// Delegates to `inner` and appends every outcome to the shared recorder.
pub struct RecordingProvider {
    inner: Box<dyn ProviderAdapter>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProvider {
    /// Wrap `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn ProviderAdapter>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }

    fn record(&self, method: &str, input: serde_json::Value, result: &GenerationResult<String>) {
        match self.recorder.lock() {
            Ok(mut guard) => guard.record(method, input, result),
            Err(_) => warn!(method, "cassette recorder lock poisoned; interaction not recorded"),
        }
    }
}

impl ProviderAdapter for RecordingProvider {
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        Box::pin(async move {
            let result = self.inner.generate_image(config, settings).await;
            let input = json!({ "settings": settings_summary(settings), "config": config });
            self.record("generate_image", input, &result);
            result
        })
    }

    fn generate_variation<'a>(
        &'a self,
        input_image: &'a str,
        instruction: &'a str,
        model: &'a str,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        Box::pin(async move {
            let result =
                self.inner.generate_variation(input_image, instruction, model, settings).await;
            let input = json!({
                "settings": settings_summary(settings),
                "image": image_summary(input_image),
                "instruction": instruction,
                "model": model,
            });
            self.record("generate_variation", input, &result);
            result
        })
    }

    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        Box::pin(async move {
            let result = self.inner.generate_text(prompt, system_instruction, settings).await;
            let input = json!({
                "settings": settings_summary(settings),
                "prompt": prompt,
                "systemInstruction": system_instruction,
            });
            self.record("generate_text", input, &result);
            result
        })
    }
}
