//! Cassette-backed [`ProviderAdapter`].

use std::sync::{Arc, Mutex};

use crate::cassette::format::PROVIDER_PORT;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::{GenerationError, GenerationResult};
use crate::ports::provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
use crate::settings::AppSettings;

/// Serves recorded results in order; never touches the network.
pub struct ReplayingProvider {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingProvider {
    /// Replay from `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }

    fn next(&self, method: &str) -> GenerationResult<String> {
        let mut guard = self
            .replayer
            .lock()
            .map_err(|_| GenerationError::Config("cassette replayer lock poisoned".into()))?;
        guard.next_result(PROVIDER_PORT, method)
    }
}

impl ProviderAdapter for ReplayingProvider {
    fn generate_image<'a>(
        &'a self,
        _config: &'a GenerationConfig,
        _settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        let result = self.next("generate_image");
        Box::pin(async move { result })
    }

    fn generate_variation<'a>(
        &'a self,
        _input_image: &'a str,
        _instruction: &'a str,
        _model: &'a str,
        _settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        let result = self.next("generate_variation");
        Box::pin(async move { result })
    }

    fn generate_text<'a>(
        &'a self,
        _prompt: &'a str,
        _system_instruction: &'a str,
        _settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        let result = self.next("generate_text");
        Box::pin(async move { result })
    }
}
