//! Provider routing.
//!
//! [`ProviderRouter::route`] maps a provider identity to one of a closed set of
//! adapters. The router is itself a [`ProviderAdapter`] that routes on
//! `settings.provider` for every call, so nothing downstream branches on the
//! provider again.

use reqwest::Client;
use tracing::debug;

use crate::adapters::live::gemini::GeminiAdapter;
use crate::adapters::live::openai::RestChatAdapter;
use crate::model::Provider;
use crate::ports::provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
use crate::settings::AppSettings;

/// Environment variables consulted for the native default credential, in order.
const DEFAULT_CREDENTIAL_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];
/// Environment variable holding the `HTTP-Referer` sent to gateways.
const REFERER_VAR: &str = "STORYBOARD_APP_REFERER";

/// The adapter selected for one provider.
#[derive(Clone)]
pub enum RoutedAdapter {
    /// Native multimodal API.
    Native(GeminiAdapter),
    /// OpenAI-compatible REST API.
    Rest(RestChatAdapter),
}

impl RoutedAdapter {
    fn inner(&self) -> &dyn ProviderAdapter {
        match self {
            Self::Native(adapter) => adapter,
            Self::Rest(adapter) => adapter,
        }
    }
}

impl ProviderAdapter for RoutedAdapter {
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        self.inner().generate_image(config, settings)
    }

    fn generate_variation<'a>(
        &'a self,
        input_image: &'a str,
        instruction: &'a str,
        model: &'a str,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        self.inner().generate_variation(input_image, instruction, model, settings)
    }

    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        self.inner().generate_text(prompt, system_instruction, settings)
    }
}

/// Selects and drives the adapter for the configured provider.
#[derive(Clone)]
pub struct ProviderRouter {
    native: GeminiAdapter,
    openai: RestChatAdapter,
    gateway: RestChatAdapter,
}

impl ProviderRouter {
    /// Create a router sharing `client` across adapters.
    #[must_use]
    pub fn new(client: Client, default_credential: Option<String>) -> Self {
        Self {
            native: GeminiAdapter::new(client.clone(), default_credential),
            openai: RestChatAdapter::openai(client.clone()),
            gateway: RestChatAdapter::gateway(client),
        }
    }

    /// Create a router whose native default credential comes from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let credential = DEFAULT_CREDENTIAL_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        let router = Self::new(Client::new(), credential);
        match std::env::var(REFERER_VAR).ok().filter(|v| !v.trim().is_empty()) {
            Some(referer) => router.with_app_referer(referer.trim()),
            None => router,
        }
    }

    /// Attribute REST gateway calls to `referer`.
    #[must_use]
    pub fn with_app_referer(mut self, referer: impl Into<String>) -> Self {
        let referer = referer.into();
        self.openai = self.openai.with_referer(referer.clone());
        self.gateway = self.gateway.with_referer(referer);
        self
    }

    /// Point the native adapter at a different API base.
    #[must_use]
    pub fn with_native_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.native = self.native.with_base_url(base_url);
        self
    }

    /// Adapter for a provider identity.
    ///
    /// Unknown and legacy identities get the generic gateway adapter.
    #[must_use]
    pub fn route(&self, provider: &Provider) -> RoutedAdapter {
        match provider {
            Provider::Google => RoutedAdapter::Native(self.native.clone()),
            Provider::OpenAi => RoutedAdapter::Rest(self.openai.clone()),
            Provider::Custom | Provider::Legacy(_) => RoutedAdapter::Rest(self.gateway.clone()),
        }
    }

    fn route_for(&self, settings: &AppSettings) -> RoutedAdapter {
        debug!(provider = settings.provider.as_str(), "routing request");
        self.route(&settings.provider)
    }
}

impl ProviderAdapter for ProviderRouter {
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        let adapter = self.route_for(settings);
        Box::pin(async move { adapter.generate_image(config, settings).await })
    }

    fn generate_variation<'a>(
        &'a self,
        input_image: &'a str,
        instruction: &'a str,
        model: &'a str,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        let adapter = self.route_for(settings);
        Box::pin(async move {
            adapter.generate_variation(input_image, instruction, model, settings).await
        })
    }

    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        let adapter = self.route_for(settings);
        Box::pin(async move { adapter.generate_text(prompt, system_instruction, settings).await })
    }
}
