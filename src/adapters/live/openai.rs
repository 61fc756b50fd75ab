//! Live adapter for `OpenAI`-compatible REST endpoints.
//!
//! Two incompatible protocol flavors hide behind the same providers: the
//! classic `/images/generations` endpoint and chat completions that return
//! images inside the assistant message. [`classify_endpoint`] picks one.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{parse_body, post_json};
use crate::error::{GenerationError, GenerationResult};
use crate::extract::{extract_image_reference, ChatCompletion};
use crate::params::{aspect_ratio_to_classic_size, degrades_to_square};
use crate::ports::provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
use crate::prompt::compose;
use crate::settings::AppSettings;

/// `OpenAI` API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Default multi-model gateway base.
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const IMAGE_GENERATIONS_PATH: &str = "/images/generations";
const GATEWAY_HOSTS: &[&str] = &["openrouter.ai"];

/// App title sent to the multi-model gateway.
const APP_TITLE: &str = "Nano Banana Storyboarder";

/// REST protocol flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// `POST .../images/generations`, base64 or URL result. No input images.
    ClassicImage,
    /// `POST .../chat/completions`, image embedded in the assistant message.
    ChatCompletion,
}

/// Whether a URL targets a known multi-model gateway.
#[must_use]
pub fn is_gateway(url: &str) -> bool {
    GATEWAY_HOSTS.iter().any(|host| url.contains(host))
}

/// Decide which protocol flavor an endpoint/model pair speaks.
///
/// Chat completions are used when the endpoint already names them, when the
/// host is a known gateway, or when the model is a Gemini or chat model (only
/// served through chat on `OpenAI`-compatible APIs). Everything else is classic.
#[must_use]
pub fn classify_endpoint(url: &str, model: &str) -> Flavor {
    if url.contains("chat/completions")
        || is_gateway(url)
        || model.contains("gemini")
        || model.contains("chat")
    {
        Flavor::ChatCompletion
    } else {
        Flavor::ClassicImage
    }
}

/// Whether a chat request must ask for image output explicitly.
#[must_use]
pub fn wants_image_modalities(url: &str, model: &str) -> bool {
    is_gateway(url) || model.contains("gemini")
}

/// Trim whitespace and trailing slashes.
#[must_use]
pub fn normalize_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// The chat-completions endpoint for a base URL.
#[must_use]
pub fn chat_endpoint(base: &str) -> String {
    let base = normalize_base(base);
    if base.contains(CHAT_COMPLETIONS_PATH) {
        base
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}

/// The classic image-generation endpoint for a base URL.
#[must_use]
pub fn image_endpoint(base: &str) -> String {
    let base = normalize_base(base);
    if base.ends_with(IMAGE_GENERATIONS_PATH) {
        base
    } else {
        format!("{base}{IMAGE_GENERATIONS_PATH}")
    }
}

/// Adapter for `OpenAI` and OpenAI-compatible gateways.
#[derive(Clone)]
pub struct RestChatAdapter {
    client: Client,
    default_base: &'static str,
    referer: Option<String>,
}

impl RestChatAdapter {
    /// Adapter defaulting to the `OpenAI` API.
    #[must_use]
    pub fn openai(client: Client) -> Self {
        Self { client, default_base: OPENAI_API_BASE, referer: None }
    }

    /// Adapter defaulting to the multi-model gateway.
    #[must_use]
    pub fn gateway(client: Client) -> Self {
        Self { client, default_base: OPENROUTER_API_BASE, referer: None }
    }

    /// Send `referer` as `HTTP-Referer` on gateway calls.
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    fn base_url(&self, settings: &AppSettings) -> String {
        normalize_base(settings.base_url_override().unwrap_or(self.default_base))
    }

    fn require_key<'s>(&self, settings: &'s AppSettings) -> GenerationResult<&'s str> {
        settings.active_key().ok_or_else(|| GenerationError::MissingCredential {
            provider: settings.provider.display_name().to_string(),
            hint: format!("Add it in settings or set {}.", settings.provider.env_var()),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
        settings: &AppSettings,
    ) -> GenerationResult<String> {
        let key = self.require_key(settings)?;
        let headers = request_headers(endpoint, key, self.referer.as_deref())?;
        post_json(&self.client, endpoint, headers, body, settings.timeout).await
    }

    async fn chat_image(
        &self,
        base: &str,
        prompt: &str,
        input_image: Option<&str>,
        model: &str,
        settings: &AppSettings,
    ) -> GenerationResult<String> {
        let endpoint = chat_endpoint(base);
        let body = chat_image_body(&endpoint, model, prompt, input_image);
        debug!(%endpoint, model, with_input = input_image.is_some(), "chat-completion image request");

        let text = self.post(&endpoint, &body, settings).await?;
        let completion: ChatCompletion = parse_body(&text)?;
        let message = completion.first_message().ok_or_else(|| {
            GenerationError::EmptyResponse("no message found in chat completion response".into())
        })?;
        extract_image_reference(message)
    }

    async fn classic_image(
        &self,
        base: &str,
        prompt: &str,
        aspect_ratio: &str,
        model: &str,
        settings: &AppSettings,
    ) -> GenerationResult<String> {
        let endpoint = image_endpoint(base);
        if degrades_to_square(aspect_ratio) {
            warn!(aspect_ratio, "classic image endpoint has no matching size; rendering 1024x1024");
        }
        let body = ClassicImageRequest {
            model,
            prompt,
            n: 1,
            size: aspect_ratio_to_classic_size(aspect_ratio),
            response_format: "b64_json",
        };
        debug!(%endpoint, model, size = body.size, "classic image request");

        let text = self.post(&endpoint, &body, settings).await?;
        let parsed: ClassicImageResponse = parse_body(&text)?;
        classic_artifact(parsed)
    }
}

/// Headers for a REST call: bearer auth plus gateway attribution when needed.
///
/// `HTTP-Referer` is only sent when a referer has been configured.
fn request_headers(
    endpoint: &str,
    key: &str,
    referer: Option<&str>,
) -> GenerationResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
        GenerationError::InvalidArgument("API key contains invalid header characters".into())
    })?;
    headers.insert(AUTHORIZATION, auth);
    if is_gateway(endpoint) {
        if let Some(referer) = referer {
            let value = HeaderValue::from_str(referer).map_err(|_| {
                GenerationError::InvalidArgument("referer contains invalid header characters".into())
            })?;
            headers.insert("http-referer", value);
        }
        headers.insert("x-title", HeaderValue::from_static(APP_TITLE));
    }
    Ok(headers)
}

/// Body of a chat-completion image request.
fn chat_image_body(
    endpoint: &str,
    model: &str,
    prompt: &str,
    input_image: Option<&str>,
) -> ChatRequest {
    let content = match input_image {
        Some(image) => ChatContent::Parts(vec![
            ChatPart::Text { text: prompt.to_string() },
            ChatPart::ImageUrl { image_url: ChatImageUrl { url: image.to_string() } },
        ]),
        None => ChatContent::Text(prompt.to_string()),
    };
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatRequestMessage { role: "user", content }],
        modalities: wants_image_modalities(endpoint, model).then(|| vec!["image", "text"]),
    }
}

/// Body of a text completion.
fn chat_text_body(model: &str, prompt: &str, system_instruction: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatRequestMessage {
                role: "system",
                content: ChatContent::Text(system_instruction.to_string()),
            },
            ChatRequestMessage { role: "user", content: ChatContent::Text(prompt.to_string()) },
        ],
        modalities: None,
    }
}

/// `data[0].b64_json` as a PNG data URI, else `data[0].url`.
fn classic_artifact(parsed: ClassicImageResponse) -> GenerationResult<String> {
    let first = parsed.data.into_iter().next().unwrap_or_default();
    if let Some(b64) = first.b64_json.filter(|b| !b.is_empty()) {
        return Ok(format!("data:image/png;base64,{b64}"));
    }
    first.url.filter(|u| !u.is_empty()).ok_or_else(|| {
        GenerationError::NoImageData("no b64_json or url found in image response".into())
    })
}

impl ProviderAdapter for RestChatAdapter {
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        Box::pin(async move {
            self.require_key(settings)?;
            let base = self.base_url(settings);
            let model = settings.rest_image_model();
            let prompt = compose(config);
            match classify_endpoint(&base, &model) {
                Flavor::ChatCompletion => {
                    self.chat_image(&base, &prompt, None, &model, settings).await
                }
                Flavor::ClassicImage => {
                    self.classic_image(
                        &base,
                        &prompt,
                        config.aspect_ratio().as_str(),
                        &model,
                        settings,
                    )
                    .await
                }
            }
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
            let base = self.base_url(settings);
            if classify_endpoint(&base, model) == Flavor::ClassicImage {
                return Err(GenerationError::UnsupportedOperation(format!(
                    "the image generation endpoint at {base} cannot take an input image; \
                     use a chat-completion endpoint (e.g. OpenRouter) or the Google provider"
                )));
            }
            self.require_key(settings)?;
            self.chat_image(&base, instruction, Some(input_image), model, settings).await
        })
    }

    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        Box::pin(async move {
            let endpoint = chat_endpoint(&self.base_url(settings));
            let model = settings.rest_text_model();
            debug!(%endpoint, %model, "chat-completion text request");
            let body = chat_text_body(&model, prompt, system_instruction);
            let text = self.post(&endpoint, &body, settings).await?;
            let completion: ChatCompletion = parse_body(&text)?;
            Ok(completion.first_message().map(|m| m.text()).unwrap_or_default())
        })
    }
}

// --- Request/response types ---

#[derive(Debug, Serialize)]
struct ClassicImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ClassicImageResponse {
    #[serde(default)]
    data: Vec<ClassicImageData>,
}

#[derive(Debug, Default, Deserialize)]
struct ClassicImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modalities: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ChatImageUrl },
}

#[derive(Debug, Serialize)]
struct ChatImageUrl {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::Provider;

    #[test]
    fn classify_by_path_host_and_model() {
        assert_eq!(
            classify_endpoint("https://api.openai.com/v1", "dall-e-3"),
            Flavor::ClassicImage
        );
        assert_eq!(
            classify_endpoint("https://api.openai.com/v1/chat/completions", "gpt-4o"),
            Flavor::ChatCompletion
        );
        assert_eq!(
            classify_endpoint("https://openrouter.ai/api/v1", "openai/gpt-5-image"),
            Flavor::ChatCompletion
        );
        assert_eq!(
            classify_endpoint("http://localhost:8080/v1", "google/gemini-3-pro-image-preview"),
            Flavor::ChatCompletion
        );
        assert_eq!(
            classify_endpoint("https://api.openai.com/v1", "gpt-4o-chat-image"),
            Flavor::ChatCompletion
        );
    }

    #[test]
    fn endpoint_normalization() {
        assert_eq!(
            chat_endpoint("https://openrouter.ai/api/v1///"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            chat_endpoint("https://proxy.local/v1/chat/completions/"),
            "https://proxy.local/v1/chat/completions"
        );
        assert_eq!(
            image_endpoint(" https://api.openai.com/v1/ "),
            "https://api.openai.com/v1/images/generations"
        );
        assert_eq!(
            image_endpoint("https://api.openai.com/v1/images/generations"),
            "https://api.openai.com/v1/images/generations"
        );
    }

    #[test]
    fn text_only_chat_body_is_plain_string() {
        let body = chat_image_body("http://localhost/v1/chat/completions", "acme/img", "a cat", None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "a cat");
        assert!(json.get("modalities").is_none());
    }

    #[test]
    fn image_chat_body_orders_text_then_image() {
        let body = chat_image_body(
            "https://openrouter.ai/api/v1/chat/completions",
            "google/gemini-3-pro-image-preview",
            "make it night",
            Some("https://ex.com/a.png"),
        );
        let json = serde_json::to_value(&body).unwrap();
        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "make it night");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "https://ex.com/a.png");
        assert_eq!(json["modalities"], serde_json::json!(["image", "text"]));
    }

    #[test]
    fn gemini_model_requests_modalities_off_gateway() {
        assert!(wants_image_modalities("http://localhost/v1", "gemini-2.5-flash-image"));
        assert!(!wants_image_modalities("http://localhost/v1", "gpt-4o"));
    }

    #[test]
    fn text_body_has_system_then_user() {
        let json = serde_json::to_value(chat_text_body("m", "hello", "be terse")).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be terse");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn gateway_headers_include_attribution() {
        let headers = request_headers(
            "https://openrouter.ai/api/v1/chat/completions",
            "k",
            Some("https://storyboard.example"),
        )
        .unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer k");
        assert_eq!(headers.get("http-referer").unwrap(), "https://storyboard.example");
        assert!(headers.contains_key("x-title"));

        let plain =
            request_headers("https://api.openai.com/v1/images/generations", "k", None).unwrap();
        assert!(!plain.contains_key("x-title"));
    }

    #[test]
    fn referer_is_omitted_unless_configured() {
        let headers =
            request_headers("https://openrouter.ai/api/v1/chat/completions", "k", None).unwrap();
        assert!(!headers.contains_key("http-referer"));
        assert!(headers.contains_key("x-title"));
    }

    #[test]
    fn classic_artifact_prefers_b64() {
        let parsed: ClassicImageResponse = serde_json::from_value(serde_json::json!({
            "data": [{"b64_json": "AAAA", "url": "https://ex.com/a.png"}]
        }))
        .unwrap();
        assert_eq!(classic_artifact(parsed).unwrap(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn classic_artifact_falls_back_to_url() {
        let parsed: ClassicImageResponse =
            serde_json::from_value(serde_json::json!({"data": [{"url": "https://ex.com/a.png"}]}))
                .unwrap();
        assert_eq!(classic_artifact(parsed).unwrap(), "https://ex.com/a.png");
    }

    #[test]
    fn classic_artifact_without_data() {
        let parsed: ClassicImageResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(classic_artifact(parsed).unwrap_err().kind(), ErrorKind::NoImageData);
    }

    #[tokio::test]
    async fn variation_on_classic_endpoint_fails_before_any_request() {
        // Port 9 (discard) would refuse the connection; reaching it would be a network error.
        let adapter = RestChatAdapter::openai(Client::new());
        let settings = AppSettings {
            base_url: Some("http://127.0.0.1:9/v1".into()),
            ..AppSettings::new(Provider::OpenAi, "k")
        };
        let err = adapter
            .generate_variation("data:image/png;base64,AAAA", "again", "dall-e-3", &settings)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }
}
