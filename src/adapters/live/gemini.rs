//! Live adapter for the Gemini native multimodal API.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_body, post_json};
use crate::error::{GenerationError, GenerationResult};
use crate::image_ref::{to_inline_bytes, InlineImage};
use crate::model::{resolve_native_image_model, ModelTier, NATIVE_TEXT_MODEL};
use crate::ports::provider::{ArtifactFuture, GenerationConfig, ProviderAdapter, TextFuture};
use crate::prompt::compose;
use crate::settings::AppSettings;

/// Default API base.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Image size hint sent only to the pro tier.
const PRO_IMAGE_SIZE: &str = "1K";

/// Native Gemini adapter sending structured text and inline-image parts.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
    default_credential: Option<String>,
}

impl GeminiAdapter {
    /// Create an adapter. `default_credential` is used when settings carry no key.
    #[must_use]
    pub fn new(client: Client, default_credential: Option<String>) -> Self {
        Self { client, base_url: GEMINI_API_BASE.to_string(), default_credential }
    }

    /// Point the adapter at a different API base.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn credential(&self, settings: &AppSettings) -> GenerationResult<String> {
        settings
            .active_key()
            .map(str::to_string)
            .or_else(|| self.default_credential.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| GenerationError::MissingCredential {
                provider: "Google".into(),
                hint: "Add a Gemini key in settings or set GEMINI_API_KEY.".into(),
            })
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        settings: &AppSettings,
    ) -> GenerationResult<GenerateContentResponse> {
        let key = self.credential(settings)?;
        let endpoint = format!("{}/{model}:generateContent", self.base_url);
        debug!(%endpoint, "calling native generateContent");

        let mut headers = HeaderMap::new();
        let key_header = HeaderValue::from_str(&key).map_err(|_| {
            GenerationError::InvalidArgument("API key contains invalid header characters".into())
        })?;
        headers.insert("x-goog-api-key", key_header);

        let text = post_json(&self.client, &endpoint, headers, request, settings.timeout).await?;
        parse_body(&text)
    }
}

/// Build the request for a config-only image.
fn image_request(config: &GenerationConfig, model: &str) -> GenerateContentRequest {
    let image_size = (ModelTier::of(model) == ModelTier::Pro).then(|| PRO_IMAGE_SIZE.to_string());
    GenerateContentRequest {
        contents: vec![Content { parts: vec![Part::text(compose(config))] }],
        generation_config: Some(GenerationSettings {
            image_config: Some(ImageConfig {
                aspect_ratio: config.aspect_ratio().as_str().to_string(),
                image_size,
            }),
        }),
        system_instruction: None,
    }
}

/// Build the request for an image-conditioned generation.
fn variation_request(image: InlineImage, instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content { parts: vec![Part::inline(image), Part::text(instruction)] }],
        generation_config: None,
        system_instruction: None,
    }
}

/// Build the request for a text completion.
fn text_request(prompt: &str, system_instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content { parts: vec![Part::text(prompt)] }],
        generation_config: None,
        system_instruction: (!system_instruction.is_empty())
            .then(|| Content { parts: vec![Part::text(system_instruction)] }),
    }
}

/// Return the first inline image of the first candidate as a data URI.
fn first_inline_image(response: GenerateContentResponse) -> GenerationResult<String> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    if parts.is_empty() {
        return Err(GenerationError::EmptyResponse(
            "Gemini response contained no content parts".into(),
        ));
    }

    parts
        .into_iter()
        .find_map(|part| part.inline_data)
        .map(|inline| format!("data:{};base64,{}", inline.mime_type, inline.data))
        .ok_or_else(|| {
            GenerationError::NoImageData("no inline image data found in Gemini response".into())
        })
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

impl ProviderAdapter for GeminiAdapter {
    fn generate_image<'a>(
        &'a self,
        config: &'a GenerationConfig,
        settings: &'a AppSettings,
    ) -> ArtifactFuture<'a> {
        Box::pin(async move {
            let model = resolve_native_image_model(config.model());
            let request = image_request(config, &model);
            let response = self.generate_content(&model, &request, settings).await?;
            first_inline_image(response)
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
            // Fail on a missing key before spending a fetch on the input image.
            self.credential(settings)?;
            let model = resolve_native_image_model(model);
            let image = to_inline_bytes(&self.client, input_image, settings.timeout).await?;
            let request = variation_request(image, instruction);
            let response = self.generate_content(&model, &request, settings).await?;
            first_inline_image(response)
        })
    }

    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        system_instruction: &'a str,
        settings: &'a AppSettings,
    ) -> TextFuture<'a> {
        Box::pin(async move {
            let request = text_request(prompt, system_instruction);
            let response = self.generate_content(NATIVE_TEXT_MODEL, &request, settings).await?;
            Ok(response_text(response))
        })
    }
}

// --- Gemini API request types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }

    fn inline(image: InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type: image.mime_type, data: image.data }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

// --- Gemini API response types ---

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
