//! Pulling an image reference out of a chat-completion response.
//!
//! Gateways disagree on where a generated image goes: some populate a
//! vendor-specific `images` array, others embed markdown or a bare URL in the
//! message text. [`STEPS`] lists the attempts in precedence order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{GenerationError, GenerationResult};
use crate::image_ref::is_artifact;

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("valid markdown image regex"));

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s)]+").expect("valid url regex"));

/// A chat-completion response body.
#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    /// Returned choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletion {
    /// The first choice's message, if any.
    #[must_use]
    pub fn first_message(&self) -> Option<&ChatMessage> {
        self.choices.first().and_then(|c| c.message.as_ref())
    }
}

/// One choice of a chat completion.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message.
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

/// An assistant message.
#[derive(Debug, Default, Deserialize)]
pub struct ChatMessage {
    /// Message content: a string, an array of parts, or absent.
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Gateway-specific generated images. Some gateways send `null`.
    #[serde(default)]
    pub images: Option<Vec<ChatImage>>,
}

impl ChatMessage {
    /// All text carried by the message.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            None => String::new(),
            Some(MessageContent::Text(text)) => text.clone(),
            Some(MessageContent::Parts(parts)) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Message content in either of the shapes gateways send.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain string content.
    Text(String),
    /// Structured content parts.
    Parts(Vec<ContentPart>),
}

/// One structured content part. Only text parts matter here.
#[derive(Debug, Deserialize)]
pub struct ContentPart {
    /// Text of a text part.
    #[serde(default)]
    pub text: Option<String>,
}

/// An entry of the `images` array.
#[derive(Debug, Default, Deserialize)]
pub struct ChatImage {
    /// Nested `{ "image_url": { "url": ... } }` form.
    #[serde(default)]
    pub image_url: Option<ImageUrl>,
    /// Flat `{ "url": ... }` form.
    #[serde(default)]
    pub url: Option<String>,
}

/// Nested image URL object.
#[derive(Debug, Default, Deserialize)]
pub struct ImageUrl {
    /// Data URI or remote URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// One extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStep {
    /// First entry of the `images` array, nested URL before flat URL.
    ImagesArray,
    /// Markdown `![alt](url)` in the text.
    MarkdownImage,
    /// First bare `http(s)://` token in the text.
    BareUrl,
}

/// Attempts in precedence order.
pub const STEPS: [ExtractionStep; 3] =
    [ExtractionStep::ImagesArray, ExtractionStep::MarkdownImage, ExtractionStep::BareUrl];

impl ExtractionStep {
    /// Run this attempt against a message.
    ///
    /// Only `data:` and `http(s)` references count; anything else is a miss.
    #[must_use]
    pub fn attempt(self, message: &ChatMessage) -> Option<String> {
        match self {
            Self::ImagesArray => from_images_array(message),
            Self::MarkdownImage => from_markdown(&message.text()),
            Self::BareUrl => from_bare_url(&message.text()),
        }
    }
}

fn from_images_array(message: &ChatMessage) -> Option<String> {
    let first = message.images.as_deref()?.first()?;
    first
        .image_url
        .as_ref()
        .and_then(|i| i.url.as_deref())
        .or(first.url.as_deref())
        .map(str::trim)
        .filter(|url| is_artifact(url))
        .map(str::to_string)
}

fn from_markdown(text: &str) -> Option<String> {
    MARKDOWN_IMAGE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|url| is_artifact(url))
        .map(str::to_string)
}

fn from_bare_url(text: &str) -> Option<String> {
    BARE_URL.find(text).map(|m| m.as_str().to_string())
}

/// Extract an image reference from a message using [`STEPS`].
///
/// # Errors
///
/// Returns [`GenerationError::NoImageFound`] when every step comes up empty.
pub fn extract_image_reference(message: &ChatMessage) -> GenerationResult<String> {
    STEPS.iter().find_map(|step| step.attempt(message)).ok_or_else(|| {
        GenerationError::NoImageFound(
            "chat response had no 'images' entry and no image URL in its content".into(),
        )
    })
}
