//! Conversion between data URIs, remote image URLs and inline base64 payloads.

use std::time::Duration;

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::error::{GenerationError, GenerationResult};

/// MIME type assumed when nothing better is known.
pub const DEFAULT_MIME: &str = "image/png";

static DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:(.+?);base64,(.+)$").expect("valid data URI regex"));

static STRAY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/\w+;base64,").expect("valid prefix regex"));

/// An image as a MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Standard base64 payload without any header.
    pub data: String,
}

impl InlineImage {
    /// Encode raw bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Render as a `data:<mime>;base64,<payload>` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the payload back to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64.
    pub fn decode(&self) -> GenerationResult<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|e| GenerationError::InvalidArgument(format!("Invalid base64 image data: {e}")))
    }
}

/// The three shapes an image reference can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRefKind {
    /// `data:` URI.
    DataUri,
    /// Absolute HTTP(S) URL.
    RemoteUrl,
    /// Bare base64, possibly with a stray header.
    Base64,
}

/// Classify an image reference.
#[must_use]
pub fn classify(image: &str) -> ImageRefKind {
    if image.starts_with("data:") {
        ImageRefKind::DataUri
    } else if image.starts_with("http") {
        ImageRefKind::RemoteUrl
    } else {
        ImageRefKind::Base64
    }
}

/// Whether a string is a well-formed artifact reference.
#[must_use]
pub fn is_artifact(reference: &str) -> bool {
    reference.starts_with("data:") || reference.starts_with("http")
}

/// Split a data URI into MIME type and payload.
///
/// # Errors
///
/// Returns an error if the URI has no `;base64,` section.
pub fn parse_data_uri(uri: &str) -> GenerationResult<InlineImage> {
    let caps = DATA_URI.captures(uri).ok_or_else(|| {
        GenerationError::InvalidArgument("Malformed data URI: expected data:<mime>;base64,<data>".into())
    })?;
    Ok(InlineImage { mime_type: caps[1].to_string(), data: caps[2].to_string() })
}

/// Strip an accidental data-URI header from a bare base64 string.
#[must_use]
pub fn strip_stray_prefix(data: &str) -> String {
    STRAY_PREFIX.replace(data, "").into_owned()
}

/// Turn any image reference into inline bytes, fetching remote URLs.
///
/// # Errors
///
/// Returns [`GenerationError::ImageFetch`] when a remote image cannot be
/// retrieved, or an invalid-argument error for a malformed data URI.
pub async fn to_inline_bytes(
    client: &Client,
    image: &str,
    timeout: Duration,
) -> GenerationResult<InlineImage> {
    match classify(image) {
        ImageRefKind::DataUri => parse_data_uri(image),
        ImageRefKind::RemoteUrl => fetch_remote(client, image, timeout).await,
        ImageRefKind::Base64 => Ok(InlineImage {
            mime_type: DEFAULT_MIME.to_string(),
            data: strip_stray_prefix(image.trim()),
        }),
    }
}

async fn fetch_remote(client: &Client, url: &str, timeout: Duration) -> GenerationResult<InlineImage> {
    debug!(url, "fetching remote input image");
    let fetch_err =
        |reason: String| GenerationError::ImageFetch { url: url.to_string(), reason };

    let response =
        client.get(url).timeout(timeout).send().await.map_err(|e| fetch_err(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("HTTP {}", status.as_u16())));
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_MIME)
        .to_string();

    let bytes = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    Ok(InlineImage::from_bytes(&bytes, mime_type))
}
