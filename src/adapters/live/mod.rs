//! Live adapters that call real provider APIs.

pub mod gemini;
pub mod openai;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GenerationError, GenerationResult};

/// Characters of a non-JSON error body kept in the error message.
const ERROR_BODY_PREVIEW: usize = 150;
/// Characters of a non-JSON success body kept in the error message.
const MALFORMED_BODY_PREVIEW: usize = 50;

/// POST a JSON body and return the raw response text of a successful call.
///
/// Transport failures become [`GenerationError::Network`] or
/// [`GenerationError::Timeout`]; non-2xx statuses become [`GenerationError::Api`].
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    endpoint: &str,
    headers: HeaderMap,
    body: &B,
    timeout: Duration,
) -> GenerationResult<String> {
    let response = client
        .post(endpoint)
        .headers(headers)
        .timeout(timeout)
        .json(body)
        .send()
        .await
        .map_err(|e| GenerationError::transport(endpoint, timeout, e))?;

    let status = response.status();
    let text =
        response.text().await.map_err(|e| GenerationError::transport(endpoint, timeout, e))?;

    if !status.is_success() {
        let message = describe_error_body(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(GenerationError::Api { status: status.as_u16(), message });
    }

    Ok(text)
}

/// Parse a successful response body as JSON.
pub(crate) fn parse_body<T: DeserializeOwned>(text: &str) -> GenerationResult<T> {
    serde_json::from_str(text).map_err(|e| {
        GenerationError::MalformedResponse(format!(
            "Failed to parse JSON from API response ({e}). Raw: {}",
            preview(text, MALFORMED_BODY_PREVIEW)
        ))
    })
}

/// Human-readable detail from an error response body.
///
/// Prefers `error.message`, then `message`, then the whole JSON document.
/// Bodies that are not JSON are truncated.
#[must_use]
pub fn describe_error_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let detail = json
                .get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(serde_json::Value::as_str)
                .or_else(|| json.get("message").and_then(serde_json::Value::as_str))
                .map_or_else(|| json.to_string(), str::to_string);
            Some(detail)
        }
        Err(_) => Some(preview(body, ERROR_BODY_PREVIEW)),
    }
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
