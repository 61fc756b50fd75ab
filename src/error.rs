//! Unified error type for storyboard generation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to a generation provider.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key is available for the selected provider.
    #[error("No API key for {provider}. {hint}")]
    MissingCredential {
        /// The provider name.
        provider: String,
        /// Where the key can be supplied.
        hint: String,
    },

    /// The selected provider/endpoint cannot perform the requested operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The request never reached the API (DNS, refused connection, TLS, CORS proxy).
    #[error(
        "Network request to {endpoint} failed: {source}. \
         Check your internet connection, proxy or CORS settings."
    )]
    Network {
        /// The endpoint that was being contacted.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {endpoint} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// The endpoint that was being contacted.
        endpoint: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// An API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// A response body was not the JSON that was expected.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The provider returned no content at all.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Content was returned but none of it carried image data.
    #[error("No image data: {0}")]
    NoImageData(String),

    /// A chat response held no recognizable image reference.
    #[error("No image found: {0}")]
    NoImageFound(String),

    /// A remote input image could not be retrieved.
    #[error(
        "Could not fetch remote image {url} (likely a cross-origin restriction or network error): {reason}"
    )]
    ImageFetch {
        /// The image URL.
        url: String,
        /// Underlying cause.
        reason: String,
    },

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// A failure served back from a cassette.
    #[error("{message}")]
    Replayed {
        /// Kind of the originally recorded failure.
        kind: ErrorKind,
        /// Message of the originally recorded failure.
        message: String,
    },
}

/// Coarse classification of a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`GenerationError::MissingCredential`].
    MissingCredential,
    /// See [`GenerationError::UnsupportedOperation`].
    UnsupportedOperation,
    /// Transport failures, including timeouts.
    NetworkFailure,
    /// See [`GenerationError::Api`].
    ApiError,
    /// See [`GenerationError::MalformedResponse`].
    MalformedResponse,
    /// See [`GenerationError::EmptyResponse`].
    EmptyResponse,
    /// See [`GenerationError::NoImageData`].
    NoImageData,
    /// See [`GenerationError::NoImageFound`].
    NoImageFound,
    /// See [`GenerationError::ImageFetch`].
    FetchError,
    /// Local failures: bad arguments, config, I/O, conversion.
    Local,
}

impl GenerationError {
    /// The kind of failure, for callers that branch on it.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::Network { .. } | Self::Timeout { .. } => ErrorKind::NetworkFailure,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::EmptyResponse(_) => ErrorKind::EmptyResponse,
            Self::NoImageData(_) => ErrorKind::NoImageData,
            Self::NoImageFound(_) => ErrorKind::NoImageFound,
            Self::ImageFetch { .. } => ErrorKind::FetchError,
            Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::ImageConversion(_) => ErrorKind::Local,
            Self::Replayed { kind, .. } => *kind,
        }
    }

    /// Wrap a transport error, separating timeouts from other network failures.
    pub(crate) fn transport(endpoint: &str, timeout: Duration, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint: endpoint.to_string(), timeout }
        } else {
            Self::Network { endpoint: endpoint.to_string(), source }
        }
    }
}

/// Convenience alias used across the crate.
pub type GenerationResult<T> = Result<T, GenerationError>;
