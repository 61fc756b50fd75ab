//! On-disk cassette format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Port name every provider interaction is recorded under.
pub const PROVIDER_PORT: &str = "provider";

/// A recorded session: provider calls in the order they completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Session name, usually the recording timestamp.
    pub name: String,
    /// When the session was written.
    pub recorded_at: DateTime<Utc>,
    /// Git commit the session was recorded at, or `unknown`.
    pub commit: String,
    /// Recorded calls.
    pub interactions: Vec<Interaction>,
}

/// One recorded call.
///
/// `input` never carries credentials. `output` is `{"Ok": <artifact or text>}`
/// or `{"Err": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Position in the session.
    pub seq: u64,
    /// Port name, see [`PROVIDER_PORT`].
    pub port: String,
    /// Port method: `generate_image`, `generate_variation` or `generate_text`.
    pub method: String,
    /// Request summary.
    pub input: serde_json::Value,
    /// Recorded result.
    pub output: serde_json::Value,
}
