//! Cassette file locations and loading.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;
use crate::error::{GenerationError, GenerationResult};

/// Directory recordings are written under, relative to the working directory.
pub const CASSETTE_ROOT: &str = ".storyboard/cassettes";

/// Path of a new recording made at `timestamp`.
#[must_use]
pub fn recording_path(timestamp: &str) -> PathBuf {
    Path::new(CASSETTE_ROOT).join(timestamp).join("provider.cassette.yaml")
}

/// Load a cassette file and create a replayer for it.
///
/// # Errors
///
/// Returns a config error if the file cannot be read or parsed.
pub fn load_cassette(path: &Path) -> GenerationResult<CassetteReplayer> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GenerationError::Config(format!("Failed to read cassette {}: {e}", path.display()))
    })?;
    let cassette: Cassette = serde_yaml::from_str(&content).map_err(|e| {
        GenerationError::Config(format!("Failed to parse cassette {}: {e}", path.display()))
    })?;
    Ok(CassetteReplayer::new(&cassette))
}
