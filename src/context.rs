//! Service context: the adapter stack a session generates through.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::adapters::recording::provider::RecordingProvider;
use crate::adapters::replaying::provider::ReplayingProvider;
use crate::cassette::config::{load_cassette, recording_path};
use crate::cassette::recorder::CassetteRecorder;
use crate::error::{GenerationError, GenerationResult};
use crate::ports::ProviderAdapter;
use crate::router::ProviderRouter;

/// Owns the provider stack used for every call in a session.
pub struct ServiceContext {
    /// Routed, recording or replaying provider.
    pub adapter: Box<dyn ProviderAdapter>,
}

/// Handle to an active recording; call [`RecordingSession::finish`] when done.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Write the cassette to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter still holds the recorder or the file
    /// cannot be written.
    pub fn finish(self) -> GenerationResult<PathBuf> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| GenerationError::Config("Recording adapter still in use".into()))?
            .into_inner()
            .map_err(|e| GenerationError::Config(format!("Recorder lock poisoned: {e}")))?;
        let path = recorder.finish()?;
        info!(path = %path.display(), "cassette written");
        Ok(path)
    }
}

impl ServiceContext {
    /// Live context over the given router.
    #[must_use]
    pub fn live(router: ProviderRouter) -> Self {
        Self { adapter: Box::new(router) }
    }

    /// Live context that also records every call to a timestamped cassette.
    #[must_use]
    pub fn recording(router: ProviderRouter) -> (Self, RecordingSession) {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        Self::recording_to(router, recording_path(&timestamp), timestamp)
    }

    /// Like [`ServiceContext::recording`] with an explicit cassette path.
    #[must_use]
    pub fn recording_to(
        router: ProviderRouter,
        path: PathBuf,
        name: impl Into<String>,
    ) -> (Self, RecordingSession) {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, name, commit_hash())));
        let adapter = RecordingProvider::new(Box::new(router), Arc::clone(&recorder));
        (Self { adapter: Box::new(adapter) }, RecordingSession { recorder })
    }

    /// Context answering every call from the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the cassette cannot be loaded.
    pub fn replaying(path: &Path) -> GenerationResult<Self> {
        let replayer = Arc::new(Mutex::new(load_cassette(path)?));
        Ok(Self { adapter: Box::new(ReplayingProvider::new(replayer)) })
    }
}

fn commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
