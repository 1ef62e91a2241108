//! Server-side export of the current animation and local save of the artifact.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{BinaryArtifact, GenerationResult};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{transport::AnimationBackend, SessionEvent};

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("animation-{}.gif", now.timestamp_millis())
}

/// Destination for exported artifacts. The sink takes ownership and drops the
/// buffer once written.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, filename: &str, artifact: BinaryArtifact) -> Result<PathBuf>;
}

/// Blocking, user-facing notice for failed exports.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, filename: &str, artifact: BinaryArtifact) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create export dir '{}'", self.dir.display()))?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportState {
    pub recording: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export, or an export is already recording.
    Skipped,
    Saved(PathBuf),
    Failed(String),
}

pub struct ExportController {
    backend: Arc<dyn AnimationBackend>,
    sink: Arc<dyn ArtifactSink>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ExportState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ExportController {
    pub fn new(
        backend: Arc<dyn AnimationBackend>,
        sink: Arc<dyn ArtifactSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            sink,
            notifier,
            state: Mutex::new(ExportState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> ExportState {
        *self.state.lock().await
    }

    pub async fn is_recording(&self) -> bool {
        self.state.lock().await.recording
    }

    pub async fn export_animation(&self, markup: Option<&GenerationResult>) -> ExportOutcome {
        let Some(markup) = markup else {
            debug!("export requested without a generation result");
            return ExportOutcome::Skipped;
        };

        {
            let mut state = self.state.lock().await;
            if state.recording {
                debug!("export already recording; request ignored");
                return ExportOutcome::Skipped;
            }
            state.recording = true;
        }
        let _ = self.events.send(SessionEvent::ExportStarted);
        info!(markup_bytes = markup.as_str().len(), "export started");

        let outcome = match self.backend.request_export(markup).await {
            Ok(artifact) => {
                let filename = export_filename(Utc::now());
                let size = artifact.len();
                match self.sink.save(&filename, artifact).await {
                    Ok(path) => {
                        info!(path = %path.display(), size, "export saved");
                        ExportOutcome::Saved(path)
                    }
                    Err(err) => self.fail(format!("Failed to save GIF: {err:#}")),
                }
            }
            Err(failure) => self.fail(format!("Failed to generate GIF: {}", failure.message())),
        };

        self.state.lock().await.recording = false;
        let event = match &outcome {
            ExportOutcome::Saved(path) => Some(SessionEvent::ExportSaved(path.clone())),
            ExportOutcome::Failed(message) => Some(SessionEvent::ExportFailed(message.clone())),
            ExportOutcome::Skipped => None,
        };
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
        outcome
    }

    fn fail(&self, message: String) -> ExportOutcome {
        warn!(%message, "export failed");
        self.notifier.notify(&message);
        ExportOutcome::Failed(message)
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
