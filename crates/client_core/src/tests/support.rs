//! Fakes shared by the component tests.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{BinaryArtifact, GenerationResult, Prompt};
use tokio::sync::{oneshot, Mutex};

use crate::{
    error::{RequestFailure, RequestOutcome},
    export::{ArtifactSink, Notifier},
    history::HistoryStore,
    transport::AnimationBackend,
};

pub(crate) struct ScriptedBackend {
    generation: RequestOutcome<GenerationResult>,
    export: RequestOutcome<BinaryArtifact>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    observed_history: Option<Arc<dyn HistoryStore>>,
    pub history_at_request: Mutex<Vec<Vec<Prompt>>>,
    pub prompts: Mutex<Vec<Prompt>>,
    pub generation_calls: AtomicUsize,
    pub export_calls: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            generation: Ok(GenerationResult::new("<div></div>")),
            export: Ok(gif(b"GIF89a")),
            gate: Mutex::new(None),
            observed_history: None,
            history_at_request: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            generation_calls: AtomicUsize::new(0),
            export_calls: AtomicUsize::new(0),
        }
    }
}

pub(crate) fn gif(bytes: &[u8]) -> BinaryArtifact {
    BinaryArtifact {
        bytes: bytes.to_vec(),
        content_type: Some("image/gif".into()),
    }
}

pub(crate) fn backend_failure(status: u16, message: &str) -> RequestFailure {
    RequestFailure::Backend {
        status,
        message: message.into(),
    }
}

impl ScriptedBackend {
    pub(crate) fn generating(markup: &str) -> Self {
        Self {
            generation: Ok(GenerationResult::new(markup)),
            ..Self::default()
        }
    }

    pub(crate) fn failing_generation(failure: RequestFailure) -> Self {
        Self {
            generation: Err(failure),
            ..Self::default()
        }
    }

    pub(crate) fn exporting(artifact: BinaryArtifact) -> Self {
        Self {
            export: Ok(artifact),
            ..Self::default()
        }
    }

    pub(crate) fn failing_export(failure: RequestFailure) -> Self {
        Self {
            export: Err(failure),
            ..Self::default()
        }
    }

    /// The first request waits until the returned sender fires or is dropped.
    pub(crate) fn gated(self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                gate: Mutex::new(Some(rx)),
                ..self
            },
            tx,
        )
    }

    pub(crate) fn observing_history(self, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            observed_history: Some(history),
            ..self
        }
    }

    /// Holds the next request until the returned sender fires or is dropped.
    pub(crate) async fn gate_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().await = Some(rx);
        tx
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl AnimationBackend for ScriptedBackend {
    async fn request_generation(&self, prompt: &Prompt) -> RequestOutcome<GenerationResult> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.clone());
        if let Some(history) = &self.observed_history {
            let entries = history.entries().await;
            self.history_at_request.lock().await.push(entries);
        }
        self.wait_for_gate().await;
        self.generation.clone()
    }

    async fn request_export(&self, _markup: &GenerationResult) -> RequestOutcome<BinaryArtifact> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.export.clone()
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub saved: Mutex<Vec<(String, BinaryArtifact)>>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn save(&self, filename: &str, artifact: BinaryArtifact) -> Result<PathBuf> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.saved
            .lock()
            .await
            .push((filename.to_string(), artifact));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub messages: std::sync::Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Polls `check` until it holds, failing the test after a second.
pub(crate) async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
