use std::path::PathBuf;

use shared::domain::{GenerationResult, ViewState};

pub mod error;
pub mod export;
pub mod history;
pub mod orchestrator;
pub mod sandbox;
pub mod transport;

pub use error::{PersistenceError, RequestFailure, RequestOutcome};
pub use export::{
    export_filename, ArtifactSink, DirectorySink, ExportController, ExportOutcome, ExportState,
    Notifier,
};
pub use history::{
    display_label, HistoryStore, KeyValueStore, MemoryKeyValueStore, PersistentHistoryStore,
    RecentPrompts, HISTORY_CAPACITY, HISTORY_STORAGE_KEY,
};
pub use orchestrator::{GenerationOrchestrator, IgnoreReason, SessionState, SubmitOutcome};
pub use sandbox::{
    IframeSandboxPort, RenderState, SandboxDocument, SandboxMount, SandboxPolicy, SandboxPort,
    SandboxedRenderer,
};
pub use transport::{AnimationBackend, HttpAnimationBackend};

/// Notifications for presentation layers, published by the orchestrator and
/// the export controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BusyChanged(bool),
    ResultReady(GenerationResult),
    GenerationFailed(String),
    ViewChanged(ViewState),
    ExportStarted,
    ExportSaved(PathBuf),
    ExportFailed(String),
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests_support;
