use std::sync::Arc;

use anyhow::Result;
use client_core::{
    DirectorySink, ExportController, ExportOutcome, GenerationOrchestrator, HistoryStore,
    HttpAnimationBackend, IframeSandboxPort, KeyValueStore, MemoryKeyValueStore, Notifier,
    PersistentHistoryStore, RenderState, SandboxedRenderer, SessionEvent, SubmitOutcome,
};
use shared::domain::{GenerationResult, Prompt, ViewState};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::{
    config::{prepare_database_url, ClientSettings},
    view,
};

/// Blocking export notifications go to the terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        error!(%message, "export failed");
        eprintln!("{message}");
    }
}

/// The wired-up client: one orchestrator, one preview, one exporter.
pub struct App {
    orchestrator: GenerationOrchestrator,
    renderer: SandboxedRenderer,
    exporter: ExportController,
    history: Arc<dyn HistoryStore>,
}

impl App {
    /// `ephemeral` keeps history in memory for this process only.
    pub async fn build(settings: &ClientSettings, ephemeral: bool) -> Result<Self> {
        let database_url = prepare_database_url(&settings.database_url);
        let store: Arc<dyn KeyValueStore> = if ephemeral {
            Arc::new(MemoryKeyValueStore::new())
        } else {
            let storage = Storage::new(&database_url).await.map_err(|error| {
                error!(
                    %database_url,
                    %error,
                    "failed to open SQLite database; verify parent directory exists and permissions are correct"
                );
                error
            })?;
            storage.health_check().await?;
            Arc::new(storage)
        };

        let history: Arc<dyn HistoryStore> = Arc::new(PersistentHistoryStore::new(store));
        let loaded = history.load().await;

        let backend = Arc::new(HttpAnimationBackend::new(
            &settings.backend_url,
            settings.request_timeout(),
        )?);
        let sink = Arc::new(DirectorySink::new(settings.resolved_export_dir()));
        let port = Arc::new(IframeSandboxPort::new(settings.resolved_sandbox_dir()));

        info!(
            backend = %backend.base_url(),
            %database_url,
            ephemeral,
            history_entries = loaded.len(),
            timeout_secs = settings.request_timeout_secs,
            "client ready"
        );

        Ok(Self {
            orchestrator: GenerationOrchestrator::new(backend.clone(), history.clone()),
            renderer: SandboxedRenderer::new(port),
            exporter: ExportController::new(backend, sink, Arc::new(TerminalNotifier)),
            history,
        })
    }

    pub fn subscribe_events(&self) -> Vec<broadcast::Receiver<SessionEvent>> {
        vec![
            self.orchestrator.subscribe_events(),
            self.exporter.subscribe_events(),
        ]
    }

    /// Submits and remounts the preview with whatever result the session now
    /// holds, so a failed request leaves only the placeholder.
    pub async fn submit(&self, prompt: &str) -> Result<SubmitOutcome> {
        let outcome = self.orchestrator.submit(prompt).await;
        if !matches!(outcome, SubmitOutcome::Ignored(_)) {
            let current = self.orchestrator.current_result().await;
            self.renderer.show(current.as_ref()).await?;
        }
        Ok(outcome)
    }

    pub async fn set_view(&self, view: ViewState) {
        self.orchestrator.set_active_view(view).await;
    }

    pub async fn current_result(&self) -> Option<GenerationResult> {
        self.orchestrator.current_result().await
    }

    /// Renders whichever view is active.
    pub async fn render_active_view(&self) -> String {
        let state = self.orchestrator.snapshot().await;
        if let Some(message) = &state.error_message {
            return format!("Error: {message}");
        }
        match state.active_view {
            ViewState::Code => view::code_view(state.current_result.as_ref()),
            ViewState::Preview => view::preview_view(&self.renderer.current().await),
        }
    }

    pub async fn refresh_preview(&self) -> Result<RenderState> {
        self.renderer.refresh().await
    }

    pub async fn preview_state(&self) -> RenderState {
        self.renderer.current().await
    }

    pub async fn export_current(&self) -> ExportOutcome {
        let current = self.orchestrator.current_result().await;
        self.exporter.export_animation(current.as_ref()).await
    }

    pub async fn export_markup(&self, markup: &GenerationResult) -> ExportOutcome {
        self.exporter.export_animation(Some(markup)).await
    }

    pub async fn history(&self) -> Vec<Prompt> {
        self.history.entries().await
    }

    pub async fn clear_history(&self) {
        self.history.clear().await;
    }

    pub async fn shutdown(&self) {
        self.renderer.unmount().await;
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
