//! Generation state machine: one in-flight request, one visible outcome.

use std::sync::Arc;

use shared::domain::{GenerationResult, Prompt, ViewState};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{history::HistoryStore, transport::AnimationBackend, SessionEvent};

/// View state of the current session.
///
/// While `busy` is set both `current_result` and `error_message` are empty;
/// once a request settles exactly one of them is filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_result: Option<GenerationResult>,
    pub error_message: Option<String>,
    pub busy: bool,
    pub active_view: ViewState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyPrompt,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Generated,
    Failed(String),
}

pub struct GenerationOrchestrator {
    backend: Arc<dyn AnimationBackend>,
    history: Arc<dyn HistoryStore>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl GenerationOrchestrator {
    pub fn new(backend: Arc<dyn AnimationBackend>, history: Arc<dyn HistoryStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            history,
            state: Mutex::new(SessionState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn current_result(&self) -> Option<GenerationResult> {
        self.state.lock().await.current_result.clone()
    }

    pub async fn history_entries(&self) -> Vec<Prompt> {
        self.history.entries().await
    }

    pub async fn set_active_view(&self, view: ViewState) {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.active_view != view;
            state.active_view = view;
            changed
        };
        if changed {
            let _ = self.events.send(SessionEvent::ViewChanged(view));
        }
    }

    pub async fn submit(&self, raw_prompt: &str) -> SubmitOutcome {
        let Some(prompt) = Prompt::parse(raw_prompt) else {
            debug!("ignoring empty prompt");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyPrompt);
        };

        {
            let mut state = self.state.lock().await;
            if state.busy {
                debug!("generation already in flight; prompt ignored");
                return SubmitOutcome::Ignored(IgnoreReason::Busy);
            }
            state.busy = true;
            state.error_message = None;
            state.current_result = None;
        }
        let _ = self.events.send(SessionEvent::BusyChanged(true));

        self.history.record(&prompt).await;

        info!(prompt_chars = prompt.as_str().chars().count(), "requesting generation");
        let response = self.backend.request_generation(&prompt).await;

        let (outcome, events) = {
            let mut state = self.state.lock().await;
            let settled = match response {
                Ok(markup) => {
                    info!(markup_bytes = markup.as_str().len(), "generation succeeded");
                    state.current_result = Some(markup.clone());
                    let mut events = vec![SessionEvent::ResultReady(markup)];
                    if state.active_view != ViewState::Preview {
                        state.active_view = ViewState::Preview;
                        events.push(SessionEvent::ViewChanged(ViewState::Preview));
                    }
                    (SubmitOutcome::Generated, events)
                }
                Err(failure) => {
                    let message = failure.message().to_string();
                    warn!(%message, "generation failed");
                    state.error_message = Some(message.clone());
                    (
                        SubmitOutcome::Failed(message.clone()),
                        vec![SessionEvent::GenerationFailed(message)],
                    )
                }
            };
            state.busy = false;
            settled
        };

        for event in events {
            let _ = self.events.send(event);
        }
        let _ = self.events.send(SessionEvent::BusyChanged(false));
        outcome
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
