//! Recent-prompt cache persisted in client-local storage.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::Prompt;
use storage::Storage;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::PersistenceError;

pub const HISTORY_CAPACITY: usize = 10;
pub const HISTORY_STORAGE_KEY: &str = "prompt_history";
const HISTORY_LABEL_MAX_CHARS: usize = 50;

/// Most-recent-first prompts, unique by text, capped at [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentPrompts {
    entries: Vec<Prompt>,
}

impl RecentPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from persisted strings, dropping blanks and later duplicates.
    pub fn from_persisted(raw: Vec<String>) -> Self {
        let mut entries: Vec<Prompt> = Vec::with_capacity(raw.len().min(HISTORY_CAPACITY));
        for prompt in raw.iter().filter_map(|text| Prompt::parse(text)) {
            if entries.len() == HISTORY_CAPACITY {
                break;
            }
            if !entries.contains(&prompt) {
                entries.push(prompt);
            }
        }
        Self { entries }
    }

    pub fn record(&mut self, prompt: Prompt) {
        self.entries.retain(|existing| existing != &prompt);
        self.entries.insert(0, prompt);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Prompt> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Prompt] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<Prompt> {
        self.entries.clone()
    }

    fn to_persisted(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

/// Short label for the recent-history chooser.
pub fn display_label(prompt: &Prompt) -> String {
    let text = prompt.as_str();
    if text.chars().count() > HISTORY_LABEL_MAX_CHARS {
        let head: String = text.chars().take(HISTORY_LABEL_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl KeyValueStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_value(key, value).await
    }
}

/// Process-lifetime store for tests and `--ephemeral` sessions.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Restores persisted prompts. Missing or malformed data yields an empty history.
    async fn load(&self) -> Vec<Prompt>;
    /// Moves `prompt` to the front and persists before returning. Write failures are swallowed.
    async fn record(&self, prompt: &Prompt);
    async fn entries(&self) -> Vec<Prompt>;
    async fn clear(&self);
}

pub struct PersistentHistoryStore {
    store: Arc<dyn KeyValueStore>,
    entries: Mutex<RecentPrompts>,
}

impl PersistentHistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            entries: Mutex::new(RecentPrompts::new()),
        }
    }

    async fn read_persisted(&self) -> Result<RecentPrompts, PersistenceError> {
        let raw = self
            .store
            .get(HISTORY_STORAGE_KEY)
            .await
            .map_err(|err| PersistenceError::Read(format!("{err:#}")))?;
        let Some(raw) = raw else {
            return Ok(RecentPrompts::new());
        };
        let values: Vec<String> = serde_json::from_str(&raw)?;
        Ok(RecentPrompts::from_persisted(values))
    }

    async fn write_persisted(&self, entries: &RecentPrompts) -> Result<(), PersistenceError> {
        let encoded = entries.to_persisted()?;
        self.store
            .put(HISTORY_STORAGE_KEY, &encoded)
            .await
            .map_err(|err| PersistenceError::Write(format!("{err:#}")))
    }
}

#[async_trait]
impl HistoryStore for PersistentHistoryStore {
    async fn load(&self) -> Vec<Prompt> {
        let loaded = match self.read_persisted().await {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable prompt history");
                RecentPrompts::new()
            }
        };
        debug!(entries = loaded.len(), "prompt history loaded");
        let snapshot = loaded.to_vec();
        *self.entries.lock().await = loaded;
        snapshot
    }

    async fn record(&self, prompt: &Prompt) {
        // Held across the write so the persisted order always matches memory.
        let mut entries = self.entries.lock().await;
        entries.record(prompt.clone());
        if let Err(err) = self.write_persisted(&entries).await {
            warn!(error = %err, "prompt history not persisted");
        }
    }

    async fn entries(&self) -> Vec<Prompt> {
        self.entries.lock().await.to_vec()
    }

    async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        if let Err(err) = self.write_persisted(&entries).await {
            warn!(error = %err, "cleared prompt history not persisted");
        }
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
