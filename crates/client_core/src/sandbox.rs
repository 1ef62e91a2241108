//! Isolated preview of generated markup.
//!
//! The renderer never interprets the markup itself. It hands a [`SandboxDocument`]
//! to a [`SandboxPort`], which provides the isolation, and keeps at most one live
//! [`SandboxMount`]. Every mount is a fresh context; refreshing tears the old one
//! down first.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::GenerationResult;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

const HOST_PAGE_FILENAME: &str = "index.html";

/// Capabilities granted to the isolated context. Anything not listed is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxPolicy {
    pub allow_scripts: bool,
    pub allow_same_origin: bool,
    pub allow_top_navigation: bool,
    pub allow_popups: bool,
    pub allow_forms: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allow_scripts: true,
            allow_same_origin: false,
            allow_top_navigation: false,
            allow_popups: false,
            allow_forms: false,
        }
    }
}

impl SandboxPolicy {
    /// Value for an iframe `sandbox` attribute.
    pub fn sandbox_attribute(&self) -> String {
        let tokens = [
            (self.allow_scripts, "allow-scripts"),
            (self.allow_same_origin, "allow-same-origin"),
            (self.allow_top_navigation, "allow-top-navigation"),
            (self.allow_popups, "allow-popups"),
            (self.allow_forms, "allow-forms"),
        ];
        tokens
            .iter()
            .filter(|(granted, _)| *granted)
            .map(|(_, token)| *token)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct SandboxDocument {
    pub generation: u64,
    pub markup: GenerationResult,
    pub policy: SandboxPolicy,
}

#[async_trait]
pub trait SandboxMount: Send + Sync {
    /// Where the mounted document can be viewed.
    fn location(&self) -> &str;
    async fn teardown(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait SandboxPort: Send + Sync {
    async fn mount(&self, document: &SandboxDocument) -> Result<Box<dyn SandboxMount>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Placeholder,
    Mounted { generation: u64, location: String },
}

struct ActiveMount {
    generation: u64,
    mount: Box<dyn SandboxMount>,
}

#[derive(Default)]
struct RendererState {
    markup: Option<GenerationResult>,
    active: Option<ActiveMount>,
    next_generation: u64,
}

pub struct SandboxedRenderer {
    port: Arc<dyn SandboxPort>,
    policy: SandboxPolicy,
    state: Mutex<RendererState>,
}

impl SandboxedRenderer {
    pub fn new(port: Arc<dyn SandboxPort>) -> Self {
        Self::with_policy(port, SandboxPolicy::default())
    }

    pub fn with_policy(port: Arc<dyn SandboxPort>, policy: SandboxPolicy) -> Self {
        Self {
            port,
            policy,
            state: Mutex::new(RendererState::default()),
        }
    }

    pub fn policy(&self) -> SandboxPolicy {
        self.policy
    }

    /// Replaces whatever is shown. `None` leaves only the placeholder.
    pub async fn show(&self, result: Option<&GenerationResult>) -> Result<RenderState> {
        let mut state = self.state.lock().await;
        Self::teardown_active(&mut state).await;
        state.markup = result.cloned();
        self.mount_current(&mut state).await
    }

    /// Full teardown and remount of the current markup.
    pub async fn refresh(&self) -> Result<RenderState> {
        let mut state = self.state.lock().await;
        Self::teardown_active(&mut state).await;
        self.mount_current(&mut state).await
    }

    pub async fn current(&self) -> RenderState {
        let state = self.state.lock().await;
        match &state.active {
            Some(active) => RenderState::Mounted {
                generation: active.generation,
                location: active.mount.location().to_string(),
            },
            None => RenderState::Placeholder,
        }
    }

    pub async fn unmount(&self) {
        let mut state = self.state.lock().await;
        Self::teardown_active(&mut state).await;
        state.markup = None;
    }

    async fn mount_current(&self, state: &mut RendererState) -> Result<RenderState> {
        let Some(markup) = state.markup.clone() else {
            debug!("no generation result; showing placeholder");
            return Ok(RenderState::Placeholder);
        };

        state.next_generation += 1;
        let document = SandboxDocument {
            generation: state.next_generation,
            markup,
            policy: self.policy,
        };
        let mount = self
            .port
            .mount(&document)
            .await
            .with_context(|| format!("failed to mount preview #{}", document.generation))?;
        let location = mount.location().to_string();
        info!(generation = document.generation, %location, "preview mounted");
        state.active = Some(ActiveMount {
            generation: document.generation,
            mount,
        });
        Ok(RenderState::Mounted {
            generation: document.generation,
            location,
        })
    }

    async fn teardown_active(state: &mut RendererState) {
        if let Some(active) = state.active.take() {
            if let Err(err) = active.mount.teardown().await {
                warn!(generation = active.generation, error = %err, "preview teardown failed");
            }
        }
    }
}

/// Mounts each document as a host page embedding the markup in a sandboxed
/// `srcdoc` iframe, written to its own directory under `root`.
pub struct IframeSandboxPort {
    root: PathBuf,
}

impl IframeSandboxPort {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SandboxPort for IframeSandboxPort {
    async fn mount(&self, document: &SandboxDocument) -> Result<Box<dyn SandboxMount>> {
        let dir = self
            .root
            .join(format!("mount-{}-{}", document.generation, Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create sandbox dir '{}'", dir.display()))?;
        let page = dir.join(HOST_PAGE_FILENAME);
        tokio::fs::write(&page, render_host_page(document))
            .await
            .with_context(|| format!("failed to write host page '{}'", page.display()))?;
        Ok(Box::new(IframeMount {
            location: page.display().to_string(),
            dir,
        }))
    }
}

struct IframeMount {
    dir: PathBuf,
    location: String,
}

#[async_trait]
impl SandboxMount for IframeMount {
    fn location(&self) -> &str {
        &self.location
    }

    async fn teardown(self: Box<Self>) -> Result<()> {
        tokio::fs::remove_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to remove sandbox dir '{}'", self.dir.display()))
    }
}

pub fn render_host_page(document: &SandboxDocument) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="referrer" content="no-referrer">
<title>Animation Preview #{generation}</title>
<style>html,body{{margin:0;height:100%;background:#0b0b10}}iframe{{display:block;border:0;width:100%;height:100%}}</style>
</head>
<body>
<iframe title="Animation Preview" sandbox="{sandbox}" referrerpolicy="no-referrer" srcdoc="{srcdoc}"></iframe>
</body>
</html>
"#,
        generation = document.generation,
        sandbox = document.policy.sandbox_attribute(),
        srcdoc = escape_attribute(document.markup.as_str()),
    )
}

fn escape_attribute(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + raw.len() / 8);
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/sandbox_tests.rs"]
mod tests;
