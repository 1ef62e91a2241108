use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "animate.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub backend_url: String,
    pub database_url: String,
    /// Zero waits for the backend indefinitely.
    pub request_timeout_secs: u64,
    pub export_dir: Option<PathBuf>,
    pub sandbox_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            database_url: "sqlite://./data/animate.db".into(),
            request_timeout_secs: 300,
            export_dir: None,
            sandbox_dir: None,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Exports land in the user's download directory unless configured.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn resolved_sandbox_dir(&self) -> PathBuf {
        self.sandbox_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("animate-preview"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    database_url: Option<String>,
    request_timeout_secs: Option<u64>,
    export_dir: Option<PathBuf>,
    sandbox_dir: Option<PathBuf>,
}

pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file(settings: &mut ClientSettings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    let file_cfg = match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.export_dir {
        settings.export_dir = Some(v);
    }
    if let Some(v) = file_cfg.sandbox_dir {
        settings.sandbox_dir = Some(v);
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("ANIMATE_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("ANIMATE_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "APP__REQUEST_TIMEOUT_SECS is not a number; keeping default"),
        }
    }

    if let Some(v) = var("APP__EXPORT_DIR") {
        settings.export_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = var("APP__SANDBOX_DIR") {
        settings.sandbox_dir = Some(PathBuf::from(v));
    }
}

/// Falls back to the default location when the configured url is blank.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    storage::normalize_database_url(raw_database_url)
        .or_else(|| storage::normalize_database_url(&ClientSettings::default().database_url))
        .unwrap_or_else(|| ClientSettings::default().database_url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
