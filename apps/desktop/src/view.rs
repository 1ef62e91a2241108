//! Terminal rendering of the two output views and the history list.

use anyhow::{Context, Result};
use client_core::{display_label, RenderState};
use shared::domain::{GenerationResult, Prompt};

pub const NO_CODE_YET: &str =
    "No code generated yet. Describe an animation and submit it to see the HTML here.";
pub const NO_PREVIEW_YET: &str =
    "No preview available. Generate an animation to see the live preview here.";

pub fn code_view(result: Option<&GenerationResult>) -> String {
    match result {
        Some(result) => format!("HTML • {} lines\n{}", result.line_count(), result.as_str()),
        None => NO_CODE_YET.to_string(),
    }
}

pub fn preview_view(state: &RenderState) -> String {
    match state {
        RenderState::Placeholder => NO_PREVIEW_YET.to_string(),
        RenderState::Mounted {
            generation,
            location,
        } => format!("Preview #{generation}: {location}"),
    }
}

pub fn history_listing(entries: &[Prompt]) -> String {
    if entries.is_empty() {
        return "No recent prompts.".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(index, prompt)| format!("{:>2}. {}", index + 1, display_label(prompt)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn open_in_browser(location: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", location])
        .spawn();

    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(location).spawn();

    #[cfg(all(unix, not(target_os = "macos")))]
    let result = std::process::Command::new("xdg-open").arg(location).spawn();

    result
        .map(|_| ())
        .with_context(|| format!("failed to open preview '{location}' in a browser"))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("failed to copy to clipboard")
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
