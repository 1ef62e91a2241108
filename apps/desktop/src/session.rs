use shared::domain::ViewState;

pub const SESSION_HELP: &str = "\
Type a description to generate an animation.
  :code | :preview   switch the output view
  :refresh           remount the preview
  :export            export the current animation as a GIF
  :history           list recent prompts
  :recall <n>        resubmit recent prompt <n>
  :copy              copy the generated HTML
  :help              show this help
  :quit              leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Submit(String),
    ShowView(ViewState),
    Refresh,
    Export,
    History,
    /// 1-based position in the history list.
    Recall(usize),
    Copy,
    Help,
    Quit,
    Unknown(String),
}

/// Anything not starting with `:` is a prompt, blank lines included.
pub fn parse_command(line: &str) -> SessionCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return SessionCommand::Submit(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("code"), None, _) => SessionCommand::ShowView(ViewState::Code),
        (Some("preview"), None, _) => SessionCommand::ShowView(ViewState::Preview),
        (Some("refresh"), None, _) => SessionCommand::Refresh,
        (Some("export"), None, _) => SessionCommand::Export,
        (Some("history"), None, _) => SessionCommand::History,
        (Some("recall"), Some(n), None) => match n.parse::<usize>() {
            Ok(n) if n > 0 => SessionCommand::Recall(n),
            _ => SessionCommand::Unknown(trimmed.to_string()),
        },
        (Some("copy"), None, _) => SessionCommand::Copy,
        (Some("help"), None, _) => SessionCommand::Help,
        (Some("quit" | "q" | "exit"), None, _) => SessionCommand::Quit,
        _ => SessionCommand::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
