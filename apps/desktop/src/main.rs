mod app;
mod config;
mod session;
mod view;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{ExportOutcome, RenderState, SessionEvent, SubmitOutcome};
use shared::domain::{GenerationResult, ViewState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use config::{load_settings, ClientSettings};
use session::{parse_command, SessionCommand, SESSION_HELP};

#[derive(Parser, Debug)]
#[command(name = "animate", about = "Turn a text description into an animation")]
struct Args {
    /// Base url of the generation backend.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Request timeout in seconds; 0 waits forever.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,
    /// Keep prompt history in memory only.
    #[arg(long, global = true)]
    ephemeral: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an animation from a prompt.
    Generate {
        prompt: String,
        #[arg(long, value_enum)]
        view: Option<ViewArg>,
        /// Also export the result as a GIF.
        #[arg(long)]
        export: bool,
        /// Open the preview in the system browser.
        #[arg(long)]
        open: bool,
        /// Copy the generated HTML to the clipboard.
        #[arg(long)]
        copy: bool,
    },
    /// Export existing markup as a GIF.
    Export {
        #[arg(long)]
        input: PathBuf,
    },
    /// List recent prompts.
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Interactive prompt loop.
    Session,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    Code,
    Preview,
}

impl From<ViewArg> for ViewState {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Code => ViewState::Code,
            ViewArg::Preview => ViewState::Preview,
        }
    }
}

impl Args {
    fn apply_overrides(&self, mut settings: ClientSettings) -> ClientSettings {
        if let Some(v) = &self.backend_url {
            settings.backend_url = v.clone();
        }
        if let Some(v) = &self.database_url {
            settings.database_url = v.clone();
        }
        if let Some(v) = self.timeout_secs {
            settings.request_timeout_secs = v;
        }
        if let Some(v) = &self.export_dir {
            settings.export_dir = Some(v.clone());
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.apply_overrides(load_settings());
    let app = App::build(&settings, args.ephemeral).await?;

    match args.command {
        Command::Generate {
            prompt,
            view,
            export,
            open,
            copy,
        } => run_generate(&app, &prompt, view.map(ViewState::from), export, open, copy).await,
        Command::Export { input } => run_export(&app, &input).await,
        Command::History { clear } => {
            if clear {
                app.clear_history().await;
                println!("History cleared.");
            } else {
                println!("{}", view::history_listing(&app.history().await));
            }
            Ok(())
        }
        Command::Session => run_session(&app).await,
    }
}

async fn run_generate(
    app: &App,
    prompt: &str,
    view: Option<ViewState>,
    export: bool,
    open: bool,
    copy: bool,
) -> Result<()> {
    match app.submit(prompt).await? {
        SubmitOutcome::Generated => {}
        SubmitOutcome::Ignored(reason) => bail!("prompt ignored: {reason:?}"),
        SubmitOutcome::Failed(message) => bail!(message),
    }

    if let Some(view) = view {
        app.set_view(view).await;
    }
    println!("{}", app.render_active_view().await);

    if open {
        open_preview(app).await;
    }
    if copy {
        copy_current(app).await;
    }
    if export {
        report_export(app.export_current().await)?;
    }
    Ok(())
}

async fn run_export(app: &App, input: &Path) -> Result<()> {
    let markup = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read markup from '{}'", input.display()))?;
    if markup.trim().is_empty() {
        bail!("'{}' contains no markup", input.display());
    }
    report_export(app.export_markup(&GenerationResult::new(markup)).await)
}

fn report_export(outcome: ExportOutcome) -> Result<()> {
    match outcome {
        ExportOutcome::Saved(path) => {
            println!("Saved {}", path.display());
            Ok(())
        }
        ExportOutcome::Skipped => {
            println!("Nothing to export.");
            Ok(())
        }
        // The notifier already told the user.
        ExportOutcome::Failed(message) => bail!(message),
    }
}

async fn open_preview(app: &App) {
    match app.preview_state().await {
        RenderState::Mounted { location, .. } => {
            if let Err(err) = view::open_in_browser(&location) {
                eprintln!("{err:#}");
            }
        }
        RenderState::Placeholder => println!("{}", view::NO_PREVIEW_YET),
    }
}

async fn copy_current(app: &App) {
    let Some(result) = app.current_result().await else {
        println!("{}", view::NO_CODE_YET);
        return;
    };
    match view::copy_to_clipboard(result.as_str()) {
        Ok(()) => println!("Copied {} lines to clipboard.", result.line_count()),
        Err(err) => eprintln!("{err:#}"),
    }
}

async fn run_session(app: &App) -> Result<()> {
    for mut events in app.subscribe_events() {
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    SessionEvent::BusyChanged(true) => eprintln!("Generating animation..."),
                    SessionEvent::ExportStarted => eprintln!("Generating GIF via backend..."),
                    other => debug!(?other, "session event"),
                }
            }
        });
    }

    println!("{SESSION_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            SessionCommand::Submit(prompt) => match app.submit(&prompt).await {
                Ok(SubmitOutcome::Ignored(_)) => {}
                Ok(_) => println!("{}", app.render_active_view().await),
                Err(err) => eprintln!("{err:#}"),
            },
            SessionCommand::ShowView(view) => {
                app.set_view(view).await;
                println!("{}", app.render_active_view().await);
            }
            SessionCommand::Refresh => match app.refresh_preview().await {
                Ok(state) => println!("{}", view::preview_view(&state)),
                Err(err) => eprintln!("{err:#}"),
            },
            SessionCommand::Export => {
                if let Err(err) = report_export(app.export_current().await) {
                    debug!(error = %err, "export did not complete");
                }
            }
            SessionCommand::History => println!("{}", view::history_listing(&app.history().await)),
            SessionCommand::Recall(n) => {
                let Some(prompt) = app.history().await.get(n - 1).cloned() else {
                    println!("No recent prompt #{n}.");
                    continue;
                };
                println!("> {prompt}");
                match app.submit(prompt.as_str()).await {
                    Ok(SubmitOutcome::Ignored(_)) => {}
                    Ok(_) => println!("{}", app.render_active_view().await),
                    Err(err) => eprintln!("{err:#}"),
                }
            }
            SessionCommand::Copy => copy_current(app).await,
            SessionCommand::Help => println!("{SESSION_HELP}"),
            SessionCommand::Quit => break,
            SessionCommand::Unknown(command) => {
                warn!(%command, "unknown session command");
                println!("Unknown command {command}; type :help");
            }
        }
    }

    app.shutdown().await;
    Ok(())
}
