use std::path::{Path, PathBuf};

use anyhow::Result;
use chatbot_core::{BackendClient, ChatSession, Config};
use clap::Parser;
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "chatbot", version)]
#[command(about = "Terminal chat client for a chat-completion backend")]
struct Cli {
    /// Base URL of the chat backend (serves /api/health and /api/chat)
    #[arg(long, env = "CHATBOT_BACKEND_URL")]
    backend_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here instead of the default cache location
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = load_config(cli.config.as_deref(), Config::load)?;
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    let log_path = logging::init(config.log_path());
    if let Some(e) = config_error {
        warn!(error = %e, "ignoring default config file");
    }
    let backend_url = config.backend_url(cli.backend_url.as_deref());
    info!(%backend_url, log = ?log_path, "starting chatbot");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &config, backend_url).await;

    tui::restore()?;
    info!("chatbot exited");
    result
}

/// An explicit config file must load. A broken default one falls back to
/// the defaults, and its error is handed back so it can be logged.
fn load_config(
    explicit: Option<&Path>,
    load_default: impl FnOnce() -> Result<Config>,
) -> Result<(Config, Option<anyhow::Error>)> {
    match explicit {
        Some(path) => Ok((Config::load_from(path)?, None)),
        None => match load_default() {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((Config::new(), Some(e))),
        },
    }
}

async fn run(terminal: &mut Tui, config: &Config, backend_url: String) -> Result<()> {
    let mut events = EventHandler::new();

    let client = BackendClient::new(&backend_url)
        .with_timeouts(config.request_timeout(), config.health_timeout());
    let mut app = App::new(ChatSession::new(backend_url), client, events.sender());

    // Initial health check
    app.check_connection();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    Ok(())
}
