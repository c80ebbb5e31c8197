use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod app;
mod camera;
mod chat;
mod config;
mod gemini;
mod handler;
mod scene;
mod tui;
mod ui;
mod viewer;

use app::App;
use config::Config;
use gemini::GeminiClient;

#[derive(Parser)]
#[command(name = "cellmate")]
#[command(about = "AI biology tutor with a live 3D molecular structure viewer")]
struct Cli {
    /// Model to use for tutoring answers
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the generation endpoint (e.g. a server-side proxy)
    #[arg(long)]
    endpoint: Option<String>,

    /// Structure shown at startup: DNA, Protein or Cell
    #[arg(short, long)]
    structure: Option<String>,

    /// Diagnostics log file (the terminal itself is taken over by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let api_key = config.resolved_api_key().unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("no API key configured; replies will fall back until one is set");
    }
    let endpoint = cli
        .endpoint
        .or_else(|| config.endpoint.clone())
        .unwrap_or_else(|| gemini::DEFAULT_ENDPOINT.to_string());
    let model = cli
        .model
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());

    let client = GeminiClient::new(&endpoint, &api_key, &model);
    tracing::info!(model = client.model(), %endpoint, "starting session");

    let mut app = App::new(client);
    if let Some(name) = cli.structure {
        app.viewer.select(scene::MoleculeVariant::parse(&name));
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        app.chat.poll_reply().await;
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event)?;
        }
    }

    tui::restore()?;
    Ok(())
}

fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => match dirs::cache_dir() {
            Some(dir) => dir.join("cellmate").join("cellmate.log"),
            None => return Ok(()), // nowhere sensible to write, run without logs
        },
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
