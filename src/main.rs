mod api;
mod app;
mod card;
mod config;
mod error;
mod feedback;
mod models;
mod parser;
mod permission;
mod ui;

use crate::api::HttpBackend;
use crate::app::App;
use crate::config::{Config, Overrides};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trip-checklist-tui")]
#[command(about = "Collaborate on a trip's shared preparation checklist")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Path to the config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Trip to open")]
    trip: Option<u64>,

    #[arg(long, help = "Base URL of the trip-planning API")]
    api_url: Option<String>,
}

// The terminal belongs to the UI, so logs go to a file
fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(
        cli.config.as_deref(),
        Overrides {
            api_url: cli.api_url,
            trip_id: cli.trip,
        },
    )?;
    init_logging(&config.log_file)?;
    tracing::info!(api_url = %config.api_url, trip_id = config.trip_id, "starting");

    let backend = HttpBackend::new(&config.api_url, config.session_cookie.clone());
    let mut app = App::new(backend, config.trip_id);
    app.load().await?;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
