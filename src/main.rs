mod app;
mod backend;
mod config;
mod controller;
mod selection;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use backend::http::HttpBackend;
use backend::VoteBackend;
use config::KioskConfig;

#[derive(Parser, Debug)]
#[command(name = "kumo")]
#[command(version = "0.1.0")]
#[command(about = "A terminal kiosk for three-choice voting with live word-cloud results")]
struct Args {
    /// Vote server base URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Language to start in (overrides config)
    #[arg(long)]
    lang: Option<String>,

    /// Print the current word cloud as JSON and exit
    #[arg(long)]
    status: bool,

    /// Submit one vote from the command line: three comma-separated keys
    #[arg(long, value_name = "KEY,KEY,KEY")]
    vote: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = KioskConfig::load().unwrap_or_default();
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(lang) = args.lang {
        config.default_language = Some(lang);
    }

    // Handle CLI-only commands
    if args.status {
        return print_status(&config).await;
    }

    if let Some(keys) = args.vote {
        return submit_cli_vote(&config, &keys).await;
    }

    run_tui(config).await
}

async fn print_status(config: &KioskConfig) -> Result<()> {
    let backend = HttpBackend::new(config.server_url.clone());
    let cloud = backend
        .fetch_result_asset(&config.startup_language())
        .await?;
    println!("{}", serde_json::to_string(&cloud)?);
    Ok(())
}

async fn submit_cli_vote(config: &KioskConfig, keys: &str) -> Result<()> {
    let parts: Vec<String> = keys.split(',').map(|k| k.trim().to_string()).collect();
    let keys: [String; 3] = parts
        .try_into()
        .map_err(|_| anyhow::anyhow!("--vote needs exactly three comma-separated keys"))?;

    let backend = HttpBackend::new(config.server_url.clone());
    backend.submit_vote(&keys).await?;
    println!("Vote recorded: {}", keys.join(", "));
    Ok(())
}

async fn run_tui(config: KioskConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config).await?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if !app.show_help => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.set_status(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Timers and in-flight transition progress
        let _ = app.tick().await;
    }
}
