mod api;
mod app;
mod config;
mod export;
mod reimbursement;
mod status;
mod theme;
mod ui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::ApiClient;
use app::App;
use config::session::Session;
use config::AppConfig;
use export::ExportFormat;
use reimbursement::filter::{self, StatusCounts, StatusFilter};
use status::StatusMessage;
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "reimburse")]
#[command(version = "0.1.0")]
#[command(about = "Browse, filter and export your expense reimbursements from the terminal")]
struct Args {
    /// Print facet counts and the fetch outcome as JSON
    #[arg(long)]
    summary: bool,

    /// Export the filtered list without starting the TUI
    #[arg(short, long, value_enum)]
    export: Option<ExportFormat>,

    /// Search text applied before --summary / --export
    #[arg(long, default_value = "")]
    search: String,

    /// Status facet applied before --summary / --export
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    status: StatusFilter,

    /// Directory for --export (defaults to export_dir from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save an access token and exit
    #[arg(long, value_name = "TOKEN")]
    login: Option<String>,

    /// Forget the saved access token and exit
    #[arg(long)]
    logout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stderr keeps stdout clean for --summary
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    let session_path = Session::path()?;

    // Handle CLI-only commands
    if let Some(token) = args.login.as_deref() {
        return login(&session_path, token);
    }

    if args.logout {
        Session::clear(&session_path)?;
        println!("Signed out");
        return Ok(());
    }

    if args.summary {
        return print_summary(&config, &session_path, &args).await;
    }

    if let Some(format) = args.export {
        return export_headless(&config, &session_path, &args, format).await;
    }

    // Run TUI
    ui::init_theme(Theme::from_config(&config.theme));
    run_tui(config, session_path).await
}

fn login(session_path: &std::path::Path, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        bail!("Access token is empty");
    }
    Session::store_token(session_path, token)?;
    println!("Signed in; token saved to {}", session_path.display());
    Ok(())
}

/// Fetch with the saved token, as the dashboard does on mount
async fn fetch_records(
    config: &AppConfig,
    session_path: &std::path::Path,
) -> Result<(Vec<reimbursement::Reimbursement>, StatusMessage)> {
    let session = Session::load_from(session_path);
    let Some(token) = session.access_token() else {
        bail!("Not signed in; run with --login <TOKEN> first");
    };

    let client = ApiClient::new(config.api_base_url.clone(), config.request_timeout())?;
    tracing::info!("Fetching reimbursements from {}", client.base_url());
    Ok(api::summarize(client.list_reimbursements(token).await))
}

async fn print_summary(config: &AppConfig, session_path: &std::path::Path, args: &Args) -> Result<()> {
    let (records, message) = fetch_records(config, session_path).await?;
    let counts = StatusCounts::from_records(&records);
    let matching = filter::filter(&records, &args.search, args.status).len();

    let output = serde_json::json!({
        "counts": counts,
        "matching": matching,
        "message": message,
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn export_headless(
    config: &AppConfig,
    session_path: &std::path::Path,
    args: &Args,
    format: ExportFormat,
) -> Result<()> {
    let (records, message) = fetch_records(config, session_path).await?;
    if message.is_error() {
        bail!("{}", message.text);
    }

    let visible = filter::filter(&records, &args.search, args.status);
    let rows = export::rows_for_export(&visible);
    let dir = args.output.clone().unwrap_or_else(|| config.export_dir());

    let path = export::export(format, &rows, &dir)
        .with_context(|| format.failure_message())?;

    println!("{}: {}", format.success_message(), path.display());
    Ok(())
}

async fn run_tui(config: AppConfig, session_path: PathBuf) -> Result<()> {
    // Create app state before touching the terminal so errors print normally
    let mut app = App::new(config, session_path)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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
                        KeyCode::Char('q') if app.accepts_quit_key() => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.message = Some(StatusMessage::error(format!("Error: {}", e)));
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Deferred fetch / export
        app.tick().await;
    }
}
