//! Catchook TUI - a keyboard-driven dashboard for Catchook user administration.
//!
//! Besides the interactive dashboard, a few CLI commands work without a
//! terminal UI: `--health`, `--login`, `--logout` and `--whoami`.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catchook_core::auth::FileCookieJar;
use catchook_core::models::LoginCredentials;
use catchook_core::{ApiClient, ApiError, Config, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written to the cache directory
const LOG_FILE: &str = "catchook.log";

const USAGE: &str = "Usage: catchook [--health | --login | --logout | --whoami | --help]";

/// Initialize the tracing subscriber. Logs go to a file since the terminal
/// belongs to the UI. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = std::fs::create_dir_all(log_dir).map_err(anyhow::Error::from).and_then(|_| {
        Builder::new()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE)
            .build(log_dir)
            .map_err(anyhow::Error::from)
    });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(&cache_dir);

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if let Some(command) = args.get(1) {
        return match command.as_str() {
            "--health" => show_health(&config, &cache_dir).await,
            "--login" => login_cli(config, &cache_dir).await,
            "--logout" => logout_cli(&config, &cache_dir).await,
            "--whoami" => whoami(&config, &cache_dir).await,
            "--help" | "-h" => {
                println!("{}", USAGE);
                Ok(())
            }
            other => Err(anyhow::anyhow!("Unknown argument: {}\n{}", other, USAGE)),
        };
    }

    info!(api = %config.api_base_url, scheme = ?config.scheme, "Catchook TUI starting");

    // Create app before taking over the terminal so config errors print normally
    let mut app = App::new(config)?;
    app.start();

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

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Catchook TUI shutting down");
    Ok(())
}

fn cli_client(config: &Config, cache_dir: &Path) -> Result<ApiClient> {
    let store = SessionStore::for_kind(config.scheme, Arc::new(FileCookieJar::new(cache_dir)));
    Ok(ApiClient::new(config, store)?)
}

/// Print the backend health report as JSON
async fn show_health(config: &Config, cache_dir: &Path) -> Result<()> {
    let client = cli_client(config, cache_dir)?;
    let health = client.health().await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

/// Log in from the command line, storing the session for the dashboard
async fn login_cli(mut config: Config, cache_dir: &Path) -> Result<()> {
    let client = cli_client(&config, cache_dir)?;

    let default_email = config.last_email.clone().unwrap_or_default();
    if default_email.is_empty() {
        print!("Email: ");
    } else {
        print!("Email [{}]: ", default_email);
    }
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email).context("Failed to read email")?;
    let email = match email.trim() {
        "" => default_email,
        entered => entered.to_string(),
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let credentials = LoginCredentials {
        email: email.clone(),
        password,
    };
    match client.login(&credentials).await {
        Ok(auth) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            match auth.user {
                Some(user) => println!("Logged in as {} ({})", user.display_name(), user.role.label()),
                None => println!("Logged in"),
            }
            Ok(())
        }
        Err(ApiError::Validation { errors, message, .. }) if !errors.is_empty() => {
            for (field, error) in errors {
                eprintln!("{}: {}", field, error);
            }
            Err(anyhow::anyhow!(message))
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout_cli(config: &Config, cache_dir: &Path) -> Result<()> {
    let client = cli_client(config, cache_dir)?;
    if !client.session_store().has_session() {
        println!("Not logged in");
        return Ok(());
    }
    if let Err(e) = client.logout().await {
        warn!(error = %e, "Logout request failed");
    }
    println!("Logged out");
    Ok(())
}

async fn whoami(config: &Config, cache_dir: &Path) -> Result<()> {
    let client = cli_client(config, cache_dir)?;
    if !client.session_store().has_session() {
        println!("Not logged in");
        return Ok(());
    }
    let user = client.current_user().await?;
    println!("{} <{}>", user.display_name(), user.email);
    println!("Role:   {}", user.role.label());
    println!("Status: {}", user.status_label());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Session events, finished requests, debounced search
        app.check_background_tasks().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
