//! userdeck binary entry point.
//!
//! Loads settings, starts logging and the Tokio runtime used for network
//! requests, initializes the terminal in raw mode, runs the TUI event loop,
//! and restores the terminal state on exit.
//!
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use userdeck::api::{HttpUserService, Session, UserService};
use userdeck::app::keymap::Keymap;
use userdeck::app::settings::Settings;
use userdeck::app::{self, AppState};
use userdeck::cli::Cli;
use userdeck::controller::Controller;
use userdeck::error::{Context, Result};

/// Send `tracing` output to the log file; the terminal belongs to the UI.
fn init_logging(cli: &Cli) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_ctx(|| format!("open log file {}", cli.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_ctx(|| format!("parse log filter '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut settings = Settings::load_or_init(&cli.config);
    cli.apply_to(&mut settings);
    let keymap = Keymap::load_or_init(&cli.keybinds);
    info!(base_url = %settings.base_url, theme = settings.theme.as_str(), "starting userdeck");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_ctx(|| "start tokio runtime".to_string())?;
    let service = HttpUserService::new(&settings.base_url, settings.api_key.clone(), settings.request_timeout())
        .with_ctx(|| "build http client".to_string())?;

    let token = match (settings.token.clone(), cli.credentials()) {
        (Some(token), _) => Some(token),
        (None, Some((email, password))) => {
            let token = runtime
                .block_on(service.login(email, password))
                .with_ctx(|| format!("sign in as {email}"))?;
            info!(email, "signed in");
            Some(token)
        }
        (None, None) => None,
    };

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = Controller::new(
        Arc::new(service),
        runtime.handle().clone(),
        tx,
        settings.controller_options(),
    );
    let state = AppState::new(&settings, Session::new(token), keymap);

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, state, controller, rx);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();
    runtime.shutdown_timeout(Duration::from_millis(500));

    if let Err(err) = res {
        error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
