// src/main.rs

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use shadowrecon::config::ScanConfig;
use shadowrecon::core::engine::{ScanEvent, ShadowEngine};
use shadowrecon::core::models::ScanResults;
use shadowrecon::logging;

mod app;
mod ui;

use app::{App, AppState};

struct Channels {
    events_tx: mpsc::UnboundedSender<ScanEvent>,
    events_rx: mpsc::UnboundedReceiver<ScanEvent>,
    done_tx: mpsc::Sender<Vec<ScanResults>>,
    done_rx: mpsc::Receiver<Vec<ScanResults>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let log_path = logging::initialize_logging()?;
    info!(path = %log_path.display(), "ShadowRecon starting.");

    let mut app = App::new(Some(log_path));
    let config = match ScanConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, falling back to defaults.");
            app.error = Some(format!("Configuration ignored: {e}"));
            ScanConfig::default()
        }
    };

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = mpsc::channel(1);
    let mut channels = Channels { events_tx, events_rx, done_tx, done_rx };

    let outcome = run(&mut terminal, &mut app, &config, &mut channels).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    outcome
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    config: &ScanConfig,
    channels: &mut Channels,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, config, channels)?;
        }

        while let Ok(event) = channels.events_rx.try_recv() {
            app.on_scan_event(event);
        }
        if let Ok(results) = channels.done_rx.try_recv() {
            info!(targets = results.len(), "Scan batch finished.");
            app.on_scan_complete();
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(app: &mut App, config: &ScanConfig, channels: &Channels) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match app.state {
                AppState::Disclaimer => match key.code {
                    KeyCode::Enter => app.state = AppState::Idle,
                    KeyCode::Char('q') => app.quit(),
                    _ => {}
                },
                AppState::Idle => handle_idle_input(app, key.code, config, channels),
                AppState::Finished => handle_finished_input(app, key.code),
                AppState::Scanning => match key.code {
                    KeyCode::Char('q') => app.quit_after_scan(),
                    KeyCode::Char('c') => app.request_cancel(),
                    KeyCode::Char('l') => app.show_logs = !app.show_logs,
                    KeyCode::Left => app.scroll_logs_left(),
                    KeyCode::Right => app.scroll_logs_right(),
                    _ => {}
                },
            }
        }
    }
    Ok(())
}

fn handle_idle_input(app: &mut App, key_code: KeyCode, config: &ScanConfig, channels: &Channels) {
    match key_code {
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Esc => app.quit(),
        KeyCode::Enter => start_scan(app, config, channels),
        _ => {}
    }
}

/// Builds a fresh engine for the typed targets and runs it in the background.
fn start_scan(app: &mut App, config: &ScanConfig, channels: &Channels) {
    let targets = app.targets();
    if targets.is_empty() {
        return;
    }
    let engine = match ShadowEngine::builder(config.clone()).with_events(channels.events_tx.clone()).build() {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "Could not build scan engine.");
            app.error = Some(e.to_string());
            return;
        }
    };

    app.error = None;
    app.cancel = Some(engine.cancel_handle());
    app.state = AppState::Scanning;
    info!(targets = ?targets, "Starting scan.");

    let done_tx = channels.done_tx.clone();
    tokio::spawn(async move {
        let results = engine.discover_multiple_targets(&targets).await;
        let _ = done_tx.send(results).await;
    });
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('l') => app.show_logs = !app.show_logs,
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Tab => app.select_next(),
        KeyCode::BackTab => app.select_previous(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}
