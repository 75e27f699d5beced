//! SubScan - Sub-GHz band scanner
//!
//! A terminal UI application that sweeps a tunable receiver across the
//! sub-GHz bands, detects signal presence by RSSI thresholding, and locks
//! on detected signals.

mod app;
mod input;
mod radio;
mod scanner;
mod storage;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};
use std::panic;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, InputMode};
use input::command_for_key;
use radio::RtlSdrPort;
use storage::Storage;
use ui::draw_ui;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bounded input poll per loop iteration; keeps the scan loop live with no input.
const TICK_POLL: Duration = Duration::from_millis(10);

/// Restore the terminal to normal state (for panic handler)
fn restore_terminal_panic() {
    // Disable raw mode first
    let _ = disable_raw_mode();

    // Write escape sequences directly to stdout
    let mut stdout = io::stdout();

    // Leave alternate screen: ESC [ ? 1049 l
    let _ = stdout.write_all(b"\x1b[?1049l");

    // Show cursor: ESC [ ? 25 h
    let _ = stdout.write_all(b"\x1b[?25h");

    let _ = stdout.flush();
}

fn main() -> Result<()> {
    // Check if we have a TTY first
    if !atty::is(atty::Stream::Stdout) {
        eprintln!("Error: SubScan requires a terminal (TTY) to run.");
        eprintln!("Please run this program in a real terminal, not via a script or IDE runner.");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal on panic
    let default_panic = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        default_panic(panic_info);
    }));

    // Initialize logging to a file (not stdout, which would corrupt TUI)
    let log_file = storage::resolve_config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from(".").join("subscan"))
        .join("subscan.log");

    // Create log directory if needed
    if let Some(parent) = log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // Set up file-based logging
    if let Ok(file) = std::fs::File::create(&log_file) {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "subscan=info".into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    }

    tracing::info!("Starting SubScan v{}", VERSION);

    // Build the app before touching the terminal so a fatal startup error
    // (untunable configured frequency) prints normally
    let storage = Storage::new()?;
    let radio = RtlSdrPort::new(
        storage.config.default_frequency,
        storage.config.default_modulation,
    )?;
    let radio_attached = radio.is_available();
    let mut app = App::new(storage.config.clone(), Box::new(radio), radio_attached)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal properly using the terminal's backend
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app.shutdown() {
        tracing::warn!("Radio teardown failed: {}", e);
    }

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
        return Err(err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.is_running() {
        terminal.draw(|f| draw_ui(f, app))?;

        if event::poll(TICK_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.input_mode {
                        InputMode::Normal => {
                            if let Some(command) = command_for_key(key) {
                                app.handle_command(command)?;
                            }
                        }

                        InputMode::Command => match key.code {
                            KeyCode::Enter => {
                                let command = app.command_input.clone();
                                app.execute_command(&command)?;
                                app.command_input.clear();
                                if app.input_mode == InputMode::Command {
                                    app.input_mode = InputMode::Normal;
                                }
                            }
                            KeyCode::Char(c) => {
                                app.command_input.push(c);
                            }
                            KeyCode::Backspace => {
                                app.command_input.pop();
                            }
                            KeyCode::Esc => {
                                app.command_input.clear();
                                app.input_mode = InputMode::Normal;
                            }
                            _ => {}
                        },

                        InputMode::SettingsSelect => match key.code {
                            KeyCode::Left | KeyCode::Char('h') => {
                                if app.settings_field_index > 0 {
                                    app.settings_field_index -= 1;
                                }
                            }
                            KeyCode::Right | KeyCode::Char('l') => {
                                if app.settings_field_index < app::SettingsField::ALL.len() - 1 {
                                    app.settings_field_index += 1;
                                }
                            }
                            KeyCode::Tab => {
                                // Cycle through fields
                                app.settings_field_index =
                                    (app.settings_field_index + 1) % app::SettingsField::ALL.len();
                            }
                            KeyCode::Enter => {
                                // Enter edit mode for this field
                                app.settings_value_index = app.current_settings_value_index();
                                app.input_mode = InputMode::SettingsEdit;
                            }
                            KeyCode::Esc => {
                                app.input_mode = InputMode::Normal;
                            }
                            _ => {}
                        },

                        InputMode::SettingsEdit => match key.code {
                            KeyCode::Up | KeyCode::Char('k') => {
                                if app.settings_value_index > 0 {
                                    app.settings_value_index -= 1;
                                }
                            }
                            KeyCode::Down | KeyCode::Char('j') => {
                                let max = app.settings_value_count();
                                if app.settings_value_index < max - 1 {
                                    app.settings_value_index += 1;
                                }
                            }
                            KeyCode::Enter => {
                                app.apply_settings_value()?;
                                app.input_mode = InputMode::SettingsSelect;
                            }
                            KeyCode::Esc => {
                                app.input_mode = InputMode::SettingsSelect;
                            }
                            _ => {}
                        },
                    }
                }
            }
        }

        // Scan loop iteration: sample, lock/resume, step, retune
        app.tick()?;

        if app.take_bell() {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
    }

    Ok(())
}
