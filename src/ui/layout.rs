//! Main UI layout.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};
use crate::scanner::{SENSITIVITY_MIN_DBM, SENSITIVITY_STEPS, SENSITIVITY_STEP_DBM};

use super::command::render_command_line;
use super::scanner_panel::render_scanner_panel;
use super::settings_menu::{render_settings_dropdown, render_settings_tabs};
use super::status_bar::render_status_bar;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// RSSI bar width (right side)
const RSSI_BAR_WIDTH: u16 = 7;

/// dBm range covered by the RSSI bar (matches the sensitivity table)
const RSSI_BAR_MIN_DBM: f32 = SENSITIVITY_MIN_DBM;
const RSSI_BAR_MAX_DBM: f32 =
    SENSITIVITY_MIN_DBM + (SENSITIVITY_STEPS - 1) as f32 * SENSITIVITY_STEP_DBM;

/// Draw the entire UI
pub fn draw_ui(frame: &mut Frame, app: &App) {
    let show_settings = matches!(
        app.input_mode,
        InputMode::SettingsSelect | InputMode::SettingsEdit
    );
    let show_command = app.input_mode == InputMode::Command;

    let main_area = frame.area();
    let mut v_constraints = vec![
        Constraint::Length(3), // Header (full width)
        Constraint::Min(11),   // Middle: scanner panel + RSSI bar
        Constraint::Length(3), // Status bar (full width)
        Constraint::Length(1), // Help bar (full width)
    ];
    if show_settings {
        v_constraints.insert(1, Constraint::Length(3)); // Settings tabs (full width)
    }
    if show_command {
        v_constraints.insert(v_constraints.len() - 1, Constraint::Length(3)); // Command (full width)
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(v_constraints)
        .split(main_area);

    let mut idx = 0;
    render_header(frame, rows[idx], app);
    idx += 1;

    if show_settings {
        render_settings_tabs(frame, rows[idx], app);
        idx += 1;
    }

    // Only the middle row is split: scanner panel (left) | RSSI bar (right)
    let middle_row = rows[idx];
    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(RSSI_BAR_WIDTH)])
        .split(middle_row);
    idx += 1;

    render_scanner_panel(frame, h_chunks[0], app);
    render_rssi_bar(frame, h_chunks[1], app);

    render_status_bar(frame, rows[idx], app);
    idx += 1;

    if show_command {
        render_command_line(frame, rows[idx], app);
        idx += 1;
    }

    render_help_bar(frame, rows[idx], app);

    // Overlay widgets (rendered on top of everything else)
    if app.input_mode == InputMode::SettingsEdit {
        render_settings_dropdown(frame, app);
    }
}

/// Render the vertical RSSI bar with a sensitivity threshold marker
fn render_rssi_bar(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.snapshot();
    let detected = snapshot.rssi > snapshot.sensitivity;

    let filled_style = if detected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let empty_style = Style::default().fg(Color::DarkGray);

    let block = Block::default().borders(Borders::ALL).title(" RX ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let span = RSSI_BAR_MAX_DBM - RSSI_BAR_MIN_DBM;
    let fill_ratio = ((snapshot.rssi - RSSI_BAR_MIN_DBM) / span).clamp(0.0, 1.0);
    let threshold_ratio = ((snapshot.sensitivity - RSSI_BAR_MIN_DBM) / span).clamp(0.0, 1.0);

    let filled_rows = (inner.height as f32 * fill_ratio).round() as u16;
    let threshold_row = inner
        .height
        .saturating_sub((inner.height as f32 * threshold_ratio).round() as u16)
        .min(inner.height.saturating_sub(1));

    let mut lines = Vec::with_capacity(inner.height as usize);
    for r in 0..inner.height {
        let fill = r >= inner.height.saturating_sub(filled_rows);
        let (s, line_style) = if r == threshold_row {
            ("─".repeat(inner.width as usize), Style::default().fg(Color::Yellow))
        } else if fill {
            ("█".repeat(inner.width as usize), filled_style)
        } else {
            (" ".repeat(inner.width as usize), empty_style)
        };
        lines.push(Line::from(Span::styled(s, line_style)));
    }
    let paragraph = Paragraph::new(Text::from(lines));
    frame.render_widget(paragraph, inner);
}

/// Render the header with title and radio status
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.snapshot();

    let (status_symbol, status_style) = if !app.radio_attached {
        ("○", Style::default().fg(Color::Yellow))
    } else if snapshot.scanning {
        ("●", Style::default().fg(Color::Cyan))
    } else {
        ("●", Style::default().fg(Color::Green))
    };

    let title = format!("SubScan v{}", VERSION);

    let device_str = if app.radio_attached { "RTL-SDR" } else { "Demo" };
    let radio_info = format!(
        "{} {} | {} | {:.2} MHz | {}",
        status_symbol,
        if snapshot.scanning { "SCAN" } else { "LOCK" },
        device_str,
        app.frequency_mhz(),
        snapshot.modulation.label(),
    );

    // Calculate padding for right-alignment
    let padding = area
        .width
        .saturating_sub(title.len() as u16 + radio_info.len() as u16 + 4);

    let header_line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(padding as usize)),
        Span::styled(radio_info, status_style),
    ]);

    let header = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default()),
    );

    frame.render_widget(header, area);
}

/// Render the context-sensitive help bar
fn render_help_bar(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.input_mode {
        InputMode::Normal => {
            "←/→: Tune | Shift+←/→: Scan | ↑/↓: Sensitivity | Tab: Settings | :: Command | q: Quit"
        }
        InputMode::Command => "Enter: Execute | Esc: Cancel",
        InputMode::SettingsSelect => "Left/Right: Select | Tab: Cycle | Enter: Edit | Esc: Back",
        InputMode::SettingsEdit => "Up/Down: Change Value | Enter: Apply | Esc: Cancel",
    };

    let help = Paragraph::new(Line::from(Span::styled(
        format!(" {}", help_text),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(help, area);
}
