//! Scanner readout panel: frequency, signal strength, threshold, and mode.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the central scanner readout
pub fn render_scanner_panel(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.snapshot();

    let (mode_text, mode_style) = if snapshot.scanning {
        ("Scan", Style::default().fg(Color::Cyan))
    } else {
        (
            "Lock",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    };

    let detected = snapshot.rssi > snapshot.sensitivity;
    let rssi_style = if detected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Freq: {:.2} MHz", snapshot.frequency as f64 / 1_000_000.0),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("RSSI: {:.2} dBm", snapshot.rssi),
            rssi_style,
        )),
        Line::from(Span::styled(
            format!("Sens: {:.2} dBm", snapshot.sensitivity),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(snapshot.modulation.label(), Style::default().fg(Color::White)),
            Span::raw(" "),
            Span::styled(mode_text, mode_style),
        ]),
    ];

    let panel = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Radio "));

    frame.render_widget(panel, area);
}
