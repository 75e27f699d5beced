//! Command input widget.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};

/// Render the command input line
pub fn render_command_line(frame: &mut Frame, area: Rect, app: &App) {
    let (input_text, mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (String::new(), "NORMAL", Style::default().fg(Color::Green)),
        InputMode::Command => (
            format!(":{}", app.command_input),
            "COMMAND",
            Style::default().fg(Color::Yellow),
        ),
        InputMode::SettingsSelect => (String::new(), "SETTINGS", Style::default().fg(Color::Cyan)),
        InputMode::SettingsEdit => (String::new(), "EDIT", Style::default().fg(Color::Green)),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode_text),
            mode_style.add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(input_text),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("command"),
    );

    frame.render_widget(widget, area);
}
