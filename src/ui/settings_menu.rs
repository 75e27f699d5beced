//! Settings surface: field tabs plus an inline value editor.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, InputMode, SettingsField};
use crate::scanner::{
    sensitivity_for_index, Modulation, ScanDirection, FREQ_CUSTOM_LABEL, FREQ_PRESETS,
    SENSITIVITY_STEPS, STEP_PRESETS,
};

const TAB_WIDTH: u16 = 18;

/// Values offered by the editor for a settings field, in selection order.
pub fn field_values(field: SettingsField) -> Vec<String> {
    match field {
        SettingsField::Frequency => FREQ_PRESETS
            .iter()
            .map(|(_, label)| label.to_string())
            .chain(std::iter::once(FREQ_CUSTOM_LABEL.to_string()))
            .collect(),
        SettingsField::Modulation => Modulation::ALL
            .iter()
            .map(|m| m.label().to_string())
            .collect(),
        SettingsField::Direction => ScanDirection::ALL
            .iter()
            .map(|d| d.label().to_string())
            .collect(),
        SettingsField::Mode => vec!["Locked".to_string(), "Scanning".to_string()],
        SettingsField::Sensitivity => (0..SENSITIVITY_STEPS)
            .map(|i| format!("{:.0} dBm", sensitivity_for_index(i)))
            .collect(),
        SettingsField::StepSize => STEP_PRESETS
            .iter()
            .map(|(_, label)| label.to_string())
            .collect(),
    }
}

/// Current display value of a settings field
fn field_value_text(field: SettingsField, app: &App) -> String {
    match field {
        SettingsField::Frequency => format!("{:.2}MHz", app.frequency_mhz()),
        SettingsField::Modulation => app.scanner.modulation.label().to_string(),
        SettingsField::Direction => app.scanner.scan_direction.label().to_string(),
        SettingsField::Mode => if app.scanner.scanning { "Scanning" } else { "Locked" }.to_string(),
        SettingsField::Sensitivity => format!("{:.0}dBm", app.scanner.sensitivity),
        SettingsField::StepSize => STEP_PRESETS
            .iter()
            .find(|(hz, _)| *hz == app.scanner.frequency_step)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| format!("{}Hz", app.scanner.frequency_step)),
    }
}

fn tab_style(app: &App, index: usize) -> Style {
    if index != app.settings_field_index {
        return Style::default().fg(Color::White);
    }
    let highlight = match app.input_mode {
        InputMode::SettingsEdit => Color::Green,
        _ => Color::Cyan,
    };
    Style::default()
        .fg(Color::Black)
        .bg(highlight)
        .add_modifier(Modifier::BOLD)
}

/// Render the settings selector tabs in the header area
pub fn render_settings_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let tabs = SettingsField::ALL.iter().enumerate().map(|(i, field)| {
        let cell = format!("{}:{}", field.label(), field_value_text(*field, app));
        Span::styled(format!(" [{:w$}] ", cell, w = TAB_WIDTH as usize - 4), tab_style(app, i))
    });

    let mut spans = vec![Span::styled(" Settings: ", Style::default().fg(Color::DarkGray))];
    spans.extend(tabs);

    let widget = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Scanner Settings (Tab) "),
    );

    frame.render_widget(widget, area);
}

/// Render the settings value dropdown when in SettingsEdit mode
pub fn render_settings_dropdown(frame: &mut Frame, app: &App) {
    if app.input_mode != InputMode::SettingsEdit {
        return;
    }

    let area = frame.area();
    let field = SettingsField::ALL[app.settings_field_index];
    let values = field_values(field);
    let active = app.current_settings_value_index();

    // Width fits the longest value plus the selection marker and borders
    let longest = values.iter().map(|v| v.len()).max().unwrap_or(0) as u16;
    let menu_width = (longest + 7).max(field.label().len() as u16 + 4);
    let menu_height = values.len() as u16 + 2;

    // Anchor under the selected tab, clamped to the frame
    let anchor = 11 + app.settings_field_index as u16 * TAB_WIDTH;
    let menu_area = Rect::new(
        anchor.min(area.width.saturating_sub(menu_width)),
        6,
        menu_width.min(area.width),
        menu_height.min(area.height.saturating_sub(6)),
    );

    let items: Vec<ListItem> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let cursor = if i == app.settings_value_index { '>' } else { ' ' };
            let marker = if i == active { '*' } else { ' ' };
            let style = if i == app.settings_value_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(
                format!("{} {} {}", cursor, value, marker),
                style,
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" {} ", field.label()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(Clear, menu_area);
    frame.render_widget(list, menu_area);
}
