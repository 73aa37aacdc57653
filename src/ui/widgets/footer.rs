// src/ui/widgets/footer.rs

use crate::app::{App, AppState};
use ratatui::{prelude::*, widgets::Paragraph};

/// (key, action) pairs shown for each state.
fn hints(state: &AppState) -> &'static [(&'static str, &'static str)] {
    match state {
        AppState::Disclaimer => &[("Enter", "acknowledge"), ("q", "quit")],
        AppState::Idle => &[("Enter", "scan"), ("Esc", "quit")],
        AppState::Scanning => &[("c", "cancel"), ("l", "logs"), ("←→", "scroll logs"), ("q", "quit")],
        AppState::Finished => &[("n", "new scan"), ("Tab", "select"), ("↑↓", "scroll"), ("l", "logs"), ("q", "quit")],
    }
}

/// Renders the key hints for the current state.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if let AppState::Scanning = app.state {
        spans.push(Span::styled("Scanning  ", Style::new().fg(Color::Cyan)));
    }
    for (i, (key, action)) in hints(&app.state).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::new().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(*key, Style::new().bold().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {action}")));
    }

    let footer = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
