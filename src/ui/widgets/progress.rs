// src/ui/widgets/progress.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the live phase log while a batch runs, or a placeholder before one starts.
pub fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Progress");

    if let AppState::Idle | AppState::Disclaimer = app.state {
        let placeholder = Paragraph::new("Scan results will appear here...")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let spinner = SPINNER_CHARS[app.spinner_frame];
    let status = match &app.current_phase {
        Some((target, phase)) => format!("{target}: {phase}"),
        None => "Starting...".to_string(),
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{spinner} "), Style::default().fg(Color::Cyan)),
            Span::styled(status, Style::default().bold()),
        ]),
        Line::from(""),
    ];

    // Newest lines stay visible at the bottom of the panel.
    let room = area.height.saturating_sub(4) as usize;
    let start = app.progress.len().saturating_sub(room);
    lines.extend(app.progress[start..].iter().map(|line| {
        let style = if line.contains('✗') {
            Style::default().fg(Color::Red)
        } else if line.starts_with('[') {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::styled(line.clone(), style)
    }));

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
