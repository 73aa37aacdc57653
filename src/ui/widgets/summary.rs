// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use std::collections::BTreeSet;

/// Renders the batch summary: exposure score, issue counts and the
/// technologies seen across all targets. Empty until the batch finishes.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - The application state holding the finished results.
/// * `area` - The drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Length(5), // Issues
            Constraint::Length(1),
            Constraint::Length(4), // Coverage
            Constraint::Length(1),
            Constraint::Min(0), // Technologies
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }

    // --- Exposure Score ---
    // Higher means a larger, more vulnerable surface.
    let (rating_text, rating_style) = match app.summary.score {
        0..=19 => ("Minimal", Style::default().fg(Color::Green)),
        20..=49 => ("Moderate", Style::default().fg(Color::Yellow)),
        50..=79 => ("Elevated", Style::default().fg(Color::LightRed)),
        _ => ("Severe", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Exposure Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    let score_gauge = Gauge::default().percent(app.displayed_score.min(100) as u16).label("").style(
        Style::default().fg(if app.displayed_score >= 50 {
            Color::Red
        } else if app.displayed_score >= 20 {
            Color::Yellow
        } else {
            Color::Green
        }),
    );
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Issues ---
    let issues = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(app.summary.critical_issues.to_string(), Style::default().fg(Color::Red).bold()),
        ]),
        Line::from(vec![
            Span::raw("High:     "),
            Span::styled(app.summary.high_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Medium:   "),
            Span::styled(app.summary.medium_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(issues).block(Block::default().title("ISSUES FOUND".bold())),
        summary_chunks[3],
    );

    // --- Coverage ---
    let failed_style =
        if app.summary.failed_phases > 0 { Style::default().fg(Color::Red) } else { Style::default().fg(Color::Green) };
    let coverage = Text::from(vec![
        Line::from(format!("Targets:  {}", app.summary.targets)),
        Line::from(format!("Findings: {}", app.summary.findings)),
        Line::from(vec![Span::raw("Failed phases: "), Span::styled(app.summary.failed_phases.to_string(), failed_style)]),
    ]);
    frame.render_widget(
        Paragraph::new(coverage).block(Block::default().title("COVERAGE".bold())),
        summary_chunks[5],
    );

    // --- Technologies ---
    let names: BTreeSet<&str> =
        app.results.iter().flat_map(|r| r.technologies.iter()).map(|t| t.name.as_str()).collect();
    let tech_lines: Vec<Line> = if names.is_empty() {
        vec![Line::from("Not identified.")]
    } else {
        names
            .into_iter()
            .map(|name| Line::from(vec![Span::raw("- "), Span::styled(name, Style::default().fg(Color::Cyan))]))
            .collect()
    };
    frame.render_widget(
        Paragraph::new(tech_lines).block(Block::default().title("TECHNOLOGIES".bold())),
        summary_chunks[7],
    );
}
