// src/ui/widgets/analysis_view.rs

use crate::app::App;
use crate::ui::widgets::results;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use shadowrecon::core::knowledge_base::{self, FindingCategory};
use shadowrecon::core::models::Severity;

pub(crate) fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red).bold(),
        Severity::High => Style::default().fg(Color::Red),
        Severity::Medium => Style::default().fg(Color::Yellow),
        Severity::Low => Style::default().fg(Color::Cyan),
        Severity::Info => Style::default().fg(Color::DarkGray),
    }
}

/// Renders the finished report: vulnerabilities on top, the selected one's
/// explanation under it, and the discovery inventory below.
pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Report (Tab to select, ↑ ↓ to scroll)");
    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(25), Constraint::Min(0)])
        .split(inner_area);

    // --- Vulnerability List ---
    let items: Vec<ListItem> = app
        .vulnerabilities()
        .iter()
        .map(|vuln| {
            let prefix = match knowledge_base::get_finding_detail(vuln.kind).map(|d| d.category) {
                Some(FindingCategory::Injection) => "[INJ] ",
                Some(FindingCategory::Access) => "[ACC] ",
                Some(FindingCategory::Client) => "[CLI] ",
                None => "",
            };
            let parameter = vuln.parameter.as_deref().map(|p| format!(" ({p})")).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<8} ", vuln.severity.to_string()), severity_style(vuln.severity)),
                Span::raw(format!("{} {}{parameter}", vuln.kind, vuln.endpoint)),
            ]))
        })
        .collect();

    if items.is_empty() {
        let empty = Paragraph::new("No vulnerabilities found.")
            .style(Style::default().fg(Color::Green))
            .block(Block::default().title("VULNERABILITIES".bold()));
        frame.render_widget(empty, chunks[0]);
    } else {
        let list = List::new(items)
            .block(Block::default().title("VULNERABILITIES".bold()))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[0], &mut app.vulnerability_list_state);
    }

    // --- Detail ---
    let selected = app.vulnerability_list_state.selected().and_then(|i| app.vulnerabilities().get(i).copied().cloned());
    let detail_text = match selected {
        Some(vuln) => {
            let mut lines = Vec::new();
            if let Some(detail) = knowledge_base::get_finding_detail(vuln.kind) {
                lines.push(Line::from(Span::styled(detail.title, severity_style(detail.severity))));
                lines.push(Line::from(format!("Category: {}", detail.category)));
                lines.push(Line::from(""));
                lines.push(Line::from(detail.description));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![Span::styled("Fix: ", Style::default().bold()), Span::raw(detail.remediation)]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(format!("URL: {}", vuln.url)));
            if !vuln.payload.is_empty() {
                lines.push(Line::from(format!("Payload: {}", vuln.payload)));
            }
            lines.push(Line::from(format!("Evidence: {}", vuln.evidence)));
            Text::from(lines)
        }
        None => Text::from("Select a finding with Tab to see details."),
    };
    let detail = Paragraph::new(detail_text)
        .block(Block::default().borders(Borders::TOP).title("DETAILS".bold()))
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, chunks[1]);

    results::render_results(frame, app, chunks[2]);
}
