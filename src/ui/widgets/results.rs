// src/ui/widgets/results.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation},
};
use shadowrecon::core::models::{CategoryStatus, PhaseStatus, ScanResults};

fn heading(title: String) -> Line<'static> {
    Line::from(Span::styled(title, Style::default().fg(Color::Yellow).bold()))
}

fn item(text: String) -> Line<'static> {
    Line::from(vec![Span::styled("  - ", Style::default().fg(Color::DarkGray)), Span::raw(text)])
}

/// Builds the inventory lines for one target.
fn target_lines(results: &ScanResults) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!("■ {} ({:.1}s)", results.target, results.metadata.duration_seconds),
        Style::default().fg(Color::Cyan).bold(),
    ))];

    if let Some(error) = &results.metadata.fatal_error {
        lines.push(Line::styled(format!("  Scan aborted: {error}"), Style::default().fg(Color::Red)));
        lines.push(Line::from(""));
        return lines;
    }
    if results.metadata.cancelled {
        lines.push(Line::styled("  Cancelled, results are partial.", Style::default().fg(Color::Yellow)));
    }

    let sections: [(&str, Vec<String>); 7] = [
        ("Subdomains", results.subdomains.clone()),
        (
            "Directories",
            results.directories.iter().map(|d| format!("{} [{}] {}B", d.url, d.status, d.content_length)).collect(),
        ),
        ("Parameters", results.parameters.iter().map(|p| format!("{} ({})", p.name, p.origin)).collect()),
        (
            "Technologies",
            results
                .technologies
                .iter()
                .map(|t| match &t.version {
                    Some(version) => format!("{} {version} [{}]", t.name, t.category),
                    None => format!("{} [{}]", t.name, t.category),
                })
                .collect(),
        ),
        (
            "Forms",
            results.inputs.iter().map(|f| format!("{} {} ({} fields)", f.method, f.action, f.fields.len())).collect(),
        ),
        (
            "External Tools",
            results
                .external
                .iter()
                .map(|e| match &e.detail {
                    Some(detail) => format!("[{}] {} {} ({detail})", e.tool, e.kind, e.value),
                    None => format!("[{}] {} {}", e.tool, e.kind, e.value),
                })
                .collect(),
        ),
        (
            "Attack Vectors",
            results
                .attack_surface
                .iter()
                .flat_map(|surface| surface.attack_vectors.iter())
                .map(|v| format!("[{}] {}", v.priority, v.description))
                .collect(),
        ),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(heading(format!(" {title} ({})", entries.len())));
        lines.extend(entries.into_iter().map(item));
    }

    if let Some(dns) = &results.dns {
        lines.push(heading(" DNS".to_string()));
        lines.push(item(format!("A: {}", dns.a.join(", "))));
        lines.push(item(format!("MX: {}", dns.mx.join(", "))));
        lines.push(item(format!("NS: {}", dns.ns.join(", "))));
        if dns.wildcard {
            lines.push(item("Wildcard DNS enabled".to_string()));
        }
    }
    if let Some(cert) = &results.certificate {
        lines.push(heading(" Certificate".to_string()));
        lines.push(item(format!("Issuer: {}", cert.issuer_name)));
        lines.push(item(format!("Expires in {} days", cert.days_until_expiry)));
    }

    let problems: Vec<String> = results
        .metadata
        .phases
        .iter()
        .filter_map(|record| match &record.status {
            PhaseStatus::Failed(reason) => Some(format!("{}: {reason}", record.phase)),
            _ => None,
        })
        .chain(results.metadata.categories.iter().filter_map(|(name, status)| match status {
            CategoryStatus::Unavailable(reason) | CategoryStatus::Failed(reason) => Some(format!("{name}: {reason}")),
            _ => None,
        }))
        .collect();
    if !problems.is_empty() {
        lines.push(Line::styled(" Problems", Style::default().fg(Color::Red).bold()));
        lines.extend(problems.into_iter().map(item));
    }
    for (format, path) in &results.metadata.reports {
        lines.push(Line::styled(format!(" Report ({format}): {}", path.display()), Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(""));
    lines
}

/// Renders the scrollable inventory of every target in the batch.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines: Vec<Line> = app.results.iter().flat_map(target_lines).collect();

    app.scroll_offset = app.scroll_offset.min(lines.len().saturating_sub(1));
    app.report_scroll_state = app.report_scroll_state.content_length(lines.len()).position(app.scroll_offset);

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::TOP).title("DISCOVERY".bold()))
        .scroll((app.scroll_offset as u16, 0));
    frame.render_widget(paragraph, area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight).begin_symbol(Some("↑")).end_symbol(Some("↓"));
    frame.render_stateful_widget(scrollbar, area, &mut app.report_scroll_state);
}
