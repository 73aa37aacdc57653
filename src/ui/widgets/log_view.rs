// src/ui/widgets/log_view.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation},
};

/// Styles one log line: grey timestamp, coloured level, plain message.
fn style_line(line: &str) -> Line<'_> {
    // "<date> <time> <LEVEL> <target>: <message>", with the level right-aligned.
    let mut parts = line.splitn(3, ' ');
    let (Some(date), Some(time), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Line::from(line);
    };
    let Some((level, message)) = rest.trim_start().split_once(' ') else {
        return Line::from(line);
    };
    let level_style = match level {
        "ERROR" => Style::default().fg(Color::Red),
        "WARN" => Style::default().fg(Color::Yellow),
        "INFO" => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Blue),
    };
    Line::from(vec![
        Span::styled(format!("{date} {time}"), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(level, level_style),
        Span::raw(format!(" {message}")),
    ])
}

/// Renders the tail of the log file with horizontal scrolling.
///
/// # Arguments
///
/// * `frame` - The frame to render onto.
/// * `app` - Application state holding the log lines and scroll position.
/// * `area` - The panel area.
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().title("Logs (scroll with ← →)").borders(Borders::ALL);
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let max_width = app.log_content.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    app.log_horizontal_scroll_state = app.log_horizontal_scroll_state.content_length(max_width);

    // Keep the newest lines in view.
    let room = inner_area.height.saturating_sub(1) as usize;
    let start = app.log_content.len().saturating_sub(room);
    let log_lines: Vec<Line> = app.log_content[start..].iter().map(|line| style_line(line)).collect();

    let log_paragraph = Paragraph::new(log_lines).scroll((0, app.log_horizontal_scroll as u16));
    frame.render_widget(log_paragraph, inner_area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::HorizontalBottom).thumb_symbol("■");
    let scrollbar_area = Rect {
        x: inner_area.x,
        y: inner_area.y + inner_area.height.saturating_sub(1),
        width: inner_area.width,
        height: 1,
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut app.log_horizontal_scroll_state);
}
