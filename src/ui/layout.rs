// src/ui/layout.rs

use ratatui::layout::{Constraint, Layout, Rect};

/// The screen regions every widget renders into.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub input: Rect,
    pub report: Rect,
    pub summary: Rect,
    pub footer: Rect,
    /// Zero-sized while the log panel is hidden.
    pub log_panel: Rect,
}

/// Splits the frame into the input bar, the content row and the footer.
///
/// # Arguments
/// * `frame_size` - The total size of the terminal frame.
/// * `show_logs` - Whether the content row gives a column to the log panel.
pub fn create_layout(frame_size: Rect, show_logs: bool) -> AppLayout {
    let [input, content, footer] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)]).areas(frame_size);

    if show_logs {
        let [report, summary, log_panel] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(20), Constraint::Percentage(30)])
                .areas(content);
        AppLayout { input, report, summary, footer, log_panel }
    } else {
        let [report, summary] =
            Layout::horizontal([Constraint::Percentage(68), Constraint::Percentage(32)]).areas(content);
        AppLayout { input, report, summary, footer, log_panel: Rect::default() }
    }
}
