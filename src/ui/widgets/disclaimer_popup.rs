// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    layout::Flex,
    prelude::*,
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

/// Renders the authorization notice on top of the UI.
///
/// # Arguments
/// * `frame` - The frame used for rendering.
/// * `area` - The total area the popup is centered in.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("AUTHORIZED USE ONLY".bold().yellow()),
        Line::from(""),
        Line::from("ShadowRecon actively probes its targets: it brute-forces subdomains and paths, crawls pages, sends injection payloads and can launch tools such as nmap, sqlmap and nuclei."),
        Line::from(""),
        Line::from("Run it only against systems you own or have written permission to test. Unauthorized scanning is illegal in many jurisdictions."),
        Line::from(""),
        Line::from("By continuing you confirm that:"),
        Line::from("1. Every target you enter is in scope for an authorized assessment."),
        Line::from("2. You accept responsibility for the traffic this tool generates."),
        Line::from("3. The authors accept NO liability for misuse or damage."),
        Line::from(""),
        Line::from(vec!["Enter".bold().yellow(), " accept    ".into(), "q".bold().yellow(), " quit".into()]),
    ]);

    let popup_area = centered(area, 70, 70);
    let popup = Paragraph::new(disclaimer_text)
        .block(
            Block::default()
                .title(" Before you scan ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// A `width_pct` by `height_pct` rectangle in the middle of `area`.
fn centered(area: Rect, width_pct: u16, height_pct: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(height_pct)]).flex(Flex::Center).areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(width_pct)]).flex(Flex::Center).areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let popup = centered(Rect::new(0, 0, 100, 50), 70, 70);
        assert_eq!((popup.width, popup.height), (70, 35));
        assert_eq!(popup.x, 15);
    }
}
