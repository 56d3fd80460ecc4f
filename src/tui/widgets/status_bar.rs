// Status and help bars: single-row strips at the top and bottom.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{ViewPhase, ViewState};

/// Render the top status bar: phase and the latest status message.
pub fn render_status(frame: &mut Frame, area: Rect, state: &ViewState) {
    let phase = match state.phase {
        ViewPhase::Attributes => "Select attributes",
        ViewPhase::Suggestions => "Review suggestions",
    };
    let text = format!(" {phase} | {}", state.status);
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Render the bottom help bar with the shortcuts of the current phase.
pub fn render_help(frame: &mut Frame, area: Rect, state: &ViewState) {
    let text = match state.phase {
        ViewPhase::Attributes => " space:Toggle | enter:Analyze | q:Quit",
        ViewPhase::Suggestions => " space:Accept | a:Apply | s:Skip pass | e:Export | q:Quit",
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn status_bar_shows_phase_and_message() {
        let mut state = ViewState::default();
        state.status = "pass `lexical` (1/6)".into();

        let backend = TestBackend::new(80, 2);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = Rect::new(0, 0, 80, 1);
                render_status(frame, area, &state);
            })
            .unwrap();

        let content = format!("{:?}", terminal.backend().buffer());
        assert!(content.contains("Select attributes"));
        assert!(content.contains("lexical"));
    }

    #[test]
    fn help_bar_tracks_phase() {
        let mut state = ViewState::default();
        state.phase = ViewPhase::Suggestions;

        let backend = TestBackend::new(80, 2);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = Rect::new(0, 0, 80, 1);
                render_help(frame, area, &state);
            })
            .unwrap();

        let content = format!("{:?}", terminal.backend().buffer());
        assert!(content.contains("a:Apply"));
    }
}
