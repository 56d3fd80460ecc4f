// Run summary widget: pass progress and change totals.

use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the run summary sidebar.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let s = &state.summary;
    let mut lines = vec![
        Line::from(format!("Passes: {}/{}", s.passes_completed, s.total_passes)),
        Line::from(format!("Repairs applied: {}", s.conditions_applied)),
        Line::from(format!("Values rewritten: {}", s.entries_changed)),
        Line::from(format!("Events touched: {}", s.events_changed)),
    ];
    if let Some(path) = &state.exported_path {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Exported: {path}")));
    }

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Summary"));
    frame.render_widget(paragraph, area);
}
