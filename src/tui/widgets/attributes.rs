// Attribute selection widget: checkbox list of analyzable attributes.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the attribute checkbox table into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Attribute"),
        Cell::from("Distinct values"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = state
        .attributes
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let mark = if choice.selected { "[x]" } else { "[ ]" };
            let style = if i == state.cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(choice.name.clone()),
                Cell::from(format!("{}", choice.distinct_values)),
            ])
            .style(style)
        })
        .collect();

    let title = format!("Attributes ({})", state.attributes.len());
    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AttributeChoice;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn test_state() -> ViewState {
        let mut state = ViewState::default();
        state.attributes = vec![
            AttributeChoice {
                name: "concept:name".into(),
                distinct_values: 12,
                selected: true,
            },
            AttributeChoice {
                name: "org:resource".into(),
                distinct_values: 5,
                selected: false,
            },
        ];
        state
    }

    #[test]
    fn renders_checkboxes_and_names() {
        let state = test_state();
        let backend = TestBackend::new(60, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();

        let content = format!("{:?}", terminal.backend().buffer());
        assert!(content.contains("[x]"));
        assert!(content.contains("[ ]"));
        assert!(content.contains("concept:name"));
        assert!(content.contains("org:resource"));
        assert!(content.contains("Attributes (2)"));
    }

    #[test]
    fn renders_empty_list_without_panicking() {
        let state = ViewState::default();
        let backend = TestBackend::new(60, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
