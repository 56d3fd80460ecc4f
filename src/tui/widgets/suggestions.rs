// Suggestion review widget: the repair proposals of the current pass.
//
// Columns: acceptance mark, attribute, the value to replace with its count,
// the suggested replacement with its count, the similarity score, and an
// antonym-conflict marker.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::protocol::SuggestionRow;
use crate::tui::ViewState;

/// Render the suggestion table into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Attribute"),
        Cell::from("Value"),
        Cell::from("Suggested"),
        Cell::from("Score"),
        Cell::from("Note"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = state
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mark = if row.accepted { "[x]" } else { "[ ]" };
            let style = if i == state.cursor {
                Style::default().bg(Color::DarkGray)
            } else if row.accepted {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(row.attribute.clone()),
                Cell::from(format!("{} ({})", row.original, row.original_count)),
                Cell::from(format!("{} ({})", row.suggested, row.suggested_count)),
                Cell::from(format!("{:.2}", row.score)),
                Cell::from(note_for(row)),
            ])
            .style(style)
        })
        .collect();

    let title = format!(
        "Suggestions — {} ({}/{})",
        state.pass_name,
        state.pass_index + 1,
        state.total_passes.max(1)
    );
    let widths = [
        Constraint::Length(4),
        Constraint::Min(14),
        Constraint::Min(20),
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

/// The note column: antonym conflicts make a suggestion suspect.
fn note_for(row: &SuggestionRow) -> String {
    if row.antonyms.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = row
        .antonyms
        .iter()
        .map(|(a, b)| format!("{a}/{b}"))
        .collect();
    format!("antonyms: {}", pairs.join(", "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
