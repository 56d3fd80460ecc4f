// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the repair workflow:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Main Panel (70%)         | Summary (30%)          |
// | attribute list /         | pass progress,         |
// | suggestion table         | change totals          |
// +-------------------------+------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: phase, pass progress, status text.
    pub status_bar: Rect,
    /// Left side: the attribute list or the suggestion table.
    pub main_panel: Rect,
    /// Right side: run summary.
    pub summary: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the layout from the available terminal area. Fixed single-row bars
/// top and bottom, the rest split between the main panel and the summary.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // middle section
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let middle = vertical[1];
    let help_bar = vertical[2];

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(middle);

    AppLayout {
        status_bar,
        main_panel: horizontal[0],
        summary: horizontal[1],
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
