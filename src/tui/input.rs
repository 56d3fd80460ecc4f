// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (cursor movement).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{ViewPhase, ViewState};
use crate::protocol::UserCommand;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally
/// by mutating `ViewState` (cursor movement) or was a no-op.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately (escape hatch)
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),

        // Cursor movement (local)
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.move_cursor_up();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_state.move_cursor_down();
            None
        }

        // Toggle the row under the cursor
        KeyCode::Char(' ') => match view_state.phase {
            ViewPhase::Attributes => {
                if view_state.attributes.is_empty() {
                    None
                } else {
                    Some(UserCommand::ToggleAttribute(view_state.cursor))
                }
            }
            ViewPhase::Suggestions => view_state
                .rows
                .get(view_state.cursor)
                .map(|row| UserCommand::ToggleSuggestion(row.id)),
        },

        // Confirm the attribute selection
        KeyCode::Enter => match view_state.phase {
            ViewPhase::Attributes => Some(UserCommand::ConfirmAttributes),
            ViewPhase::Suggestions => None,
        },

        // Review-phase commands
        KeyCode::Char('a') => match view_state.phase {
            ViewPhase::Suggestions => Some(UserCommand::ApplyAndAdvance),
            ViewPhase::Attributes => None,
        },
        KeyCode::Char('s') => match view_state.phase {
            ViewPhase::Suggestions => Some(UserCommand::SkipPass),
            ViewPhase::Attributes => None,
        },

        KeyCode::Char('e') => Some(UserCommand::Export),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
