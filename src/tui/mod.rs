// TUI front end: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors relevant parts of the application
// state. The app orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{AttributeChoice, RunSummary, SuggestionRow, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which screen the main panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Attributes,
    Suggestions,
}

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
/// The `render_frame` function reads this struct to draw the screen.
pub struct ViewState {
    pub phase: ViewPhase,
    /// Attribute choices (selection phase).
    pub attributes: Vec<AttributeChoice>,
    /// Suggestion rows of the current pass (review phase).
    pub rows: Vec<SuggestionRow>,
    pub pass_name: String,
    pub pass_index: usize,
    pub total_passes: usize,
    /// Cursor into whichever list the current phase shows.
    pub cursor: usize,
    pub summary: RunSummary,
    /// Latest status line text.
    pub status: String,
    /// Where the repaired log was written, once exported.
    pub exported_path: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            phase: ViewPhase::Attributes,
            attributes: Vec::new(),
            rows: Vec::new(),
            pass_name: String::new(),
            pass_index: 0,
            total_passes: 0,
            cursor: 0,
            summary: RunSummary::default(),
            status: String::new(),
            exported_path: None,
        }
    }
}

impl ViewState {
    /// Length of the list the cursor currently moves over.
    fn active_list_len(&self) -> usize {
        match self.phase {
            ViewPhase::Attributes => self.attributes.len(),
            ViewPhase::Suggestions => self.rows.len(),
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        let len = self.active_list_len();
        if len > 0 && self.cursor < len - 1 {
            self.cursor += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Attributes(attributes) => {
            state.attributes = attributes;
            if state.phase == ViewPhase::Attributes && state.cursor >= state.attributes.len() {
                state.cursor = state.attributes.len().saturating_sub(1);
            }
        }
        UiUpdate::PassSuggestions {
            pass_name,
            pass_index,
            total_passes,
            rows,
        } => {
            state.phase = ViewPhase::Suggestions;
            state.pass_name = pass_name;
            state.pass_index = pass_index;
            state.total_passes = total_passes;
            state.rows = rows;
            state.cursor = 0;
        }
        UiUpdate::SuggestionToggled { id, accepted } => {
            if let Some(row) = state.rows.iter_mut().find(|r| r.id == id) {
                row.accepted = accepted;
            }
        }
        UiUpdate::Summary(summary) => {
            state.summary = summary;
        }
        UiUpdate::Status(text) => {
            state.status = text;
        }
        UiUpdate::PassesExhausted => {
            state.phase = ViewPhase::Suggestions;
            state.rows.clear();
            state.cursor = 0;
        }
        UiUpdate::Exported { path } => {
            state.exported_path = Some(path);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render_status(frame, layout.status_bar, state);
    match state.phase {
        ViewPhase::Attributes => widgets::attributes::render(frame, layout.main_panel, state),
        ViewPhase::Suggestions => widgets::suggestions::render(frame, layout.main_panel, state),
    }
    widgets::summary::render(frame, layout.summary, state);
    widgets::status_bar::render_help(frame, layout.help_bar, state);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Forward a command to the app task. Returns false when the event loop
/// should stop: after a quit command, or when the app task has exited and
/// the channel is closed — rendering on without a counterpart would leave
/// an unresponsive UI.
async fn forward_command(cmd_tx: &mpsc::Sender<UserCommand>, cmd: UserCommand) -> bool {
    let quitting = cmd == UserCommand::Quit;
    if cmd_tx.send(cmd).await.is_err() {
        return false;
    }
    !quitting
}

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Panic hook to restore the terminal on crash. The original hook is
    // chained after ours.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            if !forward_command(&cmd_tx, cmd).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse events, resize events, etc. -- ignore
                    }
                    Some(Err(_)) => {
                        break;
                    }
                    None => {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
