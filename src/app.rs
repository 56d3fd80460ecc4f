// Application state and orchestration logic.
//
// The central event loop that coordinates the analysis pipeline and user
// commands from the TUI. Maintains the complete application state and pushes
// UI updates to the TUI render loop.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::analysis::suggest::RepairSuggestion;
use crate::analysis::{run_pass, Attribute};
use crate::config::{Config, PassConfig};
use crate::eventlog::{export_log, EventLog};
use crate::nlp::embedding::EmbeddingModel;
use crate::nlp::lexicon::Lexicon;
use crate::protocol::{AttributeChoice, RunSummary, SuggestionRow, UiUpdate, UserCommand};
use crate::repair::{apply_repairs, RepairCondition};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Picking which attributes to analyze.
    SelectingAttributes,
    /// Reviewing the suggestions of the current pass.
    Reviewing,
    /// All passes exhausted; only export and quit remain.
    Done,
}

/// Lazily loaded model resource. `Failed` is sticky so a missing file is
/// reported once, not once per pass.
enum ModelSlot<T> {
    Unloaded,
    Loaded(T),
    Failed,
}

impl<T> ModelSlot<T> {
    fn get(&self) -> Option<&T> {
        match self {
            ModelSlot::Loaded(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub log: EventLog,
    pub input_path: PathBuf,
    pub phase: Phase,
    /// All relevant attributes, with their selection flags.
    pub attributes: Vec<AttributeChoice>,
    /// Names of the confirmed attributes (set at ConfirmAttributes).
    pub selected: Vec<String>,
    pub pass_index: usize,
    /// Suggestions of the current pass.
    pub suggestions: Vec<RepairSuggestion>,
    /// Ids the user has accepted in the current pass.
    pub accepted: HashSet<usize>,
    pub summary: RunSummary,
    embeddings: ModelSlot<EmbeddingModel>,
    lexicon: ModelSlot<Lexicon>,
}

impl AppState {
    pub fn new(config: Config, log: EventLog, input_path: PathBuf) -> Self {
        let relevant = log.relevant_attributes(
            &config.log.ignore_attributes,
            &config.log.ignore_prefixes,
        );
        let content = log.attribute_content(&relevant);
        let attributes = relevant
            .iter()
            .map(|name| AttributeChoice {
                name: name.clone(),
                distinct_values: content.get(name).map_or(0, |c| c.len()),
                selected: true,
            })
            .collect();
        let summary = RunSummary {
            total_passes: config.passes.len(),
            ..RunSummary::default()
        };

        AppState {
            config,
            log,
            input_path,
            phase: Phase::SelectingAttributes,
            attributes,
            selected: Vec::new(),
            pass_index: 0,
            suggestions: Vec::new(),
            accepted: HashSet::new(),
            summary,
            embeddings: ModelSlot::Unloaded,
            lexicon: ModelSlot::Unloaded,
        }
    }

    // --- model loading -----------------------------------------------------

    fn ensure_embeddings(&mut self) -> bool {
        if matches!(self.embeddings, ModelSlot::Unloaded) {
            let path = self.config.models.embeddings.clone();
            self.embeddings = match EmbeddingModel::load(Path::new(&path)) {
                Ok(model) => ModelSlot::Loaded(model),
                Err(e) => {
                    warn!("embeddings unavailable: {e}");
                    ModelSlot::Failed
                }
            };
        }
        self.embeddings.get().is_some()
    }

    /// Load the lexicon on first use. Failure only disables antonym
    /// annotation, so it produces a status note rather than a skip.
    fn ensure_lexicon(&mut self, updates: &mut Vec<UiUpdate>) {
        if matches!(self.lexicon, ModelSlot::Unloaded) {
            let path = self.config.models.lexicon.clone();
            self.lexicon = match Lexicon::load(Path::new(&path)) {
                Ok(lex) => ModelSlot::Loaded(lex),
                Err(e) => {
                    warn!("lexicon unavailable, antonym annotation disabled: {e}");
                    updates.push(UiUpdate::Status(format!(
                        "antonym annotation disabled: {e}"
                    )));
                    ModelSlot::Failed
                }
            };
        }
    }

    // --- command handlers --------------------------------------------------

    pub fn toggle_attribute(&mut self, index: usize) -> Vec<UiUpdate> {
        if self.phase != Phase::SelectingAttributes {
            return vec![];
        }
        if let Some(choice) = self.attributes.get_mut(index) {
            choice.selected = !choice.selected;
        }
        vec![UiUpdate::Attributes(self.attributes.clone())]
    }

    pub fn confirm_attributes(&mut self) -> Vec<UiUpdate> {
        if self.phase != Phase::SelectingAttributes {
            return vec![];
        }
        self.selected = self
            .attributes
            .iter()
            .filter(|a| a.selected)
            .map(|a| a.name.clone())
            .collect();
        if self.selected.is_empty() {
            return vec![UiUpdate::Status(
                "select at least one attribute (space toggles)".to_string(),
            )];
        }

        info!("attributes confirmed: {:?}", self.selected);
        self.log.insert_audit_labels(&self.selected);
        self.phase = Phase::Reviewing;
        self.start_pass()
    }

    pub fn toggle_suggestion(&mut self, id: usize) -> Vec<UiUpdate> {
        if self.phase != Phase::Reviewing {
            return vec![];
        }
        if !self.suggestions.iter().any(|s| s.id == id) {
            return vec![];
        }
        let accepted = if self.accepted.remove(&id) {
            false
        } else {
            self.accepted.insert(id);
            true
        };
        vec![UiUpdate::SuggestionToggled { id, accepted }]
    }

    pub fn apply_and_advance(&mut self) -> Vec<UiUpdate> {
        if self.phase != Phase::Reviewing {
            return vec![];
        }
        let Some(pass) = self.config.passes.get(self.pass_index) else {
            return vec![];
        };
        let pass_name = pass.name.clone();

        let conditions: Vec<RepairCondition> = self
            .suggestions
            .iter()
            .filter(|s| self.accepted.contains(&s.id))
            .map(RepairCondition::from)
            .collect();

        let mut updates = Vec::new();
        if conditions.is_empty() {
            updates.push(UiUpdate::Status(format!(
                "pass `{pass_name}`: nothing accepted, advancing"
            )));
        } else {
            let accepted_count = conditions.len();
            let outcome = apply_repairs(&mut self.log, conditions, &pass_name);
            self.summary.conditions_applied += accepted_count;
            self.summary.entries_changed += outcome.entries_changed;
            self.summary.events_changed += outcome.events_changed;
            updates.push(UiUpdate::Status(format!(
                "pass `{pass_name}`: applied {accepted_count} repairs, {} values rewritten",
                outcome.entries_changed
            )));
        }

        self.advance();
        updates.push(UiUpdate::Summary(self.summary.clone()));
        updates.extend(self.start_pass());
        updates
    }

    pub fn skip_pass(&mut self) -> Vec<UiUpdate> {
        if self.phase != Phase::Reviewing {
            return vec![];
        }
        self.advance();
        let mut updates = vec![UiUpdate::Summary(self.summary.clone())];
        updates.extend(self.start_pass());
        updates
    }

    pub fn export(&self) -> Vec<UiUpdate> {
        let path = self.export_path();
        match export_log(&self.log, &path) {
            Ok(()) => {
                let shown = path.display().to_string();
                vec![
                    UiUpdate::Exported {
                        path: shown.clone(),
                    },
                    UiUpdate::Status(format!("exported {shown}")),
                ]
            }
            Err(e) => {
                warn!("export failed: {e}");
                vec![UiUpdate::Status(format!("export failed: {e}"))]
            }
        }
    }

    // --- internals -----------------------------------------------------------

    fn advance(&mut self) {
        self.pass_index += 1;
        self.summary.passes_completed = self.pass_index.min(self.config.passes.len());
        self.suggestions.clear();
        self.accepted.clear();
    }

    /// Start the pass at the cursor, skipping forward over passes that have
    /// nothing to show (no suggestions, or a semantic pass without a model).
    fn start_pass(&mut self) -> Vec<UiUpdate> {
        let mut updates = Vec::new();
        loop {
            let Some(pass) = self.config.passes.get(self.pass_index).cloned() else {
                self.phase = Phase::Done;
                updates.push(UiUpdate::PassesExhausted);
                updates.push(UiUpdate::Status(
                    "all passes done — press e to export, q to quit".to_string(),
                ));
                return updates;
            };

            let needs_model = pass.options.iter().any(|o| o != "leven");
            if needs_model && !self.ensure_embeddings() {
                updates.push(UiUpdate::Status(format!(
                    "pass `{}` skipped: embeddings unavailable ({})",
                    pass.name, self.config.models.embeddings
                )));
                self.advance();
                continue;
            }
            self.ensure_lexicon(&mut updates);

            match self.run_current_pass(&pass) {
                Ok(suggestions) if suggestions.is_empty() => {
                    updates.push(UiUpdate::Status(format!(
                        "pass `{}`: no suggestions",
                        pass.name
                    )));
                    self.advance();
                }
                Ok(suggestions) => {
                    self.suggestions = suggestions;
                    self.accepted.clear();
                    updates.push(UiUpdate::PassSuggestions {
                        pass_name: pass.name.clone(),
                        pass_index: self.pass_index,
                        total_passes: self.config.passes.len(),
                        rows: self.suggestion_rows(),
                    });
                    updates.push(UiUpdate::Status(format!(
                        "pass `{}` ({}/{}): space accepts, a applies, s skips",
                        pass.name,
                        self.pass_index + 1,
                        self.config.passes.len()
                    )));
                    return updates;
                }
                Err(e) => {
                    updates.push(UiUpdate::Status(format!(
                        "pass `{}` skipped: {e}",
                        pass.name
                    )));
                    self.advance();
                }
            }
        }
    }

    /// Re-extract attribute content (counts shift after every apply) and run
    /// the scoring pipeline for one pass.
    fn run_current_pass(
        &self,
        pass: &PassConfig,
    ) -> Result<Vec<RepairSuggestion>, crate::analysis::scorer::ScorerError> {
        let content = self.log.attribute_content(&self.selected);
        let empty = std::collections::BTreeMap::new();
        let attributes: Vec<Attribute> = self
            .selected
            .iter()
            .map(|name| {
                Attribute::from_content(
                    name,
                    content.get(name).unwrap_or(&empty),
                    self.embeddings.get(),
                )
            })
            .collect();
        run_pass(&attributes, pass, self.embeddings.get(), self.lexicon.get())
    }

    fn suggestion_rows(&self) -> Vec<SuggestionRow> {
        self.suggestions
            .iter()
            .map(|s| SuggestionRow {
                id: s.id,
                attribute: s.attribute.clone(),
                original: s.original.clone(),
                original_count: s.original_count,
                suggested: s.suggested.clone(),
                suggested_count: s.suggested_count,
                score: s.score,
                accepted: self.accepted.contains(&s.id),
                antonyms: s.antonyms.clone(),
            })
            .collect()
    }

    fn export_path(&self) -> PathBuf {
        let stem = self
            .input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log");
        let ext = self
            .input_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("xes");
        let file_name = format!("{}{stem}.{ext}", self.config.export.output_prefix);
        match self.input_path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop: receive user commands from the TUI,
/// mutate state, and push UI updates back through `ui_tx`.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("application event loop started");

    // Initial view: the attribute choices and the pass total.
    let _ = ui_tx
        .send(UiUpdate::Attributes(state.attributes.clone()))
        .await;
    let _ = ui_tx.send(UiUpdate::Summary(state.summary.clone())).await;
    let _ = ui_tx
        .send(UiUpdate::Status(
            "select attributes to analyze (space toggles, enter confirms)".to_string(),
        ))
        .await;

    while let Some(cmd) = cmd_rx.recv().await {
        let updates = match cmd {
            UserCommand::Quit => {
                info!("quit command received, shutting down");
                break;
            }
            UserCommand::ToggleAttribute(index) => state.toggle_attribute(index),
            UserCommand::ConfirmAttributes => state.confirm_attributes(),
            UserCommand::ToggleSuggestion(id) => state.toggle_suggestion(id),
            UserCommand::ApplyAndAdvance => state.apply_and_advance(),
            UserCommand::SkipPass => state.skip_pass(),
            UserCommand::Export => state.export(),
        };
        for update in updates {
            if ui_tx.send(update).await.is_err() {
                info!("UI channel closed, shutting down");
                return Ok(());
            }
        }
    }

    info!("application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, LogConfig, ModelPaths, PassConfig};
    use crate::eventlog::{AttrValue, Event, Trace};

    fn test_config(passes: Vec<PassConfig>) -> Config {
        Config {
            log: LogConfig {
                ignore_attributes: vec!["time:timestamp".into(), "id".into()],
                ignore_prefixes: vec!["correct".into(), "start".into(), "an".into()],
            },
            models: ModelPaths {
                // Intentionally nonexistent: lexical-only tests never load
                // them, semantic tests exercise the skip path.
                embeddings: "does/not/exist.txt".into(),
                lexicon: "does/not/exist.txt".into(),
            },
            export: ExportConfig {
                output_prefix: "rep_".into(),
            },
            passes,
        }
    }

    fn leven_pass(name: &str, threshold: f64) -> PassConfig {
        PassConfig {
            name: name.to_string(),
            options: vec!["leven".to_string()],
            threshold,
        }
    }

    fn semantic_pass(name: &str) -> PassConfig {
        PassConfig {
            name: name.to_string(),
            options: vec!["mean".to_string()],
            threshold: 0.7,
        }
    }

    /// A log with a frequent label and a rare misspelling of it.
    fn typo_log() -> EventLog {
        let mut log = EventLog::new();
        let mut trace = Trace::default();
        for _ in 0..5 {
            let mut event = Event::new();
            event.set("concept:name", AttrValue::String("Submit Request".into()));
            trace.events.push(event);
        }
        let mut event = Event::new();
        event.set("concept:name", AttrValue::String("Submit Reqest".into()));
        trace.events.push(event);
        log.traces.push(trace);
        log
    }

    fn state_with(passes: Vec<PassConfig>) -> AppState {
        AppState::new(test_config(passes), typo_log(), PathBuf::from("data/run.xes"))
    }

    fn statuses(updates: &[UiUpdate]) -> Vec<&str> {
        updates
            .iter()
            .filter_map(|u| match u {
                UiUpdate::Status(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_state_lists_relevant_attributes() {
        let state = state_with(vec![leven_pass("lexical", 0.5)]);
        assert_eq!(state.phase, Phase::SelectingAttributes);
        assert_eq!(state.attributes.len(), 1);
        assert_eq!(state.attributes[0].name, "concept:name");
        assert_eq!(state.attributes[0].distinct_values, 2);
        assert!(state.attributes[0].selected);
    }

    #[test]
    fn confirm_starts_first_pass_with_suggestions() {
        let mut state = state_with(vec![leven_pass("lexical", 0.5)]);
        let updates = state.confirm_attributes();

        assert_eq!(state.phase, Phase::Reviewing);
        let rows = updates
            .iter()
            .find_map(|u| match u {
                UiUpdate::PassSuggestions { rows, .. } => Some(rows),
                _ => None,
            })
            .expect("suggestions update");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].original, "Submit Reqest");
        assert_eq!(rows[0].suggested, "Submit Request");
        assert!(!rows[0].accepted);

        // Audit labels were inserted at confirmation.
        assert!(state.log.traces[0].events[0]
            .get("start:concept:name")
            .is_some());
    }

    #[test]
    fn confirm_with_nothing_selected_stays_in_selection() {
        let mut state = state_with(vec![leven_pass("lexical", 0.5)]);
        state.toggle_attribute(0);
        let updates = state.confirm_attributes();
        assert_eq!(state.phase, Phase::SelectingAttributes);
        assert!(!statuses(&updates).is_empty());
    }

    #[test]
    fn accepted_suggestion_is_applied_to_the_log() {
        let mut state = state_with(vec![leven_pass("lexical", 0.5)]);
        state.confirm_attributes();

        let id = state.suggestions[0].id;
        let updates = state.toggle_suggestion(id);
        assert_eq!(
            updates,
            vec![UiUpdate::SuggestionToggled { id, accepted: true }]
        );

        let updates = state.apply_and_advance();
        assert_eq!(state.summary.entries_changed, 1);
        assert_eq!(state.summary.conditions_applied, 1);

        // Single pass, so the run is over.
        assert_eq!(state.phase, Phase::Done);
        assert!(updates.contains(&UiUpdate::PassesExhausted));

        // Every event now carries the frequent spelling.
        for event in &state.log.traces[0].events {
            assert_eq!(
                event.get("concept:name"),
                Some(&AttrValue::String("Submit Request".into()))
            );
        }
    }

    #[test]
    fn second_identical_pass_has_nothing_left_to_find() {
        let mut state = state_with(vec![
            leven_pass("first", 0.5),
            leven_pass("second", 0.5),
        ]);
        state.confirm_attributes();
        let id = state.suggestions[0].id;
        state.toggle_suggestion(id);
        let updates = state.apply_and_advance();

        // The typo is gone, so the second pass is skipped as empty.
        assert_eq!(state.phase, Phase::Done);
        assert!(statuses(&updates)
            .iter()
            .any(|s| s.contains("second") && s.contains("no suggestions")));
    }

    #[test]
    fn skip_pass_applies_nothing() {
        let mut state = state_with(vec![leven_pass("lexical", 0.5)]);
        state.confirm_attributes();
        let id = state.suggestions[0].id;
        state.toggle_suggestion(id);
        state.skip_pass();

        assert_eq!(state.summary.entries_changed, 0);
        assert_eq!(
            state.log.traces[0].events[5].get("concept:name"),
            Some(&AttrValue::String("Submit Reqest".into()))
        );
    }

    #[test]
    fn semantic_pass_without_model_is_skipped() {
        let mut state = state_with(vec![
            semantic_pass("semantic"),
            leven_pass("lexical", 0.5),
        ]);
        let updates = state.confirm_attributes();

        // The semantic pass reports the missing model and the lexical pass
        // still produces its suggestion.
        assert!(statuses(&updates)
            .iter()
            .any(|s| s.contains("semantic") && s.contains("embeddings unavailable")));
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.phase, Phase::Reviewing);
    }

    #[test]
    fn toggle_twice_returns_to_unaccepted() {
        let mut state = state_with(vec![leven_pass("lexical", 0.5)]);
        state.confirm_attributes();
        let id = state.suggestions[0].id;
        state.toggle_suggestion(id);
        let updates = state.toggle_suggestion(id);
        assert_eq!(
            updates,
            vec![UiUpdate::SuggestionToggled {
                id,
                accepted: false
            }]
        );
        assert!(state.accepted.is_empty());
    }

    #[test]
    fn export_path_uses_prefix_and_input_extension() {
        let state = state_with(vec![leven_pass("lexical", 0.5)]);
        assert_eq!(state.export_path(), PathBuf::from("data/rep_run.xes"));
    }

    #[tokio::test]
    async fn run_loop_pushes_initial_view_and_stops_on_quit() {
        let state = state_with(vec![leven_pass("lexical", 0.5)]);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));

        let first = ui_rx.recv().await.expect("initial update");
        assert!(matches!(first, UiUpdate::Attributes(_)));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();
    }
}
