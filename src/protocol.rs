// Message types shared between the application loop and the TUI.

// ---------------------------------------------------------------------------
// TUI -> App commands
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the application event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Toggle the attribute at the given list index during selection.
    ToggleAttribute(usize),
    /// Lock in the attribute selection and start the first analysis pass.
    ConfirmAttributes,
    /// Toggle acceptance of the suggestion with the given id.
    ToggleSuggestion(usize),
    /// Apply the accepted suggestions and advance to the next pass.
    ApplyAndAdvance,
    /// Advance to the next pass without applying anything.
    SkipPass,
    /// Write the repaired log next to the input file.
    Export,
    Quit,
}

// ---------------------------------------------------------------------------
// App -> TUI updates
// ---------------------------------------------------------------------------

/// One row of the attribute-selection list.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChoice {
    pub name: String,
    pub distinct_values: usize,
    pub selected: bool,
}

/// One row of the suggestion-review table.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRow {
    pub id: usize,
    pub attribute: String,
    pub original: String,
    pub original_count: u64,
    pub suggested: String,
    pub suggested_count: u64,
    pub score: f64,
    pub accepted: bool,
    /// Antonym token pairs between the two labels; non-empty rows are
    /// rendered with a conflict marker.
    pub antonyms: Vec<(String, String)>,
}

/// Running totals across applied passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub passes_completed: usize,
    pub total_passes: usize,
    pub conditions_applied: usize,
    pub entries_changed: usize,
    pub events_changed: usize,
}

/// Updates pushed from the application loop to the TUI render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Attribute-selection phase: the current choice list.
    Attributes(Vec<AttributeChoice>),
    /// Review phase: the suggestions of the current pass.
    PassSuggestions {
        pass_name: String,
        pass_index: usize,
        total_passes: usize,
        rows: Vec<SuggestionRow>,
    },
    /// A suggestion's acceptance flag changed.
    SuggestionToggled { id: usize, accepted: bool },
    /// Totals after an apply.
    Summary(RunSummary),
    /// Status line text (progress, errors, hints).
    Status(String),
    /// All passes done; review is over.
    PassesExhausted,
    /// The repaired log was written.
    Exported { path: String },
}
