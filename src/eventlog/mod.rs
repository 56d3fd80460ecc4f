// Event log object model: traces containing ordered events, each event a
// mapping of attribute name to typed value.
//
// Also hosts the log-level preparation steps that run before analysis:
// attribute scanning and relevance filtering, per-attribute frequency
// extraction, and audit-label insertion.

pub mod csvlog;
pub mod xes;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LogIoError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("XES error in {path}: {message}")]
    Xes { path: String, message: String },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("CSV log {path} has no `{column}` column for trace grouping")]
    MissingCaseColumn { path: String, column: String },

    #[error("unsupported log format: {path} (expected .xes or .csv)")]
    UnsupportedFormat { path: String },
}

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

/// A typed event/trace/log attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
}

impl AttrValue {
    /// The string payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value the way it is written to XES/CSV output.
    pub fn render(&self) -> String {
        match self {
            AttrValue::String(s) => s.clone(),
            AttrValue::Int(i) => i.to_string(),
            AttrValue::Float(f) => f.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Log structure
// ---------------------------------------------------------------------------

/// A single event: an ordered mapping of attribute name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Event {
    pub fn new() -> Self {
        Event::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.attributes.insert(key.into(), value);
    }
}

/// A trace: trace-level attributes plus an ordered sequence of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub attributes: BTreeMap<String, AttrValue>,
    pub events: Vec<Event>,
}

/// The full event log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    pub attributes: BTreeMap<String, AttrValue>,
    pub traces: Vec<Trace>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }

    /// Total number of events across all traces.
    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }

    /// All distinct attribute keys that appear on any event.
    pub fn event_attribute_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for trace in &self.traces {
            for event in &trace.events {
                for key in event.attributes.keys() {
                    if !keys.contains(key) {
                        keys.insert(key.clone());
                    }
                }
            }
        }
        keys
    }

    /// First value observed for the given event attribute, if any.
    fn first_event_value(&self, key: &str) -> Option<&AttrValue> {
        self.traces
            .iter()
            .flat_map(|t| t.events.iter())
            .find_map(|e| e.get(key))
    }

    /// Attributes that are worth analyzing: string-valued, not numeric text,
    /// not date text, and not excluded by key or key prefix.
    ///
    /// The prefix is the segment before the first `:` — audit attributes from
    /// earlier runs (`start:`, `an:`) and evaluation markers (`correct:`)
    /// must never be re-analyzed.
    pub fn relevant_attributes(
        &self,
        ignore_keys: &[String],
        ignore_prefixes: &[String],
    ) -> Vec<String> {
        let mut relevant = Vec::new();
        let mut stripped = Vec::new();

        for key in self.event_attribute_keys() {
            if ignore_keys.iter().any(|k| k == &key) {
                stripped.push(key);
                continue;
            }
            let prefix = key.split(':').next().unwrap_or("");
            if ignore_prefixes.iter().any(|p| p == prefix) {
                stripped.push(key);
                continue;
            }
            match self.first_event_value(&key) {
                Some(AttrValue::String(s)) if !is_numeric(s) && !is_date(s) => {
                    relevant.push(key);
                }
                _ => stripped.push(key),
            }
        }

        info!(
            "attribute scan: {} relevant, {} stripped ({:?})",
            relevant.len(),
            stripped.len(),
            stripped
        );
        relevant
    }

    /// Distinct string values with occurrence counts for each selected
    /// attribute. Values are trimmed; empty strings and `nan` placeholders
    /// (introduced by upstream augmentation tooling) are dropped, as are
    /// non-string values on mixed-type attributes.
    pub fn attribute_content(
        &self,
        selected: &[String],
    ) -> BTreeMap<String, BTreeMap<String, u64>> {
        let mut content: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for attr in selected {
            content.insert(attr.clone(), BTreeMap::new());
        }

        for trace in &self.traces {
            for event in &trace.events {
                for attr in selected {
                    let Some(AttrValue::String(raw)) = event.get(attr) else {
                        continue;
                    };
                    let value = raw.trim();
                    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
                        continue;
                    }
                    if let Some(counts) = content.get_mut(attr) {
                        *counts.entry(value.to_string()).or_insert(0) += 1;
                    }
                }
            }
        }

        content
    }

    /// Trim the selected attributes in place and record the pre-repair value
    /// as `start:<attr>` on each event, so the effect of repairs can be
    /// audited later. The `start:` marker is only written once — re-running
    /// on an already-prepared log leaves existing markers untouched.
    pub fn insert_audit_labels(&mut self, selected: &[String]) {
        let mut marked = 0usize;
        for trace in &mut self.traces {
            for event in &mut trace.events {
                for attr in selected {
                    let Some(AttrValue::String(raw)) = event.get(attr) else {
                        continue;
                    };
                    let trimmed = raw.trim().to_string();
                    event.set(attr.clone(), AttrValue::String(trimmed.clone()));

                    let marker = format!("start:{attr}");
                    if !event.attributes.contains_key(&marker) {
                        event.set(marker, AttrValue::String(trimmed));
                        marked += 1;
                    }
                }
            }
        }
        info!("audit labels inserted on {marked} event attributes");
    }
}

// ---------------------------------------------------------------------------
// Import/export dispatch
// ---------------------------------------------------------------------------

/// Import an event log, dispatching on the file extension.
pub fn import_log(path: &Path) -> Result<EventLog, LogIoError> {
    let started = std::time::Instant::now();
    let log = match extension_of(path) {
        Some("xes") => xes::import(path),
        Some("csv") => csvlog::import(path),
        _ => Err(LogIoError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }?;
    info!(
        "imported {} ({} traces, {} events) in {:?}",
        path.display(),
        log.traces.len(),
        log.event_count(),
        started.elapsed()
    );
    Ok(log)
}

/// Export an event log, dispatching on the file extension.
pub fn export_log(log: &EventLog, path: &Path) -> Result<(), LogIoError> {
    let started = std::time::Instant::now();
    match extension_of(path) {
        Some("xes") => xes::export(log, path),
        Some("csv") => csvlog::export(log, path),
        _ => Err(LogIoError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }?;
    info!("exported {} in {:?}", path.display(), started.elapsed());
    Ok(())
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

// ---------------------------------------------------------------------------
// Value classification helpers
// ---------------------------------------------------------------------------

/// Returns true if the string parses as a number (labels like "42" carry no
/// lexical signal). Requires a digit: the float parser also accepts words
/// like "nan", "inf", and "Infinity", which are labels here, not numbers.
pub fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    s.chars().any(|c| c.is_ascii_digit()) && s.parse::<f64>().is_ok()
}

/// Returns true if the string can be interpreted as a date or timestamp in
/// any of the formats the supported log formats produce.
pub fn is_date(s: &str) -> bool {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(pairs: &[(&str, AttrValue)]) -> Event {
        let mut event = Event::new();
        for (k, v) in pairs {
            event.set(*k, v.clone());
        }
        event
    }

    fn str_event(pairs: &[(&str, &str)]) -> Event {
        let mut event = Event::new();
        for (k, v) in pairs {
            event.set(*k, AttrValue::String((*v).to_string()));
        }
        event
    }

    fn log_with_events(events: Vec<Event>) -> EventLog {
        let mut log = EventLog::new();
        log.traces.push(Trace {
            attributes: BTreeMap::new(),
            events,
        });
        log
    }

    // ---- value classification ----

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("42"));
        assert!(is_numeric("  3.14 "));
        assert!(is_numeric("-7"));
        assert!(is_numeric("1e3"));
        assert!(!is_numeric("Submit Request"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("4 apples"));
        // Float-parseable words are still labels.
        assert!(!is_numeric("nan"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("Infinity"));
    }

    #[test]
    fn date_detection() {
        assert!(is_date("2024-03-01T10:30:00+00:00"));
        assert!(is_date("2024-03-01 10:30:00"));
        assert!(is_date("2024-03-01"));
        assert!(!is_date("Submit Request"));
        assert!(!is_date("request 2024"));
    }

    // ---- attribute scanning ----

    #[test]
    fn event_attribute_keys_collects_all() {
        let log = log_with_events(vec![
            str_event(&[("concept:name", "A"), ("org:resource", "alice")]),
            str_event(&[("concept:name", "B"), ("lifecycle:transition", "complete")]),
        ]);
        let keys = log.event_attribute_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("concept:name"));
        assert!(keys.contains("org:resource"));
        assert!(keys.contains("lifecycle:transition"));
    }

    #[test]
    fn relevant_attributes_keeps_string_labels() {
        let log = log_with_events(vec![event_with(&[
            ("concept:name", AttrValue::String("Submit Request".into())),
            ("org:resource", AttrValue::String("alice".into())),
            ("amount", AttrValue::Float(12.5)),
        ])]);
        let relevant = log.relevant_attributes(&[], &[]);
        assert_eq!(relevant, vec!["concept:name", "org:resource"]);
    }

    #[test]
    fn relevant_attributes_strips_numeric_and_date_strings() {
        let log = log_with_events(vec![str_event(&[
            ("concept:name", "Submit Request"),
            ("case_id", "10423"),
            ("registered", "2024-03-01"),
        ])]);
        let relevant = log.relevant_attributes(&[], &[]);
        assert_eq!(relevant, vec!["concept:name"]);
    }

    #[test]
    fn relevant_attributes_keeps_float_parseable_words() {
        let log = log_with_events(vec![str_event(&[
            ("severity", "Infinity"),
            ("status", "nan"),
        ])]);
        let relevant = log.relevant_attributes(&[], &[]);
        assert_eq!(relevant, vec!["severity", "status"]);
    }

    #[test]
    fn relevant_attributes_strips_excluded_keys_and_prefixes() {
        let log = log_with_events(vec![str_event(&[
            ("concept:name", "Submit Request"),
            ("id", "row-eight"),
            ("start:concept:name", "Submit Request"),
            ("an:0:concept:name", "Submit Request"),
            ("correct:concept:name", "Submit Request"),
        ])]);
        let relevant = log.relevant_attributes(
            &["id".to_string()],
            &["correct".to_string(), "start".to_string(), "an".to_string()],
        );
        assert_eq!(relevant, vec!["concept:name"]);
    }

    // ---- attribute content ----

    #[test]
    fn attribute_content_counts_and_trims() {
        let log = log_with_events(vec![
            str_event(&[("concept:name", "Submit Request")]),
            str_event(&[("concept:name", "  Submit Request ")]),
            str_event(&[("concept:name", "Submit Reqest")]),
        ]);
        let content = log.attribute_content(&["concept:name".to_string()]);
        let counts = &content["concept:name"];
        assert_eq!(counts.get("Submit Request"), Some(&2));
        assert_eq!(counts.get("Submit Reqest"), Some(&1));
    }

    #[test]
    fn attribute_content_drops_empty_and_nan() {
        let log = log_with_events(vec![
            str_event(&[("concept:name", "")]),
            str_event(&[("concept:name", "   ")]),
            str_event(&[("concept:name", "nan")]),
            str_event(&[("concept:name", "NaN")]),
            str_event(&[("concept:name", "Real Label")]),
        ]);
        let content = log.attribute_content(&["concept:name".to_string()]);
        let counts = &content["concept:name"];
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("Real Label"), Some(&1));
    }

    #[test]
    fn attribute_content_ignores_non_string_values() {
        let log = log_with_events(vec![
            event_with(&[("concept:name", AttrValue::Bool(true))]),
            event_with(&[("concept:name", AttrValue::String("Check".into()))]),
        ]);
        let content = log.attribute_content(&["concept:name".to_string()]);
        assert_eq!(content["concept:name"].len(), 1);
    }

    // ---- audit labels ----

    #[test]
    fn insert_audit_labels_trims_and_marks_once() {
        let mut log = log_with_events(vec![str_event(&[("concept:name", "  Submit Request ")])]);
        let selected = vec!["concept:name".to_string()];
        log.insert_audit_labels(&selected);

        let event = &log.traces[0].events[0];
        assert_eq!(
            event.get("concept:name"),
            Some(&AttrValue::String("Submit Request".into()))
        );
        assert_eq!(
            event.get("start:concept:name"),
            Some(&AttrValue::String("Submit Request".into()))
        );

        // Simulate a repair, then re-insert: the start marker must survive.
        let mut log2 = log.clone();
        log2.traces[0].events[0].set("concept:name", AttrValue::String("Changed".into()));
        log2.insert_audit_labels(&selected);
        assert_eq!(
            log2.traces[0].events[0].get("start:concept:name"),
            Some(&AttrValue::String("Submit Request".into()))
        );
    }

    #[test]
    fn insert_audit_labels_skips_missing_attribute() {
        let mut log = log_with_events(vec![str_event(&[("org:resource", "alice")])]);
        log.insert_audit_labels(&["concept:name".to_string()]);
        let event = &log.traces[0].events[0];
        assert!(event.get("start:concept:name").is_none());
    }

    // ---- dispatch ----

    #[test]
    fn import_rejects_unknown_extension() {
        let err = import_log(Path::new("log.txt")).unwrap_err();
        assert!(matches!(err, LogIoError::UnsupportedFormat { .. }));
    }

    #[test]
    fn event_count_sums_traces() {
        let mut log = EventLog::new();
        log.traces.push(Trace {
            attributes: BTreeMap::new(),
            events: vec![Event::new(), Event::new()],
        });
        log.traces.push(Trace {
            attributes: BTreeMap::new(),
            events: vec![Event::new()],
        });
        assert_eq!(log.event_count(), 3);
    }
}
