// Applying an accepted batch of repairs to the log.
//
// Conditions are applied lowest-frequency first (suggested count, then
// original count), so chained repairs aggregate toward the most frequent
// spelling: if `Reqest` → `Request` runs before `Request` → `request`,
// the first batch's output is picked up by the second condition.

use std::collections::HashSet;

use tracing::info;

use crate::analysis::suggest::RepairSuggestion;
use crate::eventlog::{AttrValue, EventLog};

/// One accepted rewrite: every event whose attribute equals `original`
/// exactly gets `suggested` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairCondition {
    pub attribute: String,
    pub original: String,
    pub original_count: u64,
    pub suggested: String,
    pub suggested_count: u64,
}

impl From<&RepairSuggestion> for RepairCondition {
    fn from(s: &RepairSuggestion) -> Self {
        RepairCondition {
            attribute: s.attribute.clone(),
            original: s.original.clone(),
            original_count: s.original_count,
            suggested: s.suggested.clone(),
            suggested_count: s.suggested_count,
        }
    }
}

/// What a batch application did to the log.
#[derive(Debug, Clone, Default)]
pub struct RepairOutcome {
    /// Attribute values rewritten, across all conditions.
    pub entries_changed: usize,
    /// Distinct events touched by at least one rewrite.
    pub events_changed: usize,
    /// Per-condition rewrite counts, in application order.
    pub applied: Vec<(RepairCondition, usize)>,
}

/// Apply the accepted conditions to the log. Each changed event gets an
/// `an:<pass>:<attr>` audit attribute recording the new value; the log
/// itself gets a per-pass summary attribute.
pub fn apply_repairs(
    log: &mut EventLog,
    mut conditions: Vec<RepairCondition>,
    pass_name: &str,
) -> RepairOutcome {
    conditions.sort_by_key(|c| (c.suggested_count, c.original_count));

    let mut outcome = RepairOutcome::default();
    let mut touched: HashSet<(usize, usize)> = HashSet::new();

    for condition in conditions {
        let audit_key = format!("an:{pass_name}:{}", condition.attribute);
        let mut changed = 0usize;

        for (t_idx, trace) in log.traces.iter_mut().enumerate() {
            for (e_idx, event) in trace.events.iter_mut().enumerate() {
                let matches = event
                    .get(&condition.attribute)
                    .and_then(AttrValue::as_str)
                    .is_some_and(|v| v == condition.original);
                if !matches {
                    continue;
                }
                event.set(
                    condition.attribute.clone(),
                    AttrValue::String(condition.suggested.clone()),
                );
                event.set(
                    audit_key.clone(),
                    AttrValue::String(condition.suggested.clone()),
                );
                changed += 1;
                touched.insert((t_idx, e_idx));
            }
        }

        info!(
            "pass `{pass_name}`: `{}` -> `{}` on {} rewrote {changed} events",
            condition.original, condition.suggested, condition.attribute
        );
        outcome.entries_changed += changed;
        outcome.applied.push((condition, changed));
    }

    outcome.events_changed = touched.len();
    log.attributes.insert(
        format!("repair:{pass_name}"),
        AttrValue::String(format!(
            "entries={} events={}",
            outcome.entries_changed, outcome.events_changed
        )),
    );
    info!(
        "pass `{pass_name}`: {} entries changed across {} events",
        outcome.entries_changed, outcome.events_changed
    );
    outcome
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::eventlog::{Event, Trace};

    fn condition(
        attribute: &str,
        original: &str,
        original_count: u64,
        suggested: &str,
        suggested_count: u64,
    ) -> RepairCondition {
        RepairCondition {
            attribute: attribute.to_string(),
            original: original.to_string(),
            original_count,
            suggested: suggested.to_string(),
            suggested_count,
        }
    }

    fn log_of(names: &[&str]) -> EventLog {
        let mut log = EventLog::new();
        let mut trace = Trace::default();
        for name in names {
            let mut event = Event::new();
            event.set("concept:name", AttrValue::String((*name).to_string()));
            trace.events.push(event);
        }
        log.traces.push(trace);
        log
    }

    #[test]
    fn rewrites_matching_events_with_audit_attr() {
        let mut log = log_of(&["Submit Reqest", "Submit Request", "Submit Reqest"]);
        let outcome = apply_repairs(
            &mut log,
            vec![condition("concept:name", "Submit Reqest", 2, "Submit Request", 1)],
            "lexical",
        );

        assert_eq!(outcome.entries_changed, 2);
        assert_eq!(outcome.events_changed, 2);
        for event in &log.traces[0].events {
            assert_eq!(
                event.get("concept:name"),
                Some(&AttrValue::String("Submit Request".into()))
            );
        }
        // Only the rewritten events carry the audit attribute.
        let audited: Vec<bool> = log.traces[0]
            .events
            .iter()
            .map(|e| e.get("an:lexical:concept:name").is_some())
            .collect();
        assert_eq!(audited, vec![true, false, true]);
    }

    #[test]
    fn exact_match_only() {
        let mut log = log_of(&["Submit Reqest Now"]);
        let outcome = apply_repairs(
            &mut log,
            vec![condition("concept:name", "Submit Reqest", 1, "Submit Request", 2)],
            "lexical",
        );
        assert_eq!(outcome.entries_changed, 0);
        assert_eq!(
            log.traces[0].events[0].get("concept:name"),
            Some(&AttrValue::String("Submit Reqest Now".into()))
        );
    }

    #[test]
    fn conditions_chain_lowest_frequency_first() {
        // `Reqest` (1 occurrence) folds into `Request` (3), and that batch
        // then folds into `request` (10) by the second condition.
        let mut log = log_of(&["Reqest", "Request", "Request", "Request", "request"]);
        let conditions = vec![
            condition("concept:name", "Request", 3, "request", 10),
            condition("concept:name", "Reqest", 1, "Request", 3),
        ];
        let outcome = apply_repairs(&mut log, conditions, "lexical");

        // Reqest->Request runs first (suggested_count 3 < 10).
        assert_eq!(outcome.applied[0].0.original, "Reqest");
        assert_eq!(outcome.entries_changed, 5);
        for event in &log.traces[0].events {
            let name = event.get("concept:name").unwrap().as_str().unwrap();
            if event.get("an:lexical:concept:name").is_some() {
                assert_eq!(name, "request");
            }
        }
        let request_count = log.traces[0]
            .events
            .iter()
            .filter(|e| e.get("concept:name").unwrap().as_str() == Some("request"))
            .count();
        assert_eq!(request_count, 5);
    }

    #[test]
    fn untouched_attributes_survive() {
        let mut log = EventLog::new();
        let mut trace = Trace::default();
        let mut event = Event::new();
        event.set("concept:name", AttrValue::String("Submit Reqest".into()));
        event.set("org:resource", AttrValue::String("alice".into()));
        event.set("position", AttrValue::Int(4));
        trace.events.push(event);
        log.traces.push(trace);

        apply_repairs(
            &mut log,
            vec![condition("concept:name", "Submit Reqest", 1, "Submit Request", 2)],
            "lexical",
        );

        let event = &log.traces[0].events[0];
        assert_eq!(
            event.get("org:resource"),
            Some(&AttrValue::String("alice".into()))
        );
        assert_eq!(event.get("position"), Some(&AttrValue::Int(4)));
    }

    #[test]
    fn writes_log_level_summary() {
        let mut log = log_of(&["Reqest", "Request"]);
        apply_repairs(
            &mut log,
            vec![condition("concept:name", "Reqest", 1, "Request", 1)],
            "lexical",
        );
        let summary: BTreeMap<_, _> = log.attributes.clone().into_iter().collect();
        assert_eq!(
            summary.get("repair:lexical"),
            Some(&AttrValue::String("entries=1 events=1".into()))
        );
    }
}
