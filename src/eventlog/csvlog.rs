// CSV import/export for event logs.
//
// One row per event. Trace grouping follows the process-mining interop
// convention: columns prefixed `case:` are trace attributes, and
// `case:concept:name` is the trace identifier. Traces keep their first-seen
// order; events keep file order within a trace.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use tracing::warn;

use super::{xes::parse_timestamp, AttrValue, Event, EventLog, LogIoError, Trace};

const CASE_PREFIX: &str = "case:";
const CASE_ID_COLUMN: &str = "case:concept:name";

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

pub fn import(path: &Path) -> Result<EventLog, LogIoError> {
    let file = std::fs::File::open(path).map_err(|e| LogIoError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    import_from_reader(file, &path.display().to_string())
}

/// Parse a CSV log from any reader. Split out from `import` so tests can
/// feed in-memory data.
pub fn import_from_reader<R: Read>(reader: R, path: &str) -> Result<EventLog, LogIoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| LogIoError::Csv {
            path: path.to_string(),
            source: e,
        })?
        .clone();

    let case_col = headers
        .iter()
        .position(|h| h == CASE_ID_COLUMN)
        .ok_or_else(|| LogIoError::MissingCaseColumn {
            path: path.to_string(),
            column: CASE_ID_COLUMN.to_string(),
        })?;

    let mut log = EventLog::new();
    let mut trace_index: Vec<String> = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed CSV row {}: {e}", row_idx + 2);
                skipped += 1;
                continue;
            }
        };

        let Some(case_id) = record.get(case_col).map(str::trim).filter(|s| !s.is_empty())
        else {
            warn!("skipping CSV row {} with empty case id", row_idx + 2);
            skipped += 1;
            continue;
        };

        let trace_pos = match trace_index.iter().position(|id| id == case_id) {
            Some(pos) => pos,
            None => {
                let mut trace = Trace::default();
                for (header, cell) in headers.iter().zip(record.iter()) {
                    if let Some(stripped) = header.strip_prefix(CASE_PREFIX) {
                        if !cell.trim().is_empty() {
                            trace
                                .attributes
                                .insert(stripped.to_string(), infer_value(cell.trim()));
                        }
                    }
                }
                trace_index.push(case_id.to_string());
                log.traces.push(trace);
                log.traces.len() - 1
            }
        };

        let mut event = Event::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.starts_with(CASE_PREFIX) {
                continue;
            }
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            event.set(header, infer_value(cell));
        }
        log.traces[trace_pos].events.push(event);
    }

    if skipped > 0 {
        warn!("CSV import skipped {skipped} rows");
    }
    Ok(log)
}

/// Infer the attribute type from the cell text. Leading zeros stay strings
/// so identifiers like "007" are not mangled.
fn infer_value(cell: &str) -> AttrValue {
    if cell == "true" || cell == "false" {
        return AttrValue::Bool(cell == "true");
    }
    if let Ok(i) = cell.parse::<i64>() {
        if i.to_string() == cell {
            return AttrValue::Int(i);
        }
    }
    if let Ok(f) = cell.parse::<f64>() {
        if cell.chars().any(|c| c == '.' || c == 'e' || c == 'E') {
            return AttrValue::Float(f);
        }
    }
    if let Some(ts) = parse_timestamp(cell) {
        return AttrValue::Timestamp(ts);
    }
    AttrValue::String(cell.to_string())
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export(log: &EventLog, path: &Path) -> Result<(), LogIoError> {
    let file = std::fs::File::create(path).map_err(|e| LogIoError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    export_to_writer(log, file, &path.display().to_string())
}

/// Write the log as CSV to any writer. Trace attributes are flattened back
/// into `case:`-prefixed columns.
pub fn export_to_writer<W: Write>(
    log: &EventLog,
    writer: W,
    path: &str,
) -> Result<(), LogIoError> {
    let mut trace_keys: BTreeSet<String> = BTreeSet::new();
    let mut event_keys: BTreeSet<String> = BTreeSet::new();
    for trace in &log.traces {
        for key in trace.attributes.keys() {
            trace_keys.insert(key.clone());
        }
        for event in &trace.events {
            for key in event.attributes.keys() {
                event_keys.insert(key.clone());
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    let to_csv_err = |e: csv::Error| LogIoError::Csv {
        path: path.to_string(),
        source: e,
    };

    let mut header: Vec<String> = trace_keys
        .iter()
        .map(|k| format!("{CASE_PREFIX}{k}"))
        .collect();
    header.extend(event_keys.iter().cloned());
    csv_writer.write_record(&header).map_err(to_csv_err)?;

    for trace in &log.traces {
        for event in &trace.events {
            let mut row: Vec<String> = Vec::with_capacity(header.len());
            for key in &trace_keys {
                row.push(
                    trace
                        .attributes
                        .get(key)
                        .map(AttrValue::render)
                        .unwrap_or_default(),
                );
            }
            for key in &event_keys {
                row.push(event.get(key).map(AttrValue::render).unwrap_or_default());
            }
            csv_writer.write_record(&row).map_err(to_csv_err)?;
        }
    }

    csv_writer.flush().map_err(|e| LogIoError::Io {
        path: path.to_string(),
        source: e,
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
case:concept:name,case:channel,concept:name,org:resource,amount,approved,time:timestamp
case-1,web,Submit Request,alice,12.5,true,2024-03-01T10:30:00+00:00
case-1,web,Check Request,bob,12.5,false,2024-03-01T11:00:00+00:00
case-2,phone,Submit Request,alice,7,true,2024-03-02T09:00:00+00:00
";

    #[test]
    fn groups_rows_into_traces() {
        let log = import_from_reader(SAMPLE.as_bytes(), "test.csv").unwrap();
        assert_eq!(log.traces.len(), 2);
        assert_eq!(log.traces[0].events.len(), 2);
        assert_eq!(log.traces[1].events.len(), 1);
        assert_eq!(
            log.traces[0].attributes.get("concept:name"),
            Some(&AttrValue::String("case-1".into()))
        );
        assert_eq!(
            log.traces[0].attributes.get("channel"),
            Some(&AttrValue::String("web".into()))
        );
    }

    #[test]
    fn infers_value_types() {
        let log = import_from_reader(SAMPLE.as_bytes(), "test.csv").unwrap();
        let event = &log.traces[0].events[0];
        assert_eq!(
            event.get("concept:name"),
            Some(&AttrValue::String("Submit Request".into()))
        );
        assert_eq!(event.get("amount"), Some(&AttrValue::Float(12.5)));
        assert_eq!(event.get("approved"), Some(&AttrValue::Bool(true)));
        assert!(matches!(
            event.get("time:timestamp"),
            Some(AttrValue::Timestamp(_))
        ));

        let event = &log.traces[1].events[0];
        assert_eq!(event.get("amount"), Some(&AttrValue::Int(7)));
    }

    #[test]
    fn leading_zero_ids_stay_strings() {
        assert_eq!(infer_value("007"), AttrValue::String("007".into()));
        assert_eq!(infer_value("7"), AttrValue::Int(7));
    }

    #[test]
    fn skips_rows_with_empty_case_id() {
        let text = "\
case:concept:name,concept:name
case-1,Submit Request
,Orphan Event
case-1,Check Request
";
        let log = import_from_reader(text.as_bytes(), "test.csv").unwrap();
        assert_eq!(log.traces.len(), 1);
        assert_eq!(log.traces[0].events.len(), 2);
    }

    #[test]
    fn missing_case_column_is_an_error() {
        let text = "concept:name\nSubmit Request\n";
        let err = import_from_reader(text.as_bytes(), "test.csv").unwrap_err();
        assert!(matches!(err, LogIoError::MissingCaseColumn { .. }));
    }

    #[test]
    fn roundtrip_preserves_events() {
        let log = import_from_reader(SAMPLE.as_bytes(), "test.csv").unwrap();
        let mut buffer = Vec::new();
        export_to_writer(&log, &mut buffer, "out.csv").unwrap();
        let reparsed =
            import_from_reader(std::io::Cursor::new(buffer), "out.csv").unwrap();
        assert_eq!(log.traces.len(), reparsed.traces.len());
        assert_eq!(
            log.traces[0].events[0].get("concept:name"),
            reparsed.traces[0].events[0].get("concept:name")
        );
        assert_eq!(
            log.traces[0].events[0].get("amount"),
            reparsed.traces[0].events[0].get("amount")
        );
    }
}
