// XES import/export on top of quick-xml.
//
// Supports the subset the repair workflow touches: log/trace/event nesting
// with `string`, `date`, `int`, `float`, and `boolean` attributes. Nested
// container attributes and extension/classifier declarations are passed over
// on read and not emitted on write.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::{BytesDecl, BytesStart, Event as XmlEvent};
use quick_xml::{Reader, Writer};
use tracing::warn;

use super::{AttrValue, Event, EventLog, LogIoError, Trace};

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

pub fn import(path: &Path) -> Result<EventLog, LogIoError> {
    let text = std::fs::read_to_string(path).map_err(|e| LogIoError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_str(&text).map_err(|message| LogIoError::Xes {
        path: path.display().to_string(),
        message,
    })
}

fn parse_str(text: &str) -> Result<EventLog, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut log = EventLog::new();
    let mut current_trace: Option<Trace> = None;
    let mut current_event: Option<Event> = None;
    let mut saw_log = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"log" => saw_log = true,
                b"trace" => current_trace = Some(Trace::default()),
                b"event" => current_event = Some(Event::new()),
                tag if is_attr_tag(tag) => {
                    // Container form of an attribute: record the key/value,
                    // skip any nested children.
                    record_attr(&e, tag, &mut log, &mut current_trace, &mut current_event)?;
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| err.to_string())?;
                }
                _ => {
                    // Unknown element (extension, classifier, list...) — skip.
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| err.to_string())?;
                }
            },
            XmlEvent::Empty(e) => {
                let name = e.name();
                let tag = name.as_ref();
                if is_attr_tag(tag) {
                    record_attr(&e, tag, &mut log, &mut current_trace, &mut current_event)?;
                }
            }
            XmlEvent::End(e) => match e.name().as_ref() {
                b"event" => {
                    if let (Some(trace), Some(event)) = (current_trace.as_mut(), current_event.take())
                    {
                        trace.events.push(event);
                    }
                }
                b"trace" => {
                    if let Some(trace) = current_trace.take() {
                        log.traces.push(trace);
                    }
                }
                _ => {}
            },
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    if !saw_log {
        return Err("no <log> element found".to_string());
    }
    Ok(log)
}

fn is_attr_tag(tag: &[u8]) -> bool {
    matches!(tag, b"string" | b"date" | b"int" | b"float" | b"boolean")
}

fn record_attr(
    element: &BytesStart,
    tag: &[u8],
    log: &mut EventLog,
    current_trace: &mut Option<Trace>,
    current_event: &mut Option<Event>,
) -> Result<(), String> {
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let text = attr.unescape_value().map_err(|e| e.to_string())?.to_string();
        match attr.key.as_ref() {
            b"key" => key = Some(text),
            b"value" => value = Some(text),
            _ => {}
        }
    }
    let (Some(key), Some(value)) = (key, value) else {
        // pm4py tolerates malformed attribute tags; so do we.
        warn!("skipping attribute element without key/value");
        return Ok(());
    };

    let parsed = parse_typed(tag, &key, value);
    if let Some(event) = current_event.as_mut() {
        event.set(key, parsed);
    } else if let Some(trace) = current_trace.as_mut() {
        trace.attributes.insert(key, parsed);
    } else {
        log.attributes.insert(key, parsed);
    }
    Ok(())
}

/// Parse the attribute payload according to its XES tag. Unparseable values
/// fall back to strings rather than failing the whole import.
fn parse_typed(tag: &[u8], key: &str, value: String) -> AttrValue {
    match tag {
        b"int" => match value.parse::<i64>() {
            Ok(i) => AttrValue::Int(i),
            Err(_) => {
                warn!("attribute {key}: unparseable int `{value}`, keeping as string");
                AttrValue::String(value)
            }
        },
        b"float" => match value.parse::<f64>() {
            Ok(f) => AttrValue::Float(f),
            Err(_) => {
                warn!("attribute {key}: unparseable float `{value}`, keeping as string");
                AttrValue::String(value)
            }
        },
        b"boolean" => match value.as_str() {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            _ => {
                warn!("attribute {key}: unparseable boolean `{value}`, keeping as string");
                AttrValue::String(value)
            }
        },
        b"date" => match parse_timestamp(&value) {
            Some(ts) => AttrValue::Timestamp(ts),
            None => {
                warn!("attribute {key}: unparseable date `{value}`, keeping as string");
                AttrValue::String(value)
            }
        },
        _ => AttrValue::String(value),
    }
}

pub(super) fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    None
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export(log: &EventLog, path: &Path) -> Result<(), LogIoError> {
    let mut buffer = Vec::new();
    write_log(log, &mut buffer).map_err(|message| LogIoError::Xes {
        path: path.display().to_string(),
        message,
    })?;
    std::fs::write(path, buffer).map_err(|e| LogIoError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn write_log<W: Write>(log: &EventLog, out: W) -> Result<(), String> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer
        .write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| e.to_string())?;

    let mut log_start = BytesStart::new("log");
    log_start.push_attribute(("xes.version", "1849.2016"));
    log_start.push_attribute(("xmlns", "http://www.xes-standard.org/"));
    writer
        .write_event(XmlEvent::Start(log_start))
        .map_err(|e| e.to_string())?;

    for (key, value) in &log.attributes {
        write_attr(&mut writer, key, value)?;
    }

    for trace in &log.traces {
        writer
            .write_event(XmlEvent::Start(BytesStart::new("trace")))
            .map_err(|e| e.to_string())?;
        for (key, value) in &trace.attributes {
            write_attr(&mut writer, key, value)?;
        }
        for event in &trace.events {
            writer
                .write_event(XmlEvent::Start(BytesStart::new("event")))
                .map_err(|e| e.to_string())?;
            for (key, value) in &event.attributes {
                write_attr(&mut writer, key, value)?;
            }
            writer
                .write_event(XmlEvent::End(BytesStart::new("event").to_end()))
                .map_err(|e| e.to_string())?;
        }
        writer
            .write_event(XmlEvent::End(BytesStart::new("trace").to_end()))
            .map_err(|e| e.to_string())?;
    }

    writer
        .write_event(XmlEvent::End(BytesStart::new("log").to_end()))
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn write_attr<W: Write>(writer: &mut Writer<W>, key: &str, value: &AttrValue) -> Result<(), String> {
    let (tag, rendered) = match value {
        AttrValue::String(s) => ("string", s.clone()),
        AttrValue::Int(i) => ("int", i.to_string()),
        AttrValue::Float(f) => ("float", f.to_string()),
        AttrValue::Bool(b) => ("boolean", b.to_string()),
        AttrValue::Timestamp(ts) => ("date", ts.to_rfc3339()),
    };
    let mut element = BytesStart::new(tag);
    element.push_attribute(("key", key));
    element.push_attribute(("value", rendered.as_str()));
    writer
        .write_event(XmlEvent::Empty(element))
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
