//! Shape detection for uploaded JSON: raw exports versus processed stats.

use crate::types::{Participant, ProcessedStats, RawExport, RawMessage};
use serde_json::{Map, Value};
use std::fmt;

/// The kind of file a parsed JSON value turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationLabel {
    RawExport,
    ProcessedStats,
    Unknown,
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClassificationLabel::RawExport => "raw_export",
            ClassificationLabel::ProcessedStats => "processed_stats",
            ClassificationLabel::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A parsed JSON value together with the shape it was validated against.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    RawExport(RawExport),
    ProcessedStats(ProcessedStats),
    Unknown,
}

impl Classification {
    pub fn label(&self) -> ClassificationLabel {
        match self {
            Classification::RawExport(_) => ClassificationLabel::RawExport,
            Classification::ProcessedStats(_) => ClassificationLabel::ProcessedStats,
            Classification::Unknown => ClassificationLabel::Unknown,
        }
    }
}

/// Classify a parsed JSON value.
///
/// The processed-stats shape is tried first, so an object carrying both a
/// numeric `total_messages`/collection `per_sender` pair and raw export fields is
/// treated as processed stats.
pub fn classify(value: &Value) -> Classification {
    if let Some(stats) = parse_processed_stats(value) {
        return Classification::ProcessedStats(stats);
    }
    if let Some(export) = parse_raw_export(value) {
        return Classification::RawExport(export);
    }
    Classification::Unknown
}

/// Validate the processed-stats shape: numeric `total_messages` and a
/// `per_sender` that is an object or an array.
pub fn parse_processed_stats(value: &Value) -> Option<ProcessedStats> {
    let map = value.as_object()?;
    let has_total = map.get("total_messages").is_some_and(Value::is_number);
    let has_per_sender = map
        .get("per_sender")
        .is_some_and(|per_sender| per_sender.is_object() || per_sender.is_array());
    if has_total && has_per_sender {
        Some(ProcessedStats::from_fields(map.clone()))
    } else {
        None
    }
}

/// Validate the raw export shape and extract its typed form.
pub fn parse_raw_export(value: &Value) -> Option<RawExport> {
    let map = value.as_object()?;
    let participants = map.get("participants")?.as_array()?;
    let messages = map.get("messages")?.as_array()?;
    let title = map.get("title")?.as_str()?;

    if participants.is_empty() {
        return None;
    }

    let participants = participants
        .iter()
        .map(|entry| {
            let name = non_empty_str(entry.as_object()?, "name")?;
            Some(Participant {
                name: name.to_string(),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    let messages = messages
        .iter()
        .map(|entry| parse_message(entry.as_object()?))
        .collect::<Option<Vec<_>>>()?;

    Some(RawExport {
        title: title.to_string(),
        participants,
        messages,
    })
}

fn parse_message(record: &Map<String, Value>) -> Option<RawMessage> {
    let sender_name = non_empty_str(record, "sender_name")?;
    let timestamp_ms = record
        .get("timestamp_ms")
        .and_then(Value::as_f64)
        .filter(|ts| *ts != 0.0 && ts.is_finite())?;
    let content = record
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(RawMessage {
        sender_name: sender_name.to_string(),
        timestamp_ms,
        content,
    })
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
