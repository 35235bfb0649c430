//! Core data types for uploaded files, exports and processed stats.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// MIME type a browser reports for `.json` files.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A file the user picked, as the host describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub path: PathBuf,
}

impl SelectedFile {
    /// Describe a file on disk, deriving its name and content type from the path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let content_type = content_type_for(&path).to_string();
        Self {
            name,
            content_type,
            path,
        }
    }

    /// Describe a file whose name and content type were declared by the host.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            path: path.into(),
        }
    }

    /// Whether the declared name and content type both say JSON.
    pub fn is_json(&self) -> bool {
        self.name.ends_with(".json") && self.content_type == JSON_CONTENT_TYPE
    }
}

/// Guess a MIME type from the file extension. Unknown extensions map to an
/// empty string, as in a browser `File.type`.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => JSON_CONTENT_TYPE,
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "zip" => "application/zip",
        _ => "",
    }
}

/// A selected file after it has been read and parsed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Value,
}

/// A participant listed in a raw export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
}

/// One message record of a raw export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub sender_name: String,
    pub timestamp_ms: f64,
    pub content: Option<String>,
}

/// A validated raw conversation export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExport {
    pub title: String,
    pub participants: Vec<Participant>,
    pub messages: Vec<RawMessage>,
}

impl RawExport {
    /// Participant names in lexicographic order, duplicates kept.
    pub fn sorted_participant_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .participants
            .iter()
            .map(|participant| participant.name.clone())
            .collect();
        names.sort();
        names
    }
}

/// A raw export together with the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawExportFile {
    pub filename: String,
    pub data: Value,
    #[serde(skip)]
    pub export: RawExport,
}

/// A pre-computed statistics object.
///
/// The object is kept verbatim; accessors read the fields the cards need and
/// treat anything malformed as absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProcessedStats {
    fields: Map<String, Value>,
}

impl ProcessedStats {
    pub(crate) fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn total_messages(&self) -> f64 {
        self.fields
            .get("total_messages")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Senders with a numeric count, highest count first. Ties keep the
    /// order of the source object; an array is keyed by index.
    pub fn ranked_senders(&self) -> Vec<SenderCount> {
        let mut senders: Vec<SenderCount> = self
            .fields
            .get("per_sender")
            .map(|per_sender| {
                keyed_entries(per_sender)
                    .into_iter()
                    .filter_map(|(name, count)| {
                        count.as_f64().map(|count| SenderCount { name, count })
                    })
                    .collect()
            })
            .unwrap_or_default();
        senders.sort_by(|a, b| {
            b.count
                .partial_cmp(&a.count)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        senders
    }

    pub fn chat_title(&self) -> Option<&str> {
        self.fields
            .get("chat_title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
    }

    pub fn rewind_year(&self) -> Option<i64> {
        self.fields
            .get("rewind_year")
            .and_then(Value::as_i64)
            .filter(|year| *year != 0)
    }

    pub fn longest_streak_days(&self) -> f64 {
        self.fields
            .get("longest_streak_days")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// `[[day_index, count], ...]` with Monday as day 0.
    pub fn busiest_dow(&self) -> Vec<(usize, f64)> {
        self.fields
            .get("busiest_dow")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let pair = entry.as_array()?;
                        let day = pair.first()?.as_u64()? as usize;
                        let count = pair.get(1).and_then(Value::as_f64).unwrap_or(0.0);
                        Some((day, count))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn most_reacted_message(&self) -> Option<MostReactedMessage> {
        MostReactedMessage::from_value(self.fields.get("most_reacted_message")?)
    }

    pub fn account_owner(&self) -> Option<&str> {
        self.fields
            .get("account_owner")
            .and_then(Value::as_str)
            .filter(|owner| !owner.is_empty())
    }

    pub fn personal_stats(&self) -> Option<PersonalStats> {
        PersonalStats::from_value(self.fields.get("personal_stats")?)
    }
}

/// Entries of an object, or of an array keyed by index.
fn keyed_entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(key, value)| (key.clone(), value)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        _ => Vec::new(),
    }
}

fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key)
        .and_then(Value::as_f64)
        .filter(|number| number.is_finite())
}

/// A sender and their message count.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderCount {
    pub name: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MostReactedMessage {
    pub sender: String,
    pub content: String,
    pub reaction_count: Option<f64>,
}

impl MostReactedMessage {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            sender: str_field(map, "sender")?,
            content: str_field(map, "content").unwrap_or_default(),
            reaction_count: number_field(map, "reaction_count"),
        })
    }
}

/// The account owner's own numbers. Each field is read on its own, so one
/// malformed field leaves the others intact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonalStats {
    pub best_friend: Option<String>,
    pub your_rank: Option<f64>,
    pub your_message_count: Option<f64>,
    pub your_activity_level: Option<String>,
    pub your_percentage: Option<f64>,
    pub your_most_received_emoji: Option<ReceivedEmoji>,
    pub your_active_hour: Option<u32>,
    /// Partner name to average response time in minutes, in source order.
    pub your_response_times: Vec<(String, f64)>,
}

impl PersonalStats {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            best_friend: map
                .get("best_friend")
                .and_then(Value::as_object)
                .and_then(|friend| str_field(friend, "name")),
            your_rank: number_field(map, "your_rank"),
            your_message_count: number_field(map, "your_message_count"),
            your_activity_level: str_field(map, "your_activity_level"),
            your_percentage: number_field(map, "your_percentage"),
            your_most_received_emoji: map
                .get("your_most_received_emoji")
                .and_then(ReceivedEmoji::from_value),
            your_active_hour: number_field(map, "your_active_hour")
                .filter(|hour| (0.0..24.0).contains(hour))
                .map(|hour| hour as u32),
            your_response_times: map
                .get("your_response_times")
                .map(|times| {
                    keyed_entries(times)
                        .into_iter()
                        .filter_map(|(name, minutes)| {
                            minutes.as_f64().map(|minutes| (name, minutes))
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEmoji {
    pub emoji: String,
    pub count: Option<f64>,
    pub top_reactor: Option<String>,
}

impl ReceivedEmoji {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            emoji: str_field(map, "emoji")?,
            count: number_field(map, "count"),
            top_reactor: str_field(map, "top_reactor"),
        })
    }
}
