//! Normalizes what Things hands back into clean records.

use std::str::FromStr;

use chrono::{Local, TimeZone};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::dates::{parse_host_date_in, to_iso, MISSING_VALUE};

pub const TAG_SEPARATOR: &str = ", ";

const NULL_SENTINEL: &str = "null";

pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}

pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => raw.split(TAG_SEPARATOR).map(str::to_string).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Completed,
    Canceled,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "open" => Ok(TaskStatus::Open),
            "completed" => Ok(TaskStatus::Completed),
            "canceled" | "cancelled" => Ok(TaskStatus::Canceled),
            other => Err(other.to_string()),
        }
    }
}

/// A to-do as reported by the JSON listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub notes: String,
    pub status: Option<TaskStatus>,
    pub tags: Vec<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub due_date: Option<String>,
    pub activation_date: Option<String>,
    pub completion_date: Option<String>,
    pub cancellation_date: Option<String>,
    pub project: Option<String>,
    pub area: Option<String>,
}

/// One row of a plain listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Splits linefeed-separated listing output; rows are `id<TAB>name` when
/// ids were requested.
pub fn parse_listing(text: &str, with_ids: bool) -> Vec<ListedItem> {
    let body = text.trim_end_matches(['\n', '\r']);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .map(|line| match line.split_once('\t') {
            Some((id, name)) if with_ids => ListedItem {
                id: Some(id.to_string()),
                name: name.to_string(),
            },
            _ => ListedItem {
                id: None,
                name: line.to_string(),
            },
        })
        .collect()
}

/// Text value of a raw field, `None` for sentinels.
pub fn normalize_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    };
    if text == MISSING_VALUE || text == NULL_SENTINEL {
        return None;
    }
    Some(text)
}

pub fn decode_records(raw: &Value) -> Vec<TaskRecord> {
    decode_records_in(raw, &Local)
}

/// Decodes a listing, reading host dates as wall-clock time in `tz`.
/// Anything other than a sequence yields an empty list.
pub fn decode_records_in<Tz: TimeZone>(raw: &Value, tz: &Tz) -> Vec<TaskRecord> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(decode_record(map, tz)),
            other => {
                warn!(item = %other, "skipping non-record listing entry");
                None
            }
        })
        .collect()
}

fn decode_record<Tz: TimeZone>(map: &Map<String, Value>, tz: &Tz) -> TaskRecord {
    let field = |key: &str| normalize_field(map.get(key));
    let date = |key: &str| decode_date(key, field(key), tz);

    let status = field("status").and_then(|raw| match raw.parse::<TaskStatus>() {
        Ok(status) => Some(status),
        Err(unknown) => {
            warn!(status = %unknown, "unknown task status");
            None
        }
    });

    TaskRecord {
        id: field("id").unwrap_or_default(),
        name: field("name").unwrap_or_default(),
        notes: field("notes").unwrap_or_default(),
        status,
        tags: split_tags(field("tagNames").as_deref()),
        creation_date: date("creationDate"),
        modification_date: date("modificationDate"),
        due_date: date("dueDate"),
        activation_date: date("activationDate"),
        completion_date: date("completionDate"),
        cancellation_date: date("cancellationDate"),
        project: field("project"),
        area: field("area"),
    }
}

/// ISO text for a host date. Text that cannot be parsed is kept as-is so
/// one malformed field does not drop the record.
fn decode_date<Tz: TimeZone>(key: &str, raw: Option<String>, tz: &Tz) -> Option<String> {
    let raw = raw?;
    match parse_host_date_in(&raw, tz) {
        Some(value) => Some(to_iso(&value)),
        None => {
            warn!(field = key, value = %raw, "could not parse host date; keeping raw text");
            Some(raw)
        }
    }
}
