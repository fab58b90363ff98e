//! Log batch types
//!
//! A batch is everything the framework collected during one request, grouped
//! by category ("error", "info", "sql", ...).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug};

/// Category holding SQL statements with their timing.
pub const SQL_CATEGORY: &str = "sql";

/// Category holding errors raised during the request.
pub const ERROR_CATEGORY: &str = "error";

/// A single raw log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    /// Plain message
    Text(String),
    /// Structured value that needs a textual export before writing
    Value(serde_json::Value),
}

impl LogEntry {
    /// Capture any `Debug` value as a pretty-printed dump.
    pub fn debug<T: Debug + ?Sized>(value: &T) -> Self {
        Self::Text(format!("{:#?}", value))
    }

    /// Textual form written to disk.
    ///
    /// Strings pass through untouched; structured values are exported as
    /// pretty-printed JSON.
    pub fn export(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Value(serde_json::Value::String(text)) => text.clone(),
            Self::Value(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Borrow the text if this is a plain message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Value(serde_json::Value::String(text)) => Some(text),
            Self::Value(_) => None,
        }
    }
}

impl From<&str> for LogEntry {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LogEntry {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<serde_json::Value> for LogEntry {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Categorized entries collected for one request.
///
/// Categories keep the order in which they were first recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogBatch {
    categories: Vec<(String, Vec<LogEntry>)>,
}

impl LogBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry under a category.
    pub fn push(&mut self, category: impl Into<String>, entry: impl Into<LogEntry>) {
        let category = category.into();
        let entry = entry.into();
        match self.categories.iter_mut().find(|(name, _)| *name == category) {
            Some((_, entries)) => entries.push(entry),
            None => self.categories.push((category, vec![entry])),
        }
    }

    /// Builder-style variant of [`push`](Self::push).
    pub fn with(mut self, category: impl Into<String>, entry: impl Into<LogEntry>) -> Self {
        self.push(category, entry);
        self
    }

    /// Entries recorded for a category.
    pub fn get(&self, category: &str) -> Option<&[LogEntry]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Whether the category has at least one entry.
    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some_and(|entries| !entries.is_empty())
    }

    /// Iterate categories in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LogEntry])> {
        self.categories
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|(_, entries)| entries.is_empty())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

impl<C, E> FromIterator<(C, E)> for LogBatch
where
    C: Into<String>,
    E: Into<LogEntry>,
{
    fn from_iter<I: IntoIterator<Item = (C, E)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (category, entry) in iter {
            batch.push(category, entry);
        }
        batch
    }
}

impl Serialize for LogBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, entries) in &self.categories {
            map.serialize_entry(category, entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LogBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BatchVisitor;

        impl<'de> Visitor<'de> for BatchVisitor {
            type Value = LogBatch;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category to log entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<LogBatch, A::Error> {
                let mut batch = LogBatch::new();
                while let Some((category, entries)) = access.next_entry::<String, Vec<LogEntry>>()? {
                    for entry in entries {
                        batch.push(category.clone(), entry);
                    }
                }
                Ok(batch)
            }
        }

        deserializer.deserialize_map(BatchVisitor)
    }
}
