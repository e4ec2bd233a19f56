use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DESCRIPTION_PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

impl RawPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Mxn,
    Usd,
}

impl Currency {
    /// First currency code mentioned in a price text, MXN taking precedence.
    pub fn detect(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        if lowered.contains("mxn") {
            Some(Currency::Mxn)
        } else if lowered.contains("usd") {
            Some(Currency::Usd)
        } else {
            None
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Mxn => "MXN",
            Currency::Usd => "USD",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Flags(IndexMap<String, bool>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Integer(_) | FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Flags(flags) => flags.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
            FieldValue::Flags(flags) => {
                let set: Vec<&str> = flags
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| name.as_str())
                    .collect();
                write!(f, "{}", set.join(", "))
            }
        }
    }
}

/// Field map produced by a single extraction stage. Keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialRecord(IndexMap<String, FieldValue>);

impl PartialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Inserts only when the key is not present yet. Returns whether it was inserted.
    pub fn insert_if_absent(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> bool {
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Adds every field of `other` that is not already present.
    pub fn merge(&mut self, other: PartialRecord) {
        for (key, value) in other.0 {
            self.insert_if_absent(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.shift_remove(key)
    }

    pub fn retain(&mut self, keep: impl FnMut(&String, &mut FieldValue) -> bool) {
        self.0.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

impl IntoIterator for PartialRecord {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, FieldValue)> for PartialRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The consolidated record for one listing. Never holds an empty string,
/// list or mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyRecord(IndexMap<String, FieldValue>);

impl PropertyRecord {
    pub(crate) fn from_pruned(fields: PartialRecord) -> Self {
        Self(fields.0)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_number)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(FieldValue::as_list)
    }

    pub fn url(&self) -> Option<&str> {
        self.text("url")
    }

    pub fn title(&self) -> Option<&str> {
        self.text("titulo")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn into_partial(self) -> PartialRecord {
        PartialRecord(self.0)
    }
}

impl Display for PropertyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {}", self.title().unwrap_or("(sin título)"))?;
        if let Some(url) = self.url() {
            writeln!(f, "│  {}", url)?;
        }
        for (key, value) in self.iter() {
            if matches!(key.as_str(), "titulo" | "url" | "descripcion") {
                continue;
            }
            writeln!(f, "│  {}: {}", key, value)?;
        }
        match self.text("descripcion") {
            Some(description) => {
                let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
                let ellipsis = if preview.len() < description.len() { "…" } else { "" };
                writeln!(f, "└─ {}{}", preview.replace('\n', " "), ellipsis)
            }
            None => writeln!(f, "└─ {} field(s)", self.len()),
        }
    }
}

/// Result of scraping one URL. A failure serializes as `{"url", "error"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Success(PropertyRecord),
    Failure { url: String, error: String },
}

impl ScrapeOutcome {
    pub fn record(&self) -> Option<&PropertyRecord> {
        match self {
            ScrapeOutcome::Success(record) => Some(record),
            ScrapeOutcome::Failure { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<PropertyRecord> {
        match self {
            ScrapeOutcome::Success(record) => Some(record),
            ScrapeOutcome::Failure { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScrapeOutcome::Failure { .. })
    }
}
