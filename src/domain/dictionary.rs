//! Per-locale translation dictionaries addressed by dotted keys.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SOURCE: &str = "folio::domain::dictionary";

/// A read-only JSON tree of copy and list data for one locale.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    root: Map<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a parsed message file. Top-level keys from `other` replace existing ones.
    pub fn merge(&mut self, other: Value) {
        if let Value::Object(entries) = other {
            for (key, value) in entries {
                self.root.insert(key, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn text_opt(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Resolve a message, falling back to the key itself when it is missing.
    pub fn text(&self, key: &str) -> String {
        self.text_opt(key).unwrap_or_else(|| {
            debug!(target = SOURCE, key, "missing message");
            key.to_string()
        })
    }

    pub fn text_or(&self, key: &str, fallback: &str) -> String {
        self.text_opt(key).unwrap_or_else(|| fallback.to_string())
    }

    /// Resolve a message and substitute `{name}` placeholders.
    pub fn format(&self, key: &str, args: &[(&str, String)]) -> String {
        args.iter()
            .fold(self.text(key), |message, (name, value)| {
                message.replace(&format!("{{{name}}}"), value)
            })
    }

    /// A string array, or empty when missing or of another shape.
    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Decode each element of the array at `key`, skipping malformed elements.
    pub fn list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(Value::Array(items)) = self.lookup(key) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(target = SOURCE, key, index, error = %err, "skipping malformed list entry");
                    None
                }
            })
            .collect()
    }

    /// Decode each member of the object at `key` with its name, in file order.
    pub fn entries<T: DeserializeOwned>(&self, key: &str) -> Vec<(String, T)> {
        let Some(Value::Object(members)) = self.lookup(key) else {
            return Vec::new();
        };

        members
            .iter()
            .filter_map(|(name, item)| match T::deserialize(item) {
                Ok(value) => Some((name.clone(), value)),
                Err(err) => {
                    warn!(target = SOURCE, key, name = %name, error = %err, "skipping malformed entry");
                    None
                }
            })
            .collect()
    }

    /// Items of a home-page collection stored under `{name}.items`.
    pub fn collection<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        self.list(&format!("{name}.items"))
    }
}
