//! Helpers over raw JSON entry lists returned by the API.

use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryList(Vec<Value>);

impl EntryList {
    pub fn new(entries: Vec<Value>) -> Self {
        Self(entries)
    }

    /// Wraps a list response; fails if `value` is not a JSON array.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(entries) => Ok(Self(entries)),
            other => Err(ApiError::decoding(
                None,
                format!("expected a list of entries, got {}", kind(&other)),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    /// Drops every entry that is deactivated itself or references a
    /// deactivated object. Nested lists are not inspected.
    pub fn remove_deactivated(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|entry| !is_deactivated(entry))
                .collect(),
        )
    }

    /// Indexes entries by their `id`. The `id` key is removed from each entry
    /// and nested lists of objects are indexed the same way.
    pub fn into_id_map(self) -> Result<Map<String, Value>> {
        let mut map = Map::new();

        for entry in self.0 {
            let mut fields = match entry {
                Value::Object(fields) => fields,
                other => {
                    return Err(ApiError::decoding(
                        None,
                        format!("cannot index {} by id", kind(&other)),
                    ));
                }
            };

            let id = match fields.remove("id") {
                Some(Value::Number(id)) => id.to_string(),
                Some(Value::String(id)) => id,
                _ => return Err(ApiError::decoding(None, "entry without an id")),
            };

            for value in fields.values_mut() {
                if let Value::Array(items) = value {
                    if items.iter().all(Value::is_object) {
                        let nested = EntryList(std::mem::take(items)).into_id_map()?;
                        *value = Value::Object(nested);
                    }
                }
            }

            map.insert(id, Value::Object(fields));
        }

        Ok(map)
    }
}

impl From<Vec<Value>> for EntryList {
    fn from(entries: Vec<Value>) -> Self {
        Self(entries)
    }
}

impl IntoIterator for EntryList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn is_deactivated(value: &Value) -> bool {
    let Value::Object(fields) = value else {
        return false;
    };

    fields.iter().any(|(key, value)| match value {
        Value::Bool(false) => key == "active",
        Value::Object(_) => is_deactivated(value),
        _ => false,
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
