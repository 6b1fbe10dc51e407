use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Prefix shared by every variable written from a conversation document.
pub const TALK_VAR_PREFIX: &str = "npctalk_var_";

/// Build the store key for a document-declared variable.
///
/// `type` and `context` are optional namespaces; empty parts are skipped.
pub fn talk_varname(name: &str, var_type: &str, context: &str) -> String {
    let mut key = String::from(TALK_VAR_PREFIX);
    for part in [var_type, context] {
        if !part.is_empty() {
            key.push_str(part);
            key.push('_');
        }
    }
    key.push_str(name);
    key
}

/// Convert a stored variable to an integer.
///
/// Absent and empty values read as zero. Anything else must parse as an
/// integer; a failure is reported, never defaulted.
pub fn parse_int(key: &str, value: Option<&str>) -> CoreResult<i64> {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(0);
    };
    text.parse::<i64>().map_err(|_| CoreError::NotANumber {
        key: key.to_string(),
        value: text.to_string(),
    })
}

/// A flat string-to-string variable store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarStore {
    values: BTreeMap<String, String>,
}

impl VarStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Write a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read a value as an integer (see [`parse_int`]).
    pub fn get_int(&self, key: &str) -> CoreResult<i64> {
        parse_int(key, self.get(key))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
