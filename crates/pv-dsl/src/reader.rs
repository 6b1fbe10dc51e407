//! Typed access to JSON values that records a diagnostic for every problem.
//!
//! Readers return `None` after reporting, so compilation keeps going and a
//! whole document is checked in one pass.

use serde_json::{Map, Value};

use pv_dialogue::{EffectOnCondition, TopicDef};

use crate::diagnostics::{Diagnostic, suggest};
use crate::locate::{KeyPath, SpanIndex};

/// Compilation context for one document.
pub(crate) struct Cx<'s> {
    spans: &'s SpanIndex,
    pub diagnostics: Vec<Diagnostic>,
    /// Effects-on-condition declared inline inside effect blocks.
    pub inline_eocs: Vec<EffectOnCondition>,
    /// Topics declared inline as a response's `topic`.
    pub inline_topics: Vec<TopicDef>,
    /// Every effect-on-condition id referenced by name, with where.
    pub eoc_refs: Vec<(String, KeyPath)>,
    inline_counter: usize,
}

impl<'s> Cx<'s> {
    pub fn new(spans: &'s SpanIndex) -> Self {
        Self {
            spans,
            diagnostics: Vec::new(),
            inline_eocs: Vec::new(),
            inline_topics: Vec::new(),
            eoc_refs: Vec::new(),
            inline_counter: 0,
        }
    }

    pub fn error(&mut self, path: &KeyPath, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(self.spans.locate(path), message).at(path.to_string());
        self.diagnostics.push(diagnostic);
    }

    pub fn warning(&mut self, path: &KeyPath, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(self.spans.locate(path), message).at(path.to_string());
        self.diagnostics.push(diagnostic);
    }

    /// Report an unknown name, suggesting the closest known one.
    pub fn unknown<'c>(
        &mut self,
        path: &KeyPath,
        what: &str,
        name: &str,
        known: impl IntoIterator<Item = &'c str>,
    ) {
        let span = self.spans.key(path).unwrap_or_else(|| self.spans.locate(path));
        let mut diagnostic =
            Diagnostic::error(span, format!("unknown {what} `{name}`")).at(path.to_string());
        if let Some(close) = suggest(name, known) {
            diagnostic = diagnostic.with_help(format!("did you mean `{close}`?"));
        }
        self.diagnostics.push(diagnostic);
    }

    /// A fresh id for an inline definition.
    pub fn inline_id(&mut self, kind: &str) -> String {
        self.inline_counter += 1;
        format!("_inline_{kind}_{}", self.inline_counter)
    }
}

/// A JSON object and where it sits.
#[derive(Clone)]
pub(crate) struct Obj<'v> {
    pub map: &'v Map<String, Value>,
    pub path: KeyPath,
}

impl<'v> Obj<'v> {
    /// View `value` as an object, reporting anything else.
    pub fn new(cx: &mut Cx<'_>, value: &'v Value, path: KeyPath) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self { map, path }),
            _ => {
                cx.error(&path, "expected an object");
                None
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&'v Value> {
        self.map.get(key)
    }

    pub fn at(&self, key: &str) -> KeyPath {
        self.path.key(key)
    }

    /// The first of `keys` present in this object.
    pub fn first_of<'k>(&self, keys: &[&'k str]) -> Option<&'k str> {
        keys.iter().copied().find(|k| self.has(k))
    }

    pub fn missing(&self, cx: &mut Cx<'_>, key: &str) {
        cx.error(&self.path, format!("missing `{key}`"));
    }

    /// An optional string member.
    pub fn str(&self, cx: &mut Cx<'_>, key: &str) -> Option<&'v str> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => {
                cx.error(&self.at(key), format!("`{key}` must be a string"));
                None
            }
        }
    }

    /// A mandatory string member.
    pub fn req_str(&self, cx: &mut Cx<'_>, key: &str) -> Option<&'v str> {
        if !self.has(key) {
            self.missing(cx, key);
            return None;
        }
        self.str(cx, key)
    }

    /// An optional string member with a default.
    pub fn str_or(&self, cx: &mut Cx<'_>, key: &str, default: &str) -> String {
        self.str(cx, key).unwrap_or(default).to_string()
    }

    pub fn bool(&self, cx: &mut Cx<'_>, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                cx.error(&self.at(key), format!("`{key}` must be true or false"));
                default
            }
        }
    }

    /// An optional integer member.
    pub fn int(&self, cx: &mut Cx<'_>, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                cx.error(&self.at(key), format!("`{key}` must be an integer"));
                None
            }
        }
    }

    pub fn int_or(&self, cx: &mut Cx<'_>, key: &str, default: i64) -> i64 {
        self.int(cx, key).unwrap_or(default)
    }

    /// An optional integer member that must fit in an `i32`.
    pub fn small_int(&self, cx: &mut Cx<'_>, key: &str) -> Option<i32> {
        let n = self.int(cx, key)?;
        match i32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                cx.error(&self.at(key), format!("`{key}` is out of range"));
                None
            }
        }
    }

    /// A string or an array of strings; absent is empty.
    pub fn strings(&self, cx: &mut Cx<'_>, key: &str) -> Vec<String> {
        match self.get(key) {
            None => Vec::new(),
            Some(value) => strings(cx, value, &self.at(key)),
        }
    }

    /// An optional object member.
    pub fn object(&self, cx: &mut Cx<'_>, key: &str) -> Option<Obj<'v>> {
        let value = self.get(key)?;
        Obj::new(cx, value, self.at(key))
    }
}

/// A string or an array of strings.
pub(crate) fn strings(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Value::String(s) => Some(s.clone()),
                _ => {
                    cx.error(&path.index(i), "expected a string");
                    None
                }
            })
            .collect(),
        _ => {
            cx.error(path, "expected a string or an array of strings");
            Vec::new()
        }
    }
}

/// One element or an array of them, each with its path.
pub(crate) fn one_or_many<'v>(value: &'v Value, path: &KeyPath) -> Vec<(&'v Value, KeyPath)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (item, path.index(i)))
            .collect(),
        single => vec![(single, path.clone())],
    }
}

/// An array's elements with their paths, reporting anything else.
pub(crate) fn array<'v>(
    cx: &mut Cx<'_>,
    value: &'v Value,
    path: &KeyPath,
) -> Option<Vec<(&'v Value, KeyPath)>> {
    match value {
        Value::Array(_) => Some(one_or_many(value, path)),
        _ => {
            cx.error(path, "expected an array");
            None
        }
    }
}
