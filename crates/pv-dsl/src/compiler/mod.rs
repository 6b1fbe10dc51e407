//! Document objects: topics, effects-on-condition, snippets and topic
//! categories.

mod condition;
mod effect;
mod expr;
mod topic;

use std::collections::BTreeSet;

use serde_json::Value;

use pv_dialogue::{EffectOnCondition, Snippet, TopicCategories, TopicDef, TopicRegistry};

use crate::diagnostics::{Diagnostic, Severity, render_diagnostics};
use crate::categories::default_categories;
use crate::locate::{KeyPath, SpanIndex};
use crate::reader::{Cx, Obj, strings};

/// Every `type` a document object may declare.
pub(crate) const DOCUMENT_TYPES: &[&str] =
    &["talk_topic", "effect_on_condition", "snippet", "topic_category"];

/// One source file and the diagnostics reported against it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, usually the path.
    pub name: String,
    /// The full text.
    pub text: String,
    /// Errors and warnings, with spans into `text`.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of compiling a set of documents.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// The compiled registry (partial if errors occurred).
    pub registry: TopicRegistry,
    /// Each compiled file, in load order.
    pub files: Vec<SourceFile>,
}

impl CompileResult {
    /// Returns `true` if any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|d| d.severity == Severity::Error)
    }

    /// Every diagnostic across all files.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|file| file.diagnostics.iter())
    }

    /// The registry, unless any error rejected the load.
    pub fn into_registry(self) -> Option<TopicRegistry> {
        if self.has_errors() {
            None
        } else {
            Some(self.registry)
        }
    }

    /// All diagnostics rendered for a terminal.
    pub fn render(&self) -> String {
        self.files
            .iter()
            .filter(|file| !file.diagnostics.is_empty())
            .map(|file| {
                if file.text.is_empty() {
                    // Nothing to point into; the file could not be read.
                    file.diagnostics.iter().map(|d| format!("{d}\n")).collect()
                } else {
                    render_diagnostics(&file.text, &file.name, &file.diagnostics)
                }
            })
            .collect()
    }
}

/// A file compiled on its own, before references across files are checked.
struct Unit {
    file: SourceFile,
    spans: SpanIndex,
    eoc_refs: Vec<(String, KeyPath)>,
}

/// Compile `(name, text)` pairs into one registry.
///
/// Files are compiled in order; a topic declared in several files merges,
/// and a later effect-on-condition replaces an earlier one with a warning.
/// Effect-on-condition references are checked once every file is loaded.
pub fn compile<I>(files: I) -> CompileResult
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut registry = TopicRegistry::new();
    registry.add_categories(&default_categories());
    let mut defined = BTreeSet::new();
    let mut units = Vec::new();

    for (name, text) in files {
        tracing::debug!(file = %name, "compiling document");
        let value = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(e) => {
                let diagnostic = parse_error(&text, &e);
                units.push(Unit {
                    file: SourceFile {
                        name,
                        text,
                        diagnostics: vec![diagnostic],
                    },
                    spans: SpanIndex::default(),
                    eoc_refs: Vec::new(),
                });
                continue;
            }
        };
        let spans = SpanIndex::build(&text);
        let mut cx = Cx::new(&spans);
        let doc = document(&mut cx, &value);

        for topic in doc.topics {
            registry.insert_topic(topic);
        }
        for (eoc, path) in doc.eocs {
            if !defined.insert(eoc.id.clone()) {
                let message = format!(
                    "effect_on_condition `{}` is defined more than once; the last definition wins",
                    eoc.id
                );
                cx.warning(&path, message);
            }
            registry.insert_eoc(eoc);
        }
        for eoc in doc.inline_eocs {
            registry.insert_eoc(eoc);
        }
        for (category, snippet) in doc.snippets {
            registry.insert_snippet(category, snippet);
        }
        registry.add_categories(&doc.categories);

        let eoc_refs = std::mem::take(&mut cx.eoc_refs);
        let diagnostics = std::mem::take(&mut cx.diagnostics);
        units.push(Unit {
            file: SourceFile {
                name,
                text,
                diagnostics,
            },
            spans,
            eoc_refs,
        });
    }

    for unit in &mut units {
        let mut cx = Cx::new(&unit.spans);
        for (id, path) in &unit.eoc_refs {
            if registry.eoc(id).is_none() {
                cx.unknown(path, "effect_on_condition", id, registry.eoc_ids());
            }
        }
        unit.file.diagnostics.append(&mut cx.diagnostics);
    }

    let result = CompileResult {
        registry,
        files: units.into_iter().map(|unit| unit.file).collect(),
    };
    tracing::info!(
        files = result.files.len(),
        topics = result.registry.len(),
        errors = result.diagnostics().filter(|d| d.is_error()).count(),
        "documents compiled"
    );
    result
}

/// A JSON syntax error, placed at the line and column serde reports.
fn parse_error(text: &str, error: &serde_json::Error) -> Diagnostic {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(error.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let mut start = (line_start + error.column().saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let end = text[start..].chars().next().map_or(start, |c| start + c.len_utf8());
    Diagnostic::error(start..end, format!("invalid JSON: {error}")).with_label("here")
}

/// What one document declares.
#[derive(Default)]
pub(crate) struct Document {
    pub topics: Vec<TopicDef>,
    /// Top-level effects-on-condition, with where each is declared.
    pub eocs: Vec<(EffectOnCondition, KeyPath)>,
    /// Effects-on-condition declared inside effect blocks.
    pub inline_eocs: Vec<EffectOnCondition>,
    pub snippets: Vec<(String, Snippet)>,
    pub categories: TopicCategories,
}

/// Compile a parsed document: a single object or an array of them.
pub(crate) fn document(cx: &mut Cx<'_>, value: &Value) -> Document {
    let mut doc = Document::default();
    let root = KeyPath::root();
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                object(cx, &mut doc, item, root.index(i));
            }
        }
        Value::Object(_) => object(cx, &mut doc, value, root),
        _ => cx.error(&root, "expected an object or an array of objects"),
    }
    doc.topics.append(&mut cx.inline_topics);
    doc.inline_eocs.append(&mut cx.inline_eocs);
    doc
}

fn object(cx: &mut Cx<'_>, doc: &mut Document, value: &Value, path: KeyPath) {
    let Some(obj) = Obj::new(cx, value, path) else {
        return;
    };
    let Some(kind) = obj.req_str(cx, "type") else {
        return;
    };
    match kind {
        "talk_topic" => doc.topics.extend(talk_topic(cx, &obj)),
        "effect_on_condition" => {
            if let Some(eoc) = effect::effect_on_condition(cx, &obj, false) {
                doc.eocs.push((eoc, obj.path.clone()));
            }
        }
        "snippet" => doc.snippets.extend(snippets(cx, &obj)),
        "topic_category" => {
            let category = obj.small_int(cx, "category");
            if !obj.has("category") {
                obj.missing(cx, "category");
            }
            if !obj.has("topics") {
                obj.missing(cx, "topics");
            }
            let topics = obj.strings(cx, "topics");
            if let Some(category) = category {
                doc.categories.insert(category, topics);
            }
        }
        other => {
            let known = DOCUMENT_TYPES.iter().copied();
            cx.unknown(&obj.at("type"), "document type", other, known);
        }
    }
}

/// One definition per listed id, all sharing the compiled body.
fn talk_topic(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Vec<TopicDef> {
    let ids = match obj.get("id") {
        Some(value) => strings(cx, value, &obj.at("id")),
        None => {
            obj.missing(cx, "id");
            Vec::new()
        }
    };
    if obj.has("id") && ids.is_empty() {
        cx.error(&obj.at("id"), "a topic needs at least one id");
    }
    let Some(body) = topic::topic_body(cx, obj) else {
        return Vec::new();
    };
    ids.iter().map(|id| body.instantiate(id)).collect()
}

fn snippets(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Vec<(String, Snippet)> {
    let category = obj.req_str(cx, "category");
    let Some(text) = obj.get("text") else {
        obj.missing(cx, "text");
        return Vec::new();
    };
    let Some(category) = category else {
        return Vec::new();
    };
    let entries = match text {
        Value::Array(entries) => entries.iter().collect(),
        single => vec![single],
    };
    let mut out = Vec::new();
    for (i, entry) in entries.into_iter().enumerate() {
        let at = if text.is_array() { obj.at("text").index(i) } else { obj.at("text") };
        match entry {
            Value::String(line) => {
                let snippet = Snippet::new(format!("{category}_{i}"), line.clone());
                out.push((category.to_string(), snippet));
            }
            Value::Object(_) => {
                let Some(entry) = Obj::new(cx, entry, at) else {
                    continue;
                };
                let id = entry.req_str(cx, "id");
                let line = entry.req_str(cx, "text");
                if let (Some(id), Some(line)) = (id, line) {
                    out.push((category.to_string(), Snippet::new(id, line)));
                }
            }
            _ => cx.error(&at, "expected a string or an object with `id` and `text`"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::locate::SpanIndex;

    use super::*;

    fn compile(value: Value) -> (Document, Vec<String>) {
        let spans = SpanIndex::default();
        let mut cx = Cx::new(&spans);
        let doc = document(&mut cx, &value);
        let messages = cx.diagnostics.iter().map(|d| d.to_string()).collect();
        (doc, messages)
    }

    #[test]
    fn topics_with_several_ids() {
        let (doc, errors) = compile(json!([{
            "type": "talk_topic",
            "id": ["TALK_A", "TALK_B"],
            "dynamic_line": "Hey.",
            "responses": [{ "text": "Bye.", "topic": "TALK_DONE" }]
        }]));
        assert!(errors.is_empty(), "{errors:?}");
        let ids: Vec<_> = doc.topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["TALK_A", "TALK_B"]);
    }

    #[test]
    fn single_object_documents() {
        let (doc, errors) = compile(json!({
            "type": "effect_on_condition",
            "id": "EOC_GREET",
            "effect": ["end_conversation"]
        }));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(doc.eocs.len(), 1);
        assert_eq!(doc.eocs[0].0.id, "EOC_GREET");
        assert_eq!(doc.eocs[0].1.to_string(), "$");
    }

    #[test]
    fn unknown_and_missing_types() {
        let (_, errors) = compile(json!([{ "type": "talk_topc" }, { "id": "X" }, 3]));
        assert_eq!(
            errors,
            vec![
                "error: $[0].type: unknown document type `talk_topc`".to_string(),
                "error: $[1]: missing `type`".to_string(),
                "error: $[2]: expected an object".to_string(),
            ]
        );
    }

    #[test]
    fn topics_need_ids() {
        let (doc, errors) = compile(json!({
            "type": "talk_topic",
            "responses": [{ "text": "Bye." }]
        }));
        assert!(doc.topics.is_empty());
        assert_eq!(errors, vec!["error: $: missing `id`".to_string()]);
    }

    #[test]
    fn snippets_accept_strings_and_objects() {
        let (doc, errors) = compile(json!({
            "type": "snippet",
            "category": "<greet>",
            "text": ["Hi.", { "id": "greet_formal", "text": "Good day." }]
        }));
        assert!(errors.is_empty(), "{errors:?}");
        let ids: Vec<_> = doc.snippets.iter().map(|(_, s)| s.id.as_str()).collect();
        assert_eq!(ids, ["<greet>_0", "greet_formal"]);
        assert!(doc.snippets.iter().all(|(category, _)| category == "<greet>"));
    }

    #[test]
    fn topic_categories() {
        let (doc, errors) = compile(json!({
            "type": "topic_category",
            "category": 12,
            "topics": ["TALK_CAMP", "TALK_CAMP_JOBS"]
        }));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(doc.categories.category("TALK_CAMP_JOBS"), Some(12));
    }

    #[test]
    fn inline_definitions_are_collected() {
        let (doc, errors) = compile(json!({
            "type": "talk_topic",
            "id": "TALK_OUTER",
            "responses": [{
                "text": "Tell me more.",
                "topic": {
                    "id": "TALK_INNER",
                    "dynamic_line": "More.",
                    "responses": [{ "text": "Ok.", "topic": "TALK_DONE" }]
                }
            }]
        }));
        assert!(errors.is_empty(), "{errors:?}");
        let ids: Vec<_> = doc.topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["TALK_OUTER", "TALK_INNER"]);
    }
}
