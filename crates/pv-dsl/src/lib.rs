//! Document compiler for Palaver.
//!
//! Dialogue content is written as JSON documents: arrays of `talk_topic`,
//! `effect_on_condition`, `snippet` and `topic_category` objects. This crate
//! validates them and compiles them into a [`pv_dialogue::TopicRegistry`].
//! Every problem is reported as a [`Diagnostic`] naming the offending key
//! path; any error rejects the load.

pub mod categories;
pub mod compiler;
/// Diagnostics and their terminal rendering.
pub mod diagnostics;
pub mod locate;
mod reader;

use std::path::Path;

pub use categories::default_categories;
pub use compiler::{CompileResult, SourceFile};
pub use diagnostics::{Diagnostic, Severity};

/// Compile a single source string.
pub fn compile_source(source: &str) -> CompileResult {
    compiler::compile([("<source>".to_string(), source.to_string())])
}

/// Compile all `.json` files in a directory into a single registry.
///
/// Files load in path order.
pub fn compile_dir(dir: &Path) -> CompileResult {
    let failed = |message: String| CompileResult {
        registry: pv_dialogue::TopicRegistry::new(),
        files: vec![SourceFile {
            name: dir.display().to_string(),
            text: String::new(),
            diagnostics: vec![Diagnostic::error(0..0, message)],
        }],
    };

    let mut paths: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) => return failed(format!("cannot read directory: {e}")),
    };
    paths.sort();

    if paths.is_empty() {
        return failed(format!("no .json files found in {}", dir.display()));
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => files.push((path.display().to_string(), text)),
            Err(e) => return failed(format!("cannot read {}: {e}", path.display())),
        }
    }
    compiler::compile(files)
}

/// Compile a file or, for a directory, every `.json` file in it.
pub fn compile_path(path: &Path) -> CompileResult {
    if path.is_dir() {
        return compile_dir(path);
    }
    match std::fs::read_to_string(path) {
        Ok(text) => compiler::compile([(path.display().to_string(), text)]),
        Err(e) => CompileResult {
            registry: pv_dialogue::TopicRegistry::new(),
            files: vec![SourceFile {
                name: path.display().to_string(),
                text: String::new(),
                diagnostics: vec![Diagnostic::error(
                    0..0,
                    format!("cannot read {}: {e}", path.display()),
                )],
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn messages(result: &CompileResult) -> Vec<String> {
        result.diagnostics().map(|d| d.to_string()).collect()
    }

    #[test]
    fn compiles_a_small_document() {
        let result = compile_source(
            r#"[
              { "type": "talk_topic", "id": "TALK_GREET",
                "dynamic_line": "Hello, <name_g>.",
                "responses": [
                  { "text": "Any work?", "topic": "TALK_MISSION_LIST" },
                  { "text": "Bye.", "topic": "TALK_DONE" }
                ] },
              { "type": "topic_category", "category": 20, "topics": ["TALK_GREET"] }
            ]"#,
        );
        assert!(!result.has_errors(), "{:?}", messages(&result));
        let registry = result.into_registry().unwrap_or_default();
        assert!(registry.topic("TALK_GREET").is_some());
        assert_eq!(registry.categories().category("TALK_GREET"), Some(20));
        assert_eq!(registry.categories().category("TALK_SHOUT"), Some(99));
    }

    #[test]
    fn diagnostics_name_their_key_path() {
        let result = compile_source(
            r#"[
              { "type": "talk_topc" },
              { "type": "talk_topic", "id": "TALK_X" }
            ]"#,
        );
        assert!(result.has_errors());
        insta::assert_snapshot!(messages(&result).join("\n"), @r"
        error: $[0].type: unknown document type `talk_topc`
        error: $[1]: missing `responses`
        ");
        assert!(result.into_registry().is_none());
    }

    #[test]
    fn spans_point_into_the_source() {
        let source = r#"{ "type": "talk_topic", "id": "TALK_X", "responses": [] }"#;
        let result = compile_source(source);
        let diagnostic = result.diagnostics().next().cloned();
        let span = diagnostic.map(|d| d.span).unwrap_or_default();
        assert_eq!(&source[span], "[]");
    }

    #[test]
    fn invalid_json_is_reported() {
        let source = "[\n  { \"type\": }\n]";
        let result = compile_source(source);
        let diagnostic = result.diagnostics().next().cloned();
        assert!(result.has_errors());
        let diagnostic = diagnostic.unwrap_or_else(|| Diagnostic::error(0..0, ""));
        assert!(diagnostic.message.starts_with("invalid JSON"), "{}", diagnostic.message);
        assert!(source[..diagnostic.span.start].contains('\n'));
    }

    #[test]
    fn unknown_eoc_references_are_errors() {
        let result = compile_source(
            r#"[
              { "type": "effect_on_condition", "id": "EOC_START",
                "effect": [{ "u_set_queue_eoc": "EOC_LATR" }] },
              { "type": "effect_on_condition", "id": "EOC_LATER",
                "effect": ["end_conversation"] }
            ]"#,
        );
        let errors: Vec<_> = result.diagnostics().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unknown effect_on_condition `EOC_LATR`");
        assert_eq!(errors[0].help.as_deref(), Some("did you mean `EOC_LATER`?"));
    }

    #[test]
    fn references_resolve_across_files() {
        let result = compiler::compile([
            (
                "a.json".to_string(),
                r#"{ "type": "effect_on_condition", "id": "EOC_A",
                     "effect": [{ "u_set_queue_eoc": "EOC_B" }] }"#
                    .to_string(),
            ),
            (
                "b.json".to_string(),
                r#"{ "type": "effect_on_condition", "id": "EOC_B" }"#.to_string(),
            ),
        ]);
        assert!(!result.has_errors(), "{:?}", messages(&result));
        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn duplicate_eocs_warn() {
        let eoc = r#"{ "type": "effect_on_condition", "id": "EOC_A" }"#;
        let result = compiler::compile([
            ("a.json".to_string(), eoc.to_string()),
            ("b.json".to_string(), eoc.to_string()),
        ]);
        assert!(!result.has_errors());
        assert!(result.files[0].diagnostics.is_empty());
        let warnings = &result.files[1].diagnostics;
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert!(result.render().contains("defined more than once"));
    }

    #[test]
    fn missing_files_are_reported() {
        let result = compile_path(Path::new("/nonexistent/palaver/topics.json"));
        assert!(result.has_errors());
        assert!(result.diagnostics().all(|d| d.message.starts_with("cannot read")));
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
            let result = compile_source(&text);
            for diagnostic in result.diagnostics() {
                prop_assert!(diagnostic.span.end <= text.len());
            }
        }

        #[test]
        fn truncated_documents_are_rejected(cut in 0usize..160) {
            let source = r#"[{"type": "talk_topic", "id": ["TALK_A"],
                "responses": [{"text": "é", "topic": "TALK_DONE"}]}]"#;
            let end = (0..=cut.min(source.len()))
                .rev()
                .find(|&i| source.is_char_boundary(i))
                .unwrap_or(0);
            let result = compile_source(&source[..end]);
            prop_assert_eq!(result.has_errors(), end < source.len());
        }
    }
}
