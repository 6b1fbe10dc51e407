pub mod check;
pub mod play;
pub mod reach;
pub mod topics;

use std::path::Path;

use pv_dialogue::TopicRegistry;
use pv_dsl::{CompileResult, Severity};

/// Compile a document or directory and print diagnostics.
/// Returns the registry if there are no errors.
fn compile(path: &Path) -> Result<TopicRegistry, String> {
    let result = pv_dsl::compile_path(path);
    print_diagnostics(&result);

    result
        .into_registry()
        .ok_or_else(|| "compilation failed with errors".to_string())
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(result: &CompileResult) {
    let errors = result
        .diagnostics()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = result
        .diagnostics()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    if errors + warnings == 0 {
        return;
    }

    eprint!("{}", result.render());

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            plural(errors),
            warnings,
            plural(warnings),
        );
    } else {
        eprintln!("  {} warning{}", warnings, plural(warnings));
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
