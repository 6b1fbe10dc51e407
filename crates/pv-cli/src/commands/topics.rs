use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use pv_dialogue::DynamicLine;

pub fn run(path: &Path, filter: Option<&str>) -> Result<(), String> {
    let registry = super::compile(path)?;

    let ids: Vec<&str> = registry
        .topic_ids()
        .filter(|id| filter.is_none_or(|f| id.contains(f)))
        .collect();

    if ids.is_empty() {
        println!("  No topics found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Topic", "Line", "Responses", "Category"]);

    for id in &ids {
        let Some(topic) = registry.topic(id) else {
            continue;
        };
        let responses = topic.responses.len() + topic.repeat_responses.len();
        let category = registry
            .categories()
            .category(id)
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        table.add_row(vec![
            id.to_string(),
            line_summary(&topic.line),
            responses.to_string(),
            category,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} topics", ids.len());

    Ok(())
}

/// A short description of a dynamic line.
fn line_summary(line: &DynamicLine) -> String {
    match line {
        DynamicLine::Empty => "(built-in)".to_string(),
        DynamicLine::Text(text) if text.chars().count() > 50 => {
            let head: String = text.chars().take(47).collect();
            format!("{head}...")
        }
        DynamicLine::Text(text) => text.clone(),
        DynamicLine::OneOf(lines) => format!("(one of {})", lines.len()),
        DynamicLine::Concat(lines) => format!("(joined from {})", lines.len()),
        DynamicLine::UseReason => "(reason)".to_string(),
        DynamicLine::Gendered { .. } => "(gendered)".to_string(),
        DynamicLine::Conditional { .. } => "(conditional)".to_string(),
    }
}
