use std::path::Path;

pub fn run(path: &Path, topic: &str, unconditional: bool) -> Result<(), String> {
    let registry = super::compile(path)?;

    let reachable = registry
        .reachable_topics(topic, unconditional)
        .map_err(|e| e.to_string())?;

    if reachable.is_empty() {
        println!("  {topic} leads nowhere.");
        return Ok(());
    }
    for id in &reachable {
        let known = if registry.topic(id).is_some() { "" } else { "  (no document)" };
        println!("  {id}{known}");
    }
    println!();
    println!("  {} topics reachable from {topic}", reachable.len());

    Ok(())
}
