use std::path::Path;

pub fn run(path: &Path) -> Result<(), String> {
    let registry = super::compile(path)?;

    println!("  All checks passed for '{}'.", path.display());
    println!(
        "  {} topic{}, {} effects-on-condition",
        registry.len(),
        super::plural(registry.len()),
        registry.eoc_ids().count()
    );

    Ok(())
}
