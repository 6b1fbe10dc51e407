//! Play a conversation against sandbox speakers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use pv_core::sandbox::{Character, Sandbox};
use pv_dialogue::{Dialogue, DialogueConfig};

use crate::ui::TextUi;

/// Settings for one conversation.
pub struct PlayOptions {
    pub seed: Option<u64>,
    pub choices: Option<Vec<String>>,
    pub npc: Option<String>,
    pub npc_file: Option<PathBuf>,
    pub name: String,
    pub cash: i64,
}

pub fn run(path: &Path, topic: &str, options: &PlayOptions) -> Result<(), String> {
    let registry = Arc::new(super::compile(path)?);
    if registry.topic(topic).is_none() {
        tracing::warn!(topic, "opening topic has no document; using built-in text");
    }

    let mut avatar = Character::avatar(options.name.as_str()).with_cash(options.cash);
    let mut npc = match &options.npc_file {
        Some(file) => load_character(file)?,
        None => Character::npc("Stranger", topic),
    };
    npc.npc = true;
    npc.first_topic = topic.to_string();
    if let Some(name) = &options.npc {
        npc.name.clone_from(name);
    }
    let mut world = Sandbox::new();

    let mut config = DialogueConfig::new();
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    let mut ui = match &options.choices {
        Some(choices) => TextUi::scripted(choices.clone()),
        None => TextUi::stdin(),
    };

    let outcome = Dialogue::new(&mut avatar, &mut npc, &mut world, registry)
        .with_config(config)
        .talk(&mut ui);

    for message in world.messages() {
        println!("  {}", message.dimmed());
    }
    if avatar.cash != options.cash {
        println!("  Cash: {} -> {}", options.cash, avatar.cash);
    }
    outcome.map_err(|e| e.to_string())
}

/// A sandbox character from JSON; missing fields take their defaults.
fn load_character(path: &Path) -> Result<Character, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid character in {}: {e}", path.display()))
}
