//! Shared fixtures for unit tests.

use std::sync::Arc;

use pv_core::sandbox::{Character, Sandbox};

use crate::config::DialogueConfig;
use crate::dialogue::Dialogue;
use crate::registry::TopicRegistry;

/// Two speakers, a world, and a registry, ready to talk.
pub(crate) struct Fixture {
    pub alpha: Character,
    pub beta: Character,
    pub world: Sandbox,
    pub registry: Arc<TopicRegistry>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_registry(TopicRegistry::default())
    }

    pub fn with_registry(registry: TopicRegistry) -> Self {
        Self {
            alpha: Character::avatar("Ash"),
            beta: Character::npc("Bree", "TALK_BREE"),
            world: Sandbox::new(),
            registry: Arc::new(registry),
        }
    }

    pub fn dialogue(&mut self) -> Dialogue<'_> {
        Dialogue::new(
            &mut self.alpha,
            &mut self.beta,
            &mut self.world,
            Arc::clone(&self.registry),
        )
        .with_config(DialogueConfig::new().with_seed(42))
    }
}
