//! The topic registry and its process-wide load/unload lifecycle.
//!
//! A registry is built once by the document compiler and then shared
//! read-only by every conversation through an [`Arc`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::TopicCategories;
use crate::eoc::EffectOnCondition;
use crate::error::{DialogueError, DialogueResult};
use crate::topic::TopicDef;

/// A piece of flavor text in a snippet category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Stable id, used to pin a snippet on a speaker.
    pub id: String,
    /// The text.
    pub text: String,
}

impl Snippet {
    /// Create a snippet.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Every compiled document object, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    topics: BTreeMap<String, TopicDef>,
    eocs: BTreeMap<String, EffectOnCondition>,
    snippets: BTreeMap<String, Vec<Snippet>>,
    categories: TopicCategories,
}

impl TopicRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a topic, merging into an existing definition with the same id.
    pub fn insert_topic(&mut self, topic: TopicDef) {
        match self.topics.get_mut(&topic.id) {
            Some(existing) => existing.merge(topic),
            None => {
                self.topics.insert(topic.id.clone(), topic);
            }
        }
    }

    /// Add an effect-on-condition, replacing one with the same id.
    pub fn insert_eoc(&mut self, eoc: EffectOnCondition) {
        if self.eocs.contains_key(&eoc.id) {
            tracing::debug!(eoc = %eoc.id, "replacing effect_on_condition");
        }
        self.eocs.insert(eoc.id.clone(), eoc);
    }

    /// Add a snippet to a category.
    pub fn insert_snippet(&mut self, category: impl Into<String>, snippet: Snippet) {
        self.snippets.entry(category.into()).or_default().push(snippet);
    }

    /// Merge a category table into this registry's.
    pub fn add_categories(&mut self, categories: &TopicCategories) {
        self.categories.extend(categories);
    }

    /// A topic by id.
    pub fn topic(&self, id: &str) -> Option<&TopicDef> {
        self.topics.get(id)
    }

    /// An effect-on-condition by id.
    pub fn eoc(&self, id: &str) -> Option<&EffectOnCondition> {
        self.eocs.get(id)
    }

    /// Every snippet in a category, in load order.
    pub fn snippets(&self, category: &str) -> &[Snippet] {
        self.snippets.get(category).map_or(&[], Vec::as_slice)
    }

    /// Whether a snippet category exists.
    pub fn has_snippet_category(&self, category: &str) -> bool {
        self.snippets.contains_key(category)
    }

    /// A snippet by id, from any category.
    pub fn snippet(&self, id: &str) -> Option<&Snippet> {
        self.snippets.values().flatten().find(|s| s.id == id)
    }

    /// The grouping table used for back navigation.
    pub fn categories(&self) -> &TopicCategories {
        &self.categories
    }

    /// All topic ids, sorted.
    pub fn topic_ids(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// All effect-on-condition ids, sorted.
    pub fn eoc_ids(&self) -> impl Iterator<Item = &str> {
        self.eocs.keys().map(String::as_str)
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether no topic is loaded.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topic ids directly reachable from `id` through its document responses.
    pub fn reachable_topics(&self, id: &str, only_unconditional: bool) -> DialogueResult<BTreeSet<String>> {
        self.topic(id)
            .map(|t| t.reachable_topics(only_unconditional))
            .ok_or_else(|| DialogueError::TopicNotFound(id.to_string()))
    }
}

static LOADED: RwLock<Option<Arc<TopicRegistry>>> = RwLock::new(None);

/// Install the process-wide registry. Fails if one is already installed.
pub fn install(registry: TopicRegistry) -> DialogueResult<Arc<TopicRegistry>> {
    let mut slot = LOADED.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(DialogueError::RegistryAlreadyLoaded);
    }
    let shared = Arc::new(registry);
    *slot = Some(Arc::clone(&shared));
    tracing::info!(topics = shared.len(), "topic registry loaded");
    Ok(shared)
}

/// The installed registry.
pub fn current() -> DialogueResult<Arc<TopicRegistry>> {
    LOADED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(DialogueError::RegistryNotLoaded)
}

/// Remove the installed registry, returning it.
///
/// Conversations already holding the registry keep their copy.
pub fn unload() -> Option<Arc<TopicRegistry>> {
    let taken = LOADED.write().unwrap_or_else(PoisonError::into_inner).take();
    if taken.is_some() {
        tracing::info!("topic registry unloaded");
    }
    taken
}
