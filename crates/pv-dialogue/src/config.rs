//! Dialogue configuration.

use std::collections::BTreeMap;

/// Groups topic ids for "back" navigation.
///
/// When a response leads to `TALK_NONE`, the session pops the current topic and
/// keeps popping while the new top shares its category. Topics without a
/// category are never grouped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicCategories {
    by_topic: BTreeMap<String, i32>,
}

impl TopicCategories {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put every topic in `topics` into `category`.
    pub fn with_category<I, S>(mut self, category: i32, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(category, topics);
        self
    }

    /// Put every topic in `topics` into `category`, replacing earlier entries.
    pub fn insert<I, S>(&mut self, category: i32, topics: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for topic in topics {
            self.by_topic.insert(topic.into(), category);
        }
    }

    /// Merge another table into this one; entries in `other` win.
    pub fn extend(&mut self, other: &TopicCategories) {
        for (topic, category) in &other.by_topic {
            self.by_topic.insert(topic.clone(), *category);
        }
    }

    /// The category of a topic, if it has one.
    pub fn category(&self, topic: &str) -> Option<i32> {
        self.by_topic.get(topic).copied()
    }

    /// Number of categorized topics.
    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    /// Whether no topic is categorized.
    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}

/// Settings for a dialogue session.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// Seed for the session RNG; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Trait that makes every trial succeed and offers mind control.
    pub mind_control_trait: String,
    /// Activities left running when the conversation ends.
    pub kept_activities: Vec<String>,
    /// The effect on the NPC that suppresses the cancel-activity prompt.
    pub busy_effect: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            seed: None,
            mind_control_trait: "DEBUG_MIND_CONTROL".to_string(),
            kept_activities: vec![
                "ACT_TRAIN".to_string(),
                "ACT_WAIT_NPC".to_string(),
                "ACT_SOCIALIZE".to_string(),
            ],
            busy_effect: "under_operation".to_string(),
        }
    }
}

impl DialogueConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the mind control trait id.
    pub fn with_mind_control_trait(mut self, id: impl Into<String>) -> Self {
        self.mind_control_trait = id.into();
        self
    }

    /// Set the activities that survive the end of a conversation.
    pub fn with_kept_activities<I, S>(mut self, activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kept_activities = activities.into_iter().map(Into::into).collect();
        self
    }

    /// Whether an activity survives the end of a conversation.
    pub fn keeps_activity(&self, activity: &str) -> bool {
        self.kept_activities.iter().any(|a| a == activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = DialogueConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.mind_control_trait, "DEBUG_MIND_CONTROL");
        assert!(config.keeps_activity("ACT_TRAIN"));
        assert!(config.keeps_activity("ACT_SOCIALIZE"));
        assert!(!config.keeps_activity("ACT_READ"));
    }

    #[test]
    fn config_builder_chain() {
        let config = DialogueConfig::new()
            .with_seed(7)
            .with_mind_control_trait("PSI")
            .with_kept_activities(["ACT_READ"]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.mind_control_trait, "PSI");
        assert!(config.keeps_activity("ACT_READ"));
        assert!(!config.keeps_activity("ACT_TRAIN"));
    }

    #[test]
    fn categories_merge() {
        let mut base = TopicCategories::new().with_category(1, ["TALK_MISSION_LIST", "TALK_MISSION_OFFER"]);
        let extra = TopicCategories::new().with_category(7, ["TALK_MISSION_OFFER", "TALK_CAMP"]);
        base.extend(&extra);
        assert_eq!(base.category("TALK_MISSION_LIST"), Some(1));
        assert_eq!(base.category("TALK_MISSION_OFFER"), Some(7));
        assert_eq!(base.category("TALK_CAMP"), Some(7));
        assert_eq!(base.category("TALK_FRIEND"), None);
        assert_eq!(base.len(), 3);
    }
}
