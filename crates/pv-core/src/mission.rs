use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::talker::TalkerId;

/// Identifier of a mission instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissionId(pub u32);

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Offered but not yet accepted.
    #[default]
    Available,
    /// Accepted and being worked on.
    InProgress,
    /// Completed successfully.
    Succeeded,
    /// Failed or abandoned.
    Failed,
}

/// A mission an NPC can hand out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Instance id.
    pub id: MissionId,
    /// Type id, e.g. `MISSION_GET_BOOK`.
    #[serde(default)]
    pub type_id: String,
    /// Display name.
    pub name: String,
    /// Cash value of the reward.
    #[serde(default)]
    pub value: i64,
    /// Current status.
    #[serde(default)]
    pub status: MissionStatus,
    /// Who the mission was assigned to.
    #[serde(default)]
    pub assigned_to: Option<TalkerId>,
    /// Whether the goal has been met.
    #[serde(default)]
    pub goal_met: bool,
    /// Goal kind, e.g. `MGOAL_FIND_ITEM`.
    #[serde(default)]
    pub goal: String,
    /// Mission type that follows this one.
    #[serde(default)]
    pub follow_up: Option<String>,
    /// Current step.
    #[serde(default)]
    pub step: i32,
    /// Lines spoken for each mission topic, keyed by topic id.
    #[serde(default)]
    pub dialogue: BTreeMap<String, String>,
}

impl Mission {
    /// Create an available mission with no dialogue.
    pub fn new(id: MissionId, name: impl Into<String>, value: i64) -> Self {
        Self {
            id,
            type_id: String::new(),
            name: name.into(),
            value,
            status: MissionStatus::Available,
            assigned_to: None,
            goal_met: false,
            goal: String::new(),
            follow_up: None,
            step: 0,
            dialogue: BTreeMap::new(),
        }
    }

    /// Add a dialogue line for a topic.
    pub fn with_dialogue(mut self, topic: impl Into<String>, line: impl Into<String>) -> Self {
        self.dialogue.insert(topic.into(), line.into());
        self
    }

    /// Set the follow-up mission type.
    pub fn with_follow_up(mut self, follow_up: impl Into<String>) -> Self {
        self.follow_up = Some(follow_up.into());
        self
    }

    /// The line for a mission topic, if any.
    pub fn dialogue_for_topic(&self, topic: &str) -> Option<&str> {
        self.dialogue
            .get(topic)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether another mission follows this one.
    pub fn has_follow_up(&self) -> bool {
        self.follow_up.is_some()
    }

    /// Whether the mission is in progress for the given speaker.
    pub fn is_assigned_to(&self, id: TalkerId) -> bool {
        self.status == MissionStatus::InProgress && self.assigned_to == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogue_lookup_ignores_empty_lines() {
        let m = Mission::new(MissionId(1), "Find a book", 500)
            .with_dialogue("TALK_MISSION_OFFER", "Find me a book.")
            .with_dialogue("TALK_MISSION_ADVICE", "");
        assert_eq!(m.dialogue_for_topic("TALK_MISSION_OFFER"), Some("Find me a book."));
        assert_eq!(m.dialogue_for_topic("TALK_MISSION_ADVICE"), None);
        assert_eq!(m.dialogue_for_topic("TALK_MISSION_SUCCESS"), None);
    }

    #[test]
    fn assignment_requires_progress() {
        let who = TalkerId::new();
        let mut m = Mission::new(MissionId(2), "Guard", 100);
        m.assigned_to = Some(who);
        assert!(!m.is_assigned_to(who));
        m.status = MissionStatus::InProgress;
        assert!(m.is_assigned_to(who));
    }

    #[test]
    fn display_id() {
        assert_eq!(MissionId(7).to_string(), "#7");
    }
}
