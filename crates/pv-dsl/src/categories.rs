//! The default topic-category table.

use pv_dialogue::TopicCategories;

const MISSION: &[&str] = &[
    "TALK_MISSION_START",
    "TALK_MISSION_DESCRIBE",
    "TALK_MISSION_OFFER",
    "TALK_MISSION_ACCEPTED",
    "TALK_MISSION_REJECTED",
    "TALK_MISSION_ADVICE",
    "TALK_MISSION_INQUIRE",
    "TALK_MISSION_SUCCESS",
    "TALK_MISSION_SUCCESS_LIE",
    "TALK_MISSION_FAILURE",
    "TALK_MISSION_REWARD",
    "TALK_MISSION_END",
    "TALK_MISSION_DESCRIBE_URGENT",
];

const EQUIPMENT: &[&str] = &["TALK_SHARE_EQUIPMENT", "TALK_GIVE_EQUIPMENT", "TALK_DENY_EQUIPMENT"];

const FOLLOW: &[&str] = &["TALK_SUGGEST_FOLLOW", "TALK_AGREE_FOLLOW", "TALK_DENY_FOLLOW"];

const TRAINING: &[&str] = &[
    "TALK_TRAIN",
    "TALK_TRAIN_START",
    "TALK_TRAIN_FORCE",
    "TALK_TRAIN_NPC_START",
    "TALK_TRAIN_NPC_FORCE",
];

const FRIEND: &[&str] = &["TALK_FRIEND", "TALK_GIVE_ITEM", "TALK_USE_ITEM"];

const SIDE_TOPICS: &[&str] = &["TALK_SIZE_UP", "TALK_LOOK_AT", "TALK_OPINION", "TALK_SHOUT"];

/// Categories for the built-in topic families.
///
/// Documents extend this with `topic_category` objects.
pub fn default_categories() -> TopicCategories {
    TopicCategories::new()
        .with_category(1, MISSION.iter().copied())
        .with_category(2, EQUIPMENT.iter().copied())
        .with_category(3, FOLLOW.iter().copied())
        .with_category(4, ["TALK_COMBAT_ENGAGEMENT"])
        .with_category(5, ["TALK_COMBAT_COMMANDS"])
        .with_category(6, TRAINING.iter().copied())
        .with_category(7, ["TALK_MISC_RULES"])
        .with_category(8, ["TALK_AIM_RULES"])
        .with_category(9, FRIEND.iter().copied())
        .with_category(99, SIDE_TOPICS.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_share_a_category() {
        let categories = default_categories();
        assert_eq!(categories.category("TALK_MISSION_OFFER"), Some(1));
        assert_eq!(categories.category("TALK_MISSION_ACCEPTED"), Some(1));
        assert_eq!(categories.category("TALK_TRAIN_START"), Some(6));
        assert_eq!(categories.category("TALK_SHOUT"), Some(99));
        assert_eq!(categories.category("TALK_STRANGER_NEUTRAL"), None);
    }
}
