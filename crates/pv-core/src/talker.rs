//! The actor facade.
//!
//! A [`Talker`] is a capability handle over whoever takes part in a
//! conversation: the avatar, an NPC, or something inert such as a computer
//! terminal. Every method except identity and variables has a neutral default,
//! so an inert participant implements only what it supports.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::NamedAction;
use crate::item::Item;
use crate::mission::{Mission, MissionId};
use crate::opinion::Opinion;
use crate::stat::Stat;
use crate::time::TimeDuration;
use crate::world::Tripoint;

/// Unique identifier of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TalkerId(pub Uuid);

impl TalkerId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TalkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TalkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Grammatical gender used for pronouns and gendered lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Masculine.
    Male,
    /// Feminine.
    Female,
    /// Neither.
    #[default]
    Neutral,
}

impl Gender {
    /// Capitalized subject pronoun.
    pub fn pronoun(self) -> &'static str {
        match self {
            Self::Male => "He",
            Self::Female => "She",
            Self::Neutral => "They",
        }
    }

    /// Document key for this gender.
    pub fn key(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Neutral => "neutral",
        }
    }
}

/// What kind of thing a training session teaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingKind {
    /// A skill.
    Skill,
    /// A martial art style.
    Style,
    /// A spell.
    Spell,
    /// A proficiency.
    Proficiency,
}

impl fmt::Display for TrainingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skill => write!(f, "skill"),
            Self::Style => write!(f, "style"),
            Self::Spell => write!(f, "spell"),
            Self::Proficiency => write!(f, "proficiency"),
        }
    }
}

/// One thing a speaker can teach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Training {
    /// What is taught.
    pub kind: TrainingKind,
    /// Skill, style, spell, or proficiency id.
    pub id: String,
    /// Price of a session.
    #[serde(default)]
    pub cost: i64,
}

impl Training {
    /// Create a training offer.
    pub fn new(kind: TrainingKind, id: impl Into<String>, cost: i64) -> Self {
        Self {
            kind,
            id: id.into(),
            cost,
        }
    }

    /// The response text offered for this training.
    pub fn offer_text(&self) -> String {
        if self.cost > 0 {
            format!("{} ({}): {}", self.id, self.kind, self.cost)
        } else {
            format!("{} ({})", self.id, self.kind)
        }
    }
}

/// A status effect to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectGrant {
    /// Effect id.
    pub id: String,
    /// How long it lasts.
    pub duration: TimeDuration,
    /// Intensity.
    pub intensity: i32,
    /// Body part, if targeted.
    pub target_part: Option<String>,
    /// Apply even if immune.
    pub force: bool,
}

/// A morale change to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoraleChange {
    /// Morale type id.
    pub morale_type: String,
    /// Bonus added now.
    pub bonus: i32,
    /// Upper bound of the accumulated bonus.
    pub max_bonus: i32,
    /// How long it lasts.
    pub duration: TimeDuration,
    /// When it starts to decay.
    pub decay_start: TimeDuration,
    /// Whether the bonus is capped at `max_bonus`.
    pub capped: bool,
}

/// A named follower rule slot with a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSlot {
    /// When to engage enemies.
    Engagement,
    /// How carefully to aim.
    Aim,
    /// Bionic power reserve.
    CbmReserve,
    /// Bionic recharge threshold.
    CbmRecharge,
}

/// A change to an NPC's follower rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleChange {
    /// Flip a flag rule.
    Toggle(String),
    /// Set a flag rule.
    Set(String),
    /// Clear a flag rule.
    Clear(String),
    /// Assign a slot rule.
    Slot(RuleSlot, String),
}

/// Personality traits used to pick an opening topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    /// Willingness to fight.
    pub aggression: i32,
    /// Courage.
    pub bravery: i32,
    /// Tendency to hoard.
    pub collector: i32,
    /// Willingness to help.
    pub altruism: i32,
}

/// The actor facade.
///
/// The engine calls only this surface, never a concrete entity type.
pub trait Talker {
    // ---- identity ----

    /// Unique id.
    fn id(&self) -> TalkerId;

    /// Name shown in the conversation.
    fn disp_name(&self) -> String;

    /// Whether this is an NPC (as opposed to the avatar or an object).
    fn is_npc(&self) -> bool {
        false
    }

    /// Whether the speaker is alive.
    fn is_alive(&self) -> bool {
        true
    }

    /// Grammatical gender.
    fn gender(&self) -> Gender {
        Gender::Neutral
    }

    // ---- variables ----

    /// Read a variable.
    fn get_value(&self, key: &str) -> Option<String>;

    /// Write a variable.
    fn set_value(&mut self, key: &str, value: &str);

    /// Remove a variable.
    fn remove_value(&mut self, key: &str);

    // ---- traits, effects, bionics ----

    /// Whether the speaker has a trait.
    fn has_trait(&self, _id: &str) -> bool {
        false
    }

    /// Add a trait.
    fn add_trait(&mut self, _id: &str) {}

    /// Remove a trait.
    fn remove_trait(&mut self, _id: &str) {}

    /// Intensity of an active status effect, if any.
    fn effect_intensity(&self, _id: &str) -> Option<i32> {
        None
    }

    /// Whether a status effect is active.
    fn has_effect(&self, id: &str) -> bool {
        self.effect_intensity(id).is_some()
    }

    /// Apply a status effect.
    fn add_effect(&mut self, _grant: EffectGrant) {}

    /// Remove a status effect.
    fn remove_effect(&mut self, _id: &str, _target_part: Option<&str>) {}

    /// Whether a bionic is installed.
    fn has_bionic(&self, _id: &str) -> bool {
        false
    }

    /// Install a bionic.
    fn add_bionic(&mut self, _id: &str) {}

    /// Remove a bionic.
    fn remove_bionic(&mut self, _id: &str) {}

    // ---- skills & knowledge ----

    /// Level of a skill.
    fn skill_level(&self, _skill: &str) -> i32 {
        0
    }

    /// Set the level of a skill.
    fn set_skill_level(&mut self, _skill: &str, _level: i32) {}

    /// Practice a skill.
    fn practice(&mut self, _skill: &str, _amount: i32) {}

    /// Whether a recipe is known.
    fn knows_recipe(&self, _id: &str) -> bool {
        false
    }

    /// Learn a recipe.
    fn learn_recipe(&mut self, _id: &str) {}

    /// Chance modifier this speaker contributes to a trial kind
    /// (`lie`, `persuade`, `intimidate`).
    fn trial_chance_mod(&self, _trial: &str) -> i32 {
        0
    }

    /// Contribution of one named trial modifier.
    fn parse_mod(&self, _attribute: &str, _factor: i32) -> i32 {
        0
    }

    /// Trainings this speaker offers.
    fn training_offers(&self) -> Vec<Training> {
        Vec::new()
    }

    /// Remember the training chosen in the last response.
    fn store_chosen_training(&mut self, _training: Option<Training>) {}

    /// A training session this speaker was interrupted in and can resume.
    fn interrupted_training(&self) -> Option<Training> {
        None
    }

    // ---- stats ----

    /// Read a named stat.
    fn stat(&self, _stat: Stat) -> i64 {
        0
    }

    /// Assign a named stat.
    fn set_stat(&mut self, _stat: Stat, _value: i64) {}

    // ---- items & currency ----

    /// Total charges of an item type.
    fn charges_of(&self, _item: &str) -> i64 {
        0
    }

    /// Whether at least `count` items of a type are held.
    fn has_amount(&self, _item: &str, _count: i64) -> bool {
        false
    }

    /// Remove charges of an item type, returning the removed items.
    fn use_charges(&mut self, _item: &str, _count: i64) -> Vec<Item> {
        Vec::new()
    }

    /// Remove items of a type, returning the removed items.
    fn use_amount(&mut self, _item: &str, _count: i64) -> Vec<Item> {
        Vec::new()
    }

    /// Add an item to the inventory.
    fn i_add(&mut self, _item: Item) {}

    /// Type ids of held items in a category, one entry per item.
    ///
    /// With `include_containers`, containers whose contents match also count.
    fn items_in_category(&self, _category: &str, _include_containers: bool) -> Vec<String> {
        Vec::new()
    }

    /// Name of the wielded weapon, if any.
    fn weapon_name(&self) -> Option<String> {
        None
    }

    /// Name of the loaded ammunition, if any.
    fn ammo_name(&self) -> Option<String> {
        None
    }

    /// Whether the wielded weapon can be put away.
    fn can_stow_weapon(&self) -> bool {
        false
    }

    /// Cash on hand.
    fn cash(&self) -> i64 {
        0
    }

    /// Set cash on hand.
    fn set_cash(&mut self, _cash: i64) {}

    /// What this NPC owes the other speaker.
    fn debt(&self) -> i64 {
        0
    }

    /// Change what this NPC owes the other speaker.
    fn add_debt(&mut self, _amount: i64) {}

    /// Give an item to this NPC; returns the NPC's reply.
    fn receive_gift(&mut self, _to_use: bool) -> String {
        String::new()
    }

    // ---- position ----

    /// Current position.
    fn pos(&self) -> Tripoint {
        Tripoint::default()
    }

    /// Move to a position.
    fn set_pos(&mut self, _pos: Tripoint) {}

    /// Whether the speaker is driving a vehicle.
    fn is_driving(&self) -> bool {
        false
    }

    /// Whether the speaker is riding a mount.
    fn is_riding(&self) -> bool {
        false
    }

    // ---- social ----

    /// Faction id.
    fn faction(&self) -> Option<String> {
        None
    }

    /// Join a faction.
    fn set_faction(&mut self, _faction: &str) {}

    /// Change NPC class.
    fn set_class(&mut self, _class: &str) {}

    /// Trust of this speaker's faction towards the avatar.
    fn faction_trust(&self) -> i32 {
        0
    }

    /// Change the trust of this speaker's faction.
    fn add_faction_trust(&mut self, _amount: i32) {}

    /// Opinion of the other speaker.
    fn opinion(&self) -> Opinion {
        Opinion::default()
    }

    /// Adjust the opinion of the other speaker.
    fn add_opinion(&mut self, _delta: Opinion) {}

    /// Whether adding `anger` would make this NPC hostile.
    fn check_hostile_response(&self, _anger: i32) -> bool {
        false
    }

    /// Whether this NPC's disposition has become hostile.
    fn turned_hostile(&self) -> bool {
        false
    }

    /// Make this NPC hostile.
    fn make_angry(&mut self) {}

    /// Personality traits.
    fn personality(&self) -> Personality {
        Personality::default()
    }

    /// Set the NPC attitude (`mug`, `null`, `follow`, ...).
    fn set_attitude(&mut self, _attitude: &str) {}

    /// Whether the NPC is an ally of the avatar.
    fn is_ally(&self) -> bool {
        false
    }

    /// Whether the NPC is following the avatar.
    fn is_following(&self) -> bool {
        false
    }

    /// Whether the NPC is friendly.
    fn is_friendly(&self) -> bool {
        false
    }

    /// Whether the NPC is hostile.
    fn is_enemy(&self) -> bool {
        false
    }

    /// Whether the NPC is free to take on a task.
    fn is_available(&self) -> bool {
        true
    }

    // ---- speech ----

    /// Farewell line.
    fn bye_line(&self) -> String {
        "Bye.".to_string()
    }

    /// Topics a conversation with this speaker starts on, bottom first.
    fn topics(&self, _by_radio: bool) -> Vec<String> {
        vec!["TALK_NONE".to_string()]
    }

    /// Change the first topic of future conversations.
    fn set_first_topic(&mut self, _topic: &str) {}

    /// Say something aloud.
    fn say(&mut self, _text: &str) {}

    /// Yell.
    fn shout(&mut self) {}

    /// Whether the speaker cannot hear.
    fn is_deaf(&self) -> bool {
        false
    }

    /// Whether the speaker cannot talk.
    fn is_mute(&self) -> bool {
        false
    }

    /// A short visual description.
    fn short_description(&self) -> String {
        String::new()
    }

    /// A size-up of this speaker's stats.
    fn evaluation(&self) -> String {
        String::new()
    }

    /// A description of this NPC's opinion.
    fn opinion_text(&self) -> String {
        String::new()
    }

    /// How far it is to the current travel goal.
    fn distance_to_goal(&self) -> String {
        String::new()
    }

    /// What this NPC is currently assigned to.
    fn job_description(&self) -> String {
        String::new()
    }

    /// Take over this NPC's mind. Returns whether it worked.
    fn enslave_mind(&mut self) -> bool {
        false
    }

    // ---- missions ----

    /// A mission by id.
    fn mission(&self, _id: MissionId) -> Option<Mission> {
        None
    }

    /// The mission currently under discussion.
    fn selected_mission(&self) -> Option<MissionId> {
        None
    }

    /// Select a mission for discussion.
    fn select_mission(&mut self, _id: Option<MissionId>) {}

    /// Missions this NPC can hand out.
    fn available_missions(&self) -> Vec<MissionId> {
        Vec::new()
    }

    /// Missions this NPC has handed out and that are in progress.
    fn assigned_missions(&self) -> Vec<MissionId> {
        Vec::new()
    }

    /// Hand a mission to another speaker.
    fn assign_mission(&mut self, _id: MissionId, _to: TalkerId) {}

    /// Finish a mission.
    fn finish_mission(&mut self, _id: MissionId, _success: bool) {}

    /// Advance a mission to a step.
    fn step_mission(&mut self, _id: MissionId, _step: i32) {}

    /// Create a new mission of a type.
    fn add_mission(&mut self, _mission_type: &str) {}

    // ---- activities, morale, health ----

    /// Current activity id.
    fn activity(&self) -> Option<String> {
        None
    }

    /// Id of the first postponed activity.
    fn backlog_front(&self) -> Option<String> {
        None
    }

    /// Start an activity.
    fn assign_activity(&mut self, _id: &str, _duration: TimeDuration) {}

    /// Drop the current activity.
    fn cancel_activity(&mut self) {}

    /// Add morale.
    fn add_morale(&mut self, _change: MoraleChange) {}

    /// Remove morale of a type.
    fn remove_morale(&mut self, _morale_type: &str) {}

    /// Adjust the hidden health modifier, never past `cap`.
    fn mod_healthy(&mut self, _amount: i32, _cap: i32) {}

    /// Make the speaker wet.
    fn add_wet(&mut self, _amount: i32) {}

    // ---- NPC behaviour ----

    /// Whether a flag rule is set.
    fn has_rule(&self, _rule: &str) -> bool {
        false
    }

    /// Value of a slot rule.
    fn rule_slot(&self, _slot: RuleSlot) -> Option<String> {
        None
    }

    /// Change a follower rule.
    fn change_rule(&mut self, _change: RuleChange) {}

    /// Set a travel goal.
    fn set_goal(&mut self, _location: &str) {}

    /// Cast a spell.
    fn cast_spell(&mut self, _spell: &str) {}

    /// Perform a named action.
    fn perform(&mut self, action: NamedAction) {
        tracing::debug!(action = %action, "named action ignored by talker");
    }
}
