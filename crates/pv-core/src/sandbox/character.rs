use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::action::NamedAction;
use crate::item::Item;
use crate::mission::{Mission, MissionId, MissionStatus};
use crate::opinion::Opinion;
use crate::stat::Stat;
use crate::talker::{
    EffectGrant, Gender, MoraleChange, Personality, RuleChange, RuleSlot, Talker, TalkerId,
    Training,
};
use crate::time::TimeDuration;
use crate::vars::VarStore;
use crate::world::Tripoint;

/// Healthy calorie reserve per percentage point.
const KCAL_PER_PERCENT: i64 = 5500;

/// A speaker whose whole state lives in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    /// Unique id.
    pub id: TalkerId,
    /// Display name.
    pub name: String,
    /// Whether this is an NPC.
    pub npc: bool,
    /// Grammatical gender.
    pub gender: Gender,
    /// Whether alive.
    pub alive: bool,
    /// Variables.
    pub vars: VarStore,
    /// Traits.
    pub traits: BTreeSet<String>,
    /// Active status effects and their intensity.
    pub effects: BTreeMap<String, i32>,
    /// Installed bionics.
    pub bionics: BTreeSet<String>,
    /// Skill levels.
    pub skills: BTreeMap<String, i32>,
    /// Accumulated practice per skill.
    pub practice: BTreeMap<String, i32>,
    /// Known recipes.
    pub recipes: BTreeSet<String>,
    /// Named stats.
    pub stats: BTreeMap<Stat, i64>,
    /// Explicit trial chance modifiers by trial kind.
    pub trial_mods: BTreeMap<String, i32>,
    /// Inventory.
    pub inventory: Vec<Item>,
    /// Wielded weapon name.
    pub weapon: Option<String>,
    /// Loaded ammunition name.
    pub ammo: Option<String>,
    /// Cash on hand.
    pub cash: i64,
    /// What this NPC owes the avatar.
    pub debt: i64,
    /// Position.
    pub pos: Tripoint,
    /// Faction id.
    pub faction: Option<String>,
    /// NPC class.
    pub class: Option<String>,
    /// Trust of the faction towards the avatar.
    pub faction_trust: i32,
    /// Opinion of the other speaker.
    pub opinion: Opinion,
    /// Anger at or above which the NPC turns hostile.
    pub anger_threshold: i32,
    /// Attitude.
    pub attitude: String,
    /// Personality.
    pub personality: Personality,
    /// Whether an ally of the avatar.
    pub ally: bool,
    /// Whether following the avatar.
    pub following: bool,
    /// Whether friendly.
    pub friendly: bool,
    /// Whether deaf.
    pub deaf: bool,
    /// Whether mute.
    pub mute: bool,
    /// Farewell line.
    pub bye: String,
    /// First topic of a conversation.
    pub first_topic: String,
    /// Short description.
    pub description: String,
    /// Missions this NPC hands out.
    pub missions: Vec<Mission>,
    /// The mission under discussion.
    pub selected_mission: Option<MissionId>,
    /// Trainings offered.
    pub trainings: Vec<Training>,
    /// Training chosen in the last response.
    pub chosen_training: Option<Training>,
    /// Current activity.
    pub activity: Option<String>,
    /// Postponed activities.
    pub backlog: Vec<String>,
    /// Morale bonuses by type.
    pub morale: BTreeMap<String, i32>,
    /// Hidden health modifier.
    pub healthy: i32,
    /// Wetness.
    pub wetness: i32,
    /// Flag rules that are set.
    pub rules: BTreeSet<String>,
    /// Slot rules.
    pub rule_slots: BTreeMap<RuleSlot, String>,
    /// Travel goal.
    pub goal: Option<String>,
    /// Spells cast, in order.
    pub spells_cast: Vec<String>,
    /// Named actions performed, in order.
    pub performed: Vec<NamedAction>,
    /// Lines said aloud, in order.
    pub said: Vec<String>,
    /// Next mission id for missions created at runtime.
    pub next_mission: u32,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            id: TalkerId::new(),
            name: String::new(),
            npc: false,
            gender: Gender::Neutral,
            alive: true,
            vars: VarStore::new(),
            traits: BTreeSet::new(),
            effects: BTreeMap::new(),
            bionics: BTreeSet::new(),
            skills: BTreeMap::new(),
            practice: BTreeMap::new(),
            recipes: BTreeSet::new(),
            stats: BTreeMap::new(),
            trial_mods: BTreeMap::new(),
            inventory: Vec::new(),
            weapon: None,
            ammo: None,
            cash: 0,
            debt: 0,
            pos: Tripoint::default(),
            faction: None,
            class: None,
            faction_trust: 0,
            opinion: Opinion::default(),
            anger_threshold: 10,
            attitude: "null".to_string(),
            personality: Personality::default(),
            ally: false,
            following: false,
            friendly: false,
            deaf: false,
            mute: false,
            bye: "Bye.".to_string(),
            first_topic: "TALK_NONE".to_string(),
            description: String::new(),
            missions: Vec::new(),
            selected_mission: None,
            trainings: Vec::new(),
            chosen_training: None,
            activity: None,
            backlog: Vec::new(),
            morale: BTreeMap::new(),
            healthy: 0,
            wetness: 0,
            rules: BTreeSet::new(),
            rule_slots: BTreeMap::new(),
            goal: None,
            spells_cast: Vec::new(),
            performed: Vec::new(),
            said: Vec::new(),
            next_mission: 1000,
        }
    }
}

impl Character {
    /// Create the avatar.
    pub fn avatar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an NPC that opens conversations on `first_topic`.
    pub fn npc(name: impl Into<String>, first_topic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            npc: true,
            first_topic: first_topic.into(),
            ..Self::default()
        }
    }

    /// Set cash on hand.
    pub fn with_cash(mut self, cash: i64) -> Self {
        self.cash = cash;
        self
    }

    /// Add an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.inventory.push(item);
        self
    }

    /// Add a trait.
    pub fn with_trait(mut self, id: impl Into<String>) -> Self {
        self.traits.insert(id.into());
        self
    }

    /// Set a skill level.
    pub fn with_skill(mut self, skill: impl Into<String>, level: i32) -> Self {
        self.skills.insert(skill.into(), level);
        self
    }

    /// Add a mission.
    pub fn with_mission(mut self, mission: Mission) -> Self {
        self.missions.push(mission);
        self
    }

    /// Set the gender.
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    fn mission_mut(&mut self, id: MissionId) -> Option<&mut Mission> {
        self.missions.iter_mut().find(|m| m.id == id)
    }

    fn total_morale(&self) -> i64 {
        self.morale.values().map(|v| i64::from(*v)).sum()
    }

    fn stat_or(&self, stat: Stat, default: i64) -> i64 {
        self.stats.get(&stat).copied().unwrap_or(default)
    }
}

impl Talker for Character {
    fn id(&self) -> TalkerId {
        self.id
    }

    fn disp_name(&self) -> String {
        self.name.clone()
    }

    fn is_npc(&self) -> bool {
        self.npc
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn gender(&self) -> Gender {
        self.gender
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.vars.get(key).map(str::to_string)
    }

    fn set_value(&mut self, key: &str, value: &str) {
        self.vars.set(key, value);
    }

    fn remove_value(&mut self, key: &str) {
        self.vars.remove(key);
    }

    fn has_trait(&self, id: &str) -> bool {
        self.traits.contains(id)
    }

    fn add_trait(&mut self, id: &str) {
        self.traits.insert(id.to_string());
    }

    fn remove_trait(&mut self, id: &str) {
        self.traits.remove(id);
    }

    fn effect_intensity(&self, id: &str) -> Option<i32> {
        self.effects.get(id).copied()
    }

    fn add_effect(&mut self, grant: EffectGrant) {
        let intensity = grant.intensity.max(1);
        self.effects
            .entry(grant.id)
            .and_modify(|i| *i = (*i).max(intensity))
            .or_insert(intensity);
    }

    fn remove_effect(&mut self, id: &str, _target_part: Option<&str>) {
        self.effects.remove(id);
    }

    fn has_bionic(&self, id: &str) -> bool {
        self.bionics.contains(id)
    }

    fn add_bionic(&mut self, id: &str) {
        self.bionics.insert(id.to_string());
    }

    fn remove_bionic(&mut self, id: &str) {
        self.bionics.remove(id);
    }

    fn skill_level(&self, skill: &str) -> i32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    fn set_skill_level(&mut self, skill: &str, level: i32) {
        self.skills.insert(skill.to_string(), level);
    }

    fn practice(&mut self, skill: &str, amount: i32) {
        let practiced = self.practice.entry(skill.to_string()).or_insert(0);
        *practiced = practiced.saturating_add(amount);
    }

    fn knows_recipe(&self, id: &str) -> bool {
        self.recipes.contains(id)
    }

    fn learn_recipe(&mut self, id: &str) {
        self.recipes.insert(id.to_string());
    }

    fn trial_chance_mod(&self, trial: &str) -> i32 {
        self.trial_mods.get(trial).copied().unwrap_or(0)
    }

    fn parse_mod(&self, attribute: &str, factor: i32) -> i32 {
        let base = match attribute {
            "ANGER" => self.opinion.anger,
            "FEAR" => self.opinion.fear,
            "TRUST" => self.opinion.trust,
            "VALUE" => self.opinion.value,
            "AGGRESSION" => self.personality.aggression,
            "ALTRUISM" => self.personality.altruism,
            "BRAVERY" => self.personality.bravery,
            "COLLECTOR" => self.personality.collector,
            skill => self.skill_level(skill),
        };
        base.saturating_mul(factor)
    }

    fn training_offers(&self) -> Vec<Training> {
        self.trainings.clone()
    }

    fn store_chosen_training(&mut self, training: Option<Training>) {
        self.chosen_training = training;
    }

    fn interrupted_training(&self) -> Option<Training> {
        match self.backlog.first() {
            Some(act) if act == "ACT_TRAIN" => self.chosen_training.clone(),
            _ => None,
        }
    }

    fn stat(&self, stat: Stat) -> i64 {
        match stat {
            Stat::PosX => i64::from(self.pos.x),
            Stat::PosY => i64::from(self.pos.y),
            Stat::PosZ => i64::from(self.pos.z),
            Stat::Owed => self.debt,
            Stat::Cash => self.cash,
            Stat::Anger => i64::from(self.opinion.anger),
            Stat::Morale => self.total_morale(),
            Stat::PowerPercentage => {
                let max = self.stat_or(Stat::PowerMax, 0);
                self.stat_or(Stat::Power, 0)
                    .saturating_mul(100)
                    .checked_div(max)
                    .unwrap_or(0)
            }
            Stat::ManaPercentage => {
                let max = self.stat_or(Stat::ManaMax, 0);
                self.stat_or(Stat::Mana, 0)
                    .saturating_mul(100)
                    .checked_div(max)
                    .unwrap_or(0)
            }
            Stat::StoredKcalPercentage => self.stat_or(Stat::StoredKcal, 0) / KCAL_PER_PERCENT,
            other => self.stat_or(other, 0),
        }
    }

    fn set_stat(&mut self, stat: Stat, value: i64) {
        let clamp_i32 = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        match stat {
            Stat::PosX => self.pos.x = clamp_i32(value),
            Stat::PosY => self.pos.y = clamp_i32(value),
            Stat::PosZ => self.pos.z = clamp_i32(value),
            Stat::Owed => self.debt = value,
            Stat::Anger => self.opinion.anger = clamp_i32(value),
            Stat::Morale => {
                let delta = value.saturating_sub(self.total_morale());
                let entry = self.morale.entry("morale_perm_debug".to_string()).or_insert(0);
                *entry = entry.saturating_add(clamp_i32(delta));
            }
            Stat::PowerPercentage => {
                let max = self.stat_or(Stat::PowerMax, 0);
                self.stats.insert(Stat::Power, max.saturating_mul(value) / 100);
            }
            Stat::ManaPercentage => {
                let max = self.stat_or(Stat::ManaMax, 0);
                self.stats.insert(Stat::Mana, max.saturating_mul(value) / 100);
            }
            Stat::StoredKcalPercentage => {
                self.stats.insert(Stat::StoredKcal, value.saturating_mul(KCAL_PER_PERCENT));
            }
            other => {
                self.stats.insert(other, value);
            }
        }
    }

    fn charges_of(&self, item: &str) -> i64 {
        self.inventory
            .iter()
            .filter(|i| i.type_id == item)
            .fold(0i64, |sum, i| sum.saturating_add(i.charges))
    }

    fn has_amount(&self, item: &str, count: i64) -> bool {
        self.inventory.iter().filter(|i| i.type_id == item).count() as i64 >= count
    }

    fn use_charges(&mut self, item: &str, count: i64) -> Vec<Item> {
        let mut remaining = count;
        let mut used = Vec::new();
        for held in self.inventory.iter_mut().filter(|i| i.type_id == item) {
            if remaining <= 0 {
                break;
            }
            let take = held.charges.min(remaining);
            held.charges -= take;
            remaining -= take;
            used.push(held.clone().with_charges(take));
        }
        self.inventory.retain(|i| i.type_id != item || i.charges > 0);
        used
    }

    fn use_amount(&mut self, item: &str, count: i64) -> Vec<Item> {
        let mut used = Vec::new();
        let mut kept = Vec::with_capacity(self.inventory.len());
        for held in self.inventory.drain(..) {
            if held.type_id == item && (used.len() as i64) < count {
                used.push(held);
            } else {
                kept.push(held);
            }
        }
        self.inventory = kept;
        used
    }

    fn i_add(&mut self, item: Item) {
        self.inventory.push(item);
    }

    fn items_in_category(&self, category: &str, include_containers: bool) -> Vec<String> {
        self.inventory
            .iter()
            .filter(|i| {
                if include_containers {
                    i.category_of_contents() == category
                } else {
                    i.category == category
                }
            })
            .map(|i| i.type_id.clone())
            .collect()
    }

    fn weapon_name(&self) -> Option<String> {
        self.weapon.clone()
    }

    fn ammo_name(&self) -> Option<String> {
        self.ammo.clone()
    }

    fn can_stow_weapon(&self) -> bool {
        self.weapon.is_some()
    }

    fn cash(&self) -> i64 {
        self.cash
    }

    fn set_cash(&mut self, cash: i64) {
        self.cash = cash;
    }

    fn debt(&self) -> i64 {
        self.debt
    }

    fn add_debt(&mut self, amount: i64) {
        self.debt = self.debt.saturating_add(amount);
    }

    fn receive_gift(&mut self, to_use: bool) -> String {
        if to_use {
            "Thanks, I'll put it to use.".to_string()
        } else {
            "Thanks!".to_string()
        }
    }

    fn pos(&self) -> Tripoint {
        self.pos
    }

    fn set_pos(&mut self, pos: Tripoint) {
        self.pos = pos;
    }

    fn faction(&self) -> Option<String> {
        self.faction.clone()
    }

    fn set_faction(&mut self, faction: &str) {
        self.faction = Some(faction.to_string());
    }

    fn set_class(&mut self, class: &str) {
        self.class = Some(class.to_string());
    }

    fn faction_trust(&self) -> i32 {
        self.faction_trust
    }

    fn add_faction_trust(&mut self, amount: i32) {
        self.faction_trust = self.faction_trust.saturating_add(amount);
    }

    fn opinion(&self) -> Opinion {
        self.opinion
    }

    fn add_opinion(&mut self, delta: Opinion) {
        self.opinion += delta;
    }

    fn check_hostile_response(&self, anger: i32) -> bool {
        anger > 0 && self.opinion.anger.saturating_add(anger) >= self.anger_threshold
    }

    fn turned_hostile(&self) -> bool {
        self.npc && self.attitude != "kill" && self.opinion.anger >= self.anger_threshold
    }

    fn make_angry(&mut self) {
        self.attitude = "kill".to_string();
        self.following = false;
        self.friendly = false;
    }

    fn personality(&self) -> Personality {
        self.personality
    }

    fn set_attitude(&mut self, attitude: &str) {
        self.attitude = attitude.to_string();
    }

    fn is_ally(&self) -> bool {
        self.ally
    }

    fn is_following(&self) -> bool {
        self.following
    }

    fn is_friendly(&self) -> bool {
        self.friendly || self.ally
    }

    fn is_enemy(&self) -> bool {
        self.attitude == "kill"
    }

    fn is_available(&self) -> bool {
        self.activity.is_none()
    }

    fn bye_line(&self) -> String {
        self.bye.clone()
    }

    fn topics(&self, _by_radio: bool) -> Vec<String> {
        vec![self.first_topic.clone()]
    }

    fn set_first_topic(&mut self, topic: &str) {
        self.first_topic = topic.to_string();
    }

    fn say(&mut self, text: &str) {
        self.said.push(text.to_string());
    }

    fn is_deaf(&self) -> bool {
        self.deaf
    }

    fn is_mute(&self) -> bool {
        self.mute
    }

    fn short_description(&self) -> String {
        if self.description.is_empty() {
            format!("You see {}.", self.name)
        } else {
            self.description.clone()
        }
    }

    fn evaluation(&self) -> String {
        format!(
            "&Str {} - Dex {} - Int {} - Per {}",
            self.stat(Stat::StrengthBase),
            self.stat(Stat::DexterityBase),
            self.stat(Stat::IntelligenceBase),
            self.stat(Stat::PerceptionBase)
        )
    }

    fn opinion_text(&self) -> String {
        let o = self.opinion;
        format!(
            "Trust: {}  Fear: {}  Value: {}  Anger: {}",
            o.trust, o.fear, o.value, o.anger
        )
    }

    fn distance_to_goal(&self) -> String {
        match &self.goal {
            Some(goal) => format!("We're heading for {goal}."),
            None => "I'm not going anywhere in particular.".to_string(),
        }
    }

    fn job_description(&self) -> String {
        match &self.activity {
            Some(activity) => format!("I'm busy with {activity}."),
            None => "I'm not doing much currently.".to_string(),
        }
    }

    fn enslave_mind(&mut self) -> bool {
        self.ally = true;
        self.following = true;
        self.attitude = "follow".to_string();
        true
    }

    fn mission(&self, id: MissionId) -> Option<Mission> {
        self.missions.iter().find(|m| m.id == id).cloned()
    }

    fn selected_mission(&self) -> Option<MissionId> {
        self.selected_mission
    }

    fn select_mission(&mut self, id: Option<MissionId>) {
        self.selected_mission = id;
    }

    fn available_missions(&self) -> Vec<MissionId> {
        self.missions
            .iter()
            .filter(|m| m.status == MissionStatus::Available)
            .map(|m| m.id)
            .collect()
    }

    fn assigned_missions(&self) -> Vec<MissionId> {
        self.missions
            .iter()
            .filter(|m| m.status == MissionStatus::InProgress)
            .map(|m| m.id)
            .collect()
    }

    fn assign_mission(&mut self, id: MissionId, to: TalkerId) {
        if let Some(m) = self.mission_mut(id) {
            m.status = MissionStatus::InProgress;
            m.assigned_to = Some(to);
        }
    }

    fn finish_mission(&mut self, id: MissionId, success: bool) {
        if let Some(m) = self.mission_mut(id) {
            m.status = if success {
                MissionStatus::Succeeded
            } else {
                MissionStatus::Failed
            };
        }
    }

    fn step_mission(&mut self, id: MissionId, step: i32) {
        if let Some(m) = self.mission_mut(id) {
            m.step = step;
        }
    }

    fn add_mission(&mut self, mission_type: &str) {
        let id = MissionId(self.next_mission);
        self.next_mission += 1;
        let mut mission = Mission::new(id, mission_type, 0);
        mission.type_id = mission_type.to_string();
        self.missions.push(mission);
    }

    fn activity(&self) -> Option<String> {
        self.activity.clone()
    }

    fn backlog_front(&self) -> Option<String> {
        self.backlog.first().cloned()
    }

    fn assign_activity(&mut self, id: &str, _duration: TimeDuration) {
        if let Some(current) = self.activity.take() {
            self.backlog.insert(0, current);
        }
        self.activity = Some(id.to_string());
    }

    fn cancel_activity(&mut self) {
        self.activity = None;
    }

    fn add_morale(&mut self, change: MoraleChange) {
        let entry = self.morale.entry(change.morale_type).or_insert(0);
        let next = entry.saturating_add(change.bonus);
        *entry = if change.capped {
            next.min(change.max_bonus)
        } else {
            next
        };
    }

    fn remove_morale(&mut self, morale_type: &str) {
        self.morale.remove(morale_type);
    }

    fn mod_healthy(&mut self, amount: i32, cap: i32) {
        let next = self.healthy.saturating_add(amount);
        self.healthy = if amount >= 0 {
            next.min(cap.max(self.healthy))
        } else {
            next.max(cap.min(self.healthy))
        };
    }

    fn add_wet(&mut self, amount: i32) {
        self.wetness = self.wetness.saturating_add(amount);
    }

    fn has_rule(&self, rule: &str) -> bool {
        self.rules.contains(rule)
    }

    fn rule_slot(&self, slot: RuleSlot) -> Option<String> {
        self.rule_slots.get(&slot).cloned()
    }

    fn change_rule(&mut self, change: RuleChange) {
        match change {
            RuleChange::Toggle(rule) => {
                if !self.rules.remove(&rule) {
                    self.rules.insert(rule);
                }
            }
            RuleChange::Set(rule) => {
                self.rules.insert(rule);
            }
            RuleChange::Clear(rule) => {
                self.rules.remove(&rule);
            }
            RuleChange::Slot(slot, value) => {
                self.rule_slots.insert(slot, value);
            }
        }
    }

    fn set_goal(&mut self, location: &str) {
        self.goal = Some(location.to_string());
    }

    fn cast_spell(&mut self, spell: &str) {
        self.spells_cast.push(spell.to_string());
    }

    fn perform(&mut self, action: NamedAction) {
        match action {
            NamedAction::Follow | NamedAction::FollowOnly => self.following = true,
            NamedAction::StopFollowing | NamedAction::Leave => self.following = false,
            NamedAction::Hostile | NamedAction::InsultCombat => self.make_angry(),
            NamedAction::StrangerNeutral => self.attitude = "null".to_string(),
            NamedAction::NpcDie => self.alive = false,
            NamedAction::ClearMission => self.selected_mission = None,
            _ => {}
        }
        self.performed.push(action);
    }
}
