//! Compiled effects and effect pipelines.
//!
//! An [`Effect`] is one action baked from a document: every name, literal and
//! operator is resolved when the document is compiled, so applying it is a
//! single match on the variant. A [`TalkEffect`] is the ordered pipeline
//! attached to a response outcome, together with its opinion deltas and the
//! topic to move to.

mod apply;
mod schedule;
mod trade;

use pv_core::talker::RuleChange;
use pv_core::world::{MessageKind, SoundKind};
use pv_core::{Consequence, NamedAction, Opinion, Role, Talker};

use crate::dialogue::Dialogue;
use crate::error::DialogueResult;
use crate::expr::{Assignment, DurationExpr, IntExpr, VarScope};
use crate::topic::TalkTopic;
use crate::trial::TrialMod;

/// A variable holding a position, written as `(x,y,z)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionVar {
    /// Where the variable lives.
    pub scope: VarScope,
    /// Full variable name.
    pub name: String,
}

impl PositionVar {
    /// A position variable in a scope.
    pub fn new(scope: VarScope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

/// Where the text of a message or sound comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    /// Fixed text.
    Literal(String),
    /// A random snippet from a category.
    Snippet {
        /// Snippet category.
        category: String,
        /// Pin the chosen snippet on the other speaker so repeats reuse it.
        same: bool,
    },
}

/// An item handed over, bought or sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTransfer {
    /// Item type id.
    pub item: String,
    /// Price in cash units.
    pub cost: i64,
    /// Number of items or charges.
    pub count: i64,
    /// Container the item arrives in.
    pub container: Option<String>,
}

impl ItemTransfer {
    /// Transfer `count` of `item` at no cost.
    pub fn new(item: impl Into<String>, count: i64) -> Self {
        Self {
            item: item.into(),
            cost: 0,
            count,
            container: None,
        }
    }

    /// Set the price.
    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self
    }

    /// Deliver inside a container.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

/// How a mission is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    /// Wrap up successfully.
    Success,
    /// Fail.
    Failure,
    /// Advance to a step without finishing.
    Step(i32),
}

/// Which NPCs a queued effect reaches instead of the current speakers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NearbyNpcs {
    /// Only NPCs with one of these names; empty means any.
    pub names: Vec<String>,
    /// Maximum distance from the speaker; `None` is unlimited.
    pub range: Option<i32>,
}

impl NearbyNpcs {
    /// Whether an NPC qualifies.
    pub fn admits(&self, npc: &dyn Talker) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| *n == npc.disp_name())
    }
}

/// One compiled action.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A zero-argument action forwarded to the NPC.
    Named(NamedAction),
    /// Accept a bulk trade of the current item; `role` is the seller.
    BulkTrade {
        /// The selling speaker.
        role: Role,
        /// Whether money changes hands.
        trade: bool,
        /// Cap on the amount moved; `None` moves everything.
        quantity: Option<i64>,
    },
    /// Strike lightning if the human side is above ground.
    Lightning,
    /// Roll the weather forward.
    NextWeather,
    /// The NPC receives the current item as a gift; the reply becomes the reason.
    GiveItem {
        /// Whether the NPC means to use it.
        to_use: bool,
    },
    /// Start a companion mission for a role.
    CompanionMission(String),
    /// Apply a status effect.
    AddEffect {
        /// Target speaker.
        role: Role,
        /// Effect id.
        id: String,
        /// Duration.
        duration: DurationExpr,
        /// Intensity.
        intensity: IntExpr,
        /// Body part.
        target_part: Option<String>,
        /// Apply even if immune.
        force: bool,
    },
    /// Remove a status effect.
    LoseEffect {
        /// Target speaker.
        role: Role,
        /// Effect id.
        id: String,
    },
    /// Set a variable to one of several values, or stamp it with the time.
    AddVar {
        /// Target speaker.
        role: Role,
        /// Full variable name.
        name: String,
        /// Candidate values, picked uniformly.
        values: Vec<String>,
        /// Store the current turn instead.
        stamp_time: bool,
    },
    /// Remove a variable.
    LoseVar {
        /// Target speaker.
        role: Role,
        /// Full variable name.
        name: String,
    },
    /// Add to a numeric variable.
    AdjustVar {
        /// Target speaker.
        role: Role,
        /// Full variable name.
        name: String,
        /// Amount added.
        adjustment: IntExpr,
    },
    /// Gain a trait.
    AddTrait {
        /// Target speaker.
        role: Role,
        /// Trait id.
        id: String,
    },
    /// Lose a trait.
    LoseTrait {
        /// Target speaker.
        role: Role,
        /// Trait id.
        id: String,
    },
    /// Install a bionic.
    AddBionic {
        /// Target speaker.
        role: Role,
        /// Bionic id.
        id: String,
    },
    /// Remove a bionic.
    LoseBionic {
        /// Target speaker.
        role: Role,
        /// Bionic id.
        id: String,
    },
    /// The human side pays without receiving anything.
    SpendCash(i64),
    /// The human side receives an item for free.
    SpawnItem(ItemTransfer),
    /// The human side buys an item.
    BuyItem(ItemTransfer),
    /// The human side sells an item; the NPC owes the price.
    SellItem(ItemTransfer),
    /// Use up items or charges.
    ConsumeItem {
        /// Target speaker.
        role: Role,
        /// Item type id.
        item: String,
        /// Amount.
        count: i64,
    },
    /// Remove every item of a type.
    RemoveItemWith {
        /// Target speaker.
        role: Role,
        /// Item type id.
        item: String,
    },
    /// Move the NPC to a faction.
    ChangeFaction(String),
    /// Change the NPC's class.
    ChangeClass(String),
    /// Adjust the NPC faction's standing with the human side.
    FactionRep(i32),
    /// The NPC owes more; `TOTAL` multiplies the running sum.
    AddDebt(Vec<TrialMod>),
    /// Change a follower rule.
    Rule(RuleChange),
    /// Send the NPC travelling.
    SetGoal(String),
    /// The NPC gains a mission to offer.
    AddMission(String),
    /// Give the human side a new mission of a type.
    AssignMission(String),
    /// Finish the human side's active mission of a type.
    FinishMission {
        /// Mission type id.
        mission_type: String,
        /// What happens to it.
        outcome: MissionOutcome,
    },
    /// Buy a monster from the NPC.
    BuyMonster {
        /// Monster type.
        monster: String,
        /// Price.
        cost: i64,
        /// How many.
        count: i32,
        /// Whether it arrives tame.
        pacified: bool,
        /// Name given to it.
        name: Option<String>,
    },
    /// The human side learns a recipe.
    LearnRecipe(String),
    /// Change the NPC's opening topic.
    SetFirstTopic(String),
    /// Run map updates at a position.
    Mapgen {
        /// Update ids.
        updates: Vec<String>,
        /// Position variable; the NPC's position otherwise.
        target: Option<PositionVar>,
    },
    /// Transform terrain around a position.
    TransformRadius {
        /// Speaker whose position is the fallback.
        role: Role,
        /// Transform id.
        transform: String,
        /// Radius.
        radius: IntExpr,
        /// Position variable.
        target: Option<PositionVar>,
    },
    /// Store a random position near a speaker in a variable.
    LocationVariable {
        /// Speaker at the center.
        role: Role,
        /// Where the position is written.
        var: PositionVar,
        /// Minimum distance.
        min_radius: IntExpr,
        /// Maximum offset on each axis; zero uses the speaker's position.
        max_radius: IntExpr,
        /// Only accept outdoor positions.
        outdoor_only: bool,
    },
    /// Play a sound effect to the human side.
    SoundEffect {
        /// Sound id.
        id: String,
        /// Variant.
        variant: String,
        /// Volume; `None` is the default loudness.
        volume: Option<i32>,
        /// Only audible above ground.
        outdoor_event: bool,
    },
    /// Show a message to a human speaker.
    Message {
        /// Target speaker.
        role: Role,
        /// Text.
        text: TextSource,
        /// A sound message that only carries above ground.
        outdoor_only: bool,
        /// Whether it is a sound the target must hear.
        sound: bool,
        /// Show as a popup.
        popup: bool,
        /// Message log kind.
        kind: MessageKind,
    },
    /// Emit a sound into the world.
    MakeSound {
        /// Speaker whose position is the fallback.
        role: Role,
        /// Description.
        text: TextSource,
        /// Volume.
        volume: i32,
        /// Kind.
        kind: SoundKind,
        /// Position variable.
        target: Option<PositionVar>,
    },
    /// Get wet.
    AddWet {
        /// Target speaker.
        role: Role,
        /// Amount.
        amount: IntExpr,
    },
    /// Start an activity.
    AssignActivity {
        /// Target speaker.
        role: Role,
        /// Activity id.
        activity: String,
        /// How long it runs.
        duration: DurationExpr,
    },
    /// Run effects-on-condition now, or schedule them.
    QueueEoc {
        /// Speaker whose position centers the nearby search.
        role: Role,
        /// Effect-on-condition ids.
        eocs: Vec<String>,
        /// Earliest delay.
        delay_min: DurationExpr,
        /// Latest delay; zero runs immediately.
        delay_max: DurationExpr,
        /// Run on nearby NPCs instead of the current speakers.
        nearby: Option<NearbyNpcs>,
    },
    /// Run one effect-on-condition picked by weight, on the human side alone.
    WeightedEocs(Vec<(String, IntExpr)>),
    /// Adjust health.
    ModHealthy {
        /// Target speaker.
        role: Role,
        /// Amount.
        amount: IntExpr,
        /// Bound the change may not cross.
        cap: IntExpr,
    },
    /// Add morale.
    AddMorale {
        /// Target speaker.
        role: Role,
        /// Morale type.
        morale_type: String,
        /// Bonus.
        bonus: IntExpr,
        /// Maximum bonus.
        max_bonus: IntExpr,
        /// Duration.
        duration: DurationExpr,
        /// Decay start.
        decay_start: DurationExpr,
        /// Cap at the maximum.
        capped: bool,
    },
    /// Remove morale of a type.
    LoseMorale {
        /// Target speaker.
        role: Role,
        /// Morale type.
        morale_type: String,
    },
    /// Change the NPC faction's trust in the human side.
    FactionTrust(IntExpr),
    /// Cast a spell.
    CastSpell {
        /// Caster.
        role: Role,
        /// Spell id.
        spell: String,
    },
    /// Arithmetic assignment.
    Assign(Assignment),
    /// Spawn monsters near a position.
    SpawnMonster {
        /// Speaker whose position is the fallback.
        role: Role,
        /// Monster type or group id.
        monster: String,
        /// Hallucinations to spawn.
        hallucinations: IntExpr,
        /// Real monsters to spawn.
        real: IntExpr,
        /// Shortest lifespan; zero is unlimited.
        lifespan_min: DurationExpr,
        /// Longest lifespan.
        lifespan_max: DurationExpr,
        /// Position variable.
        target: Option<PositionVar>,
    },
    /// Place a field around a position.
    SetField {
        /// Speaker whose position is the fallback.
        role: Role,
        /// Field type.
        field: String,
        /// Intensity.
        intensity: IntExpr,
        /// Age.
        age: DurationExpr,
        /// Radius.
        radius: IntExpr,
        /// Whether the human side is affected.
        hit_player: bool,
        /// Position variable.
        target: Option<PositionVar>,
    },
    /// Override the light level for a while.
    LightLevel {
        /// Light level.
        level: IntExpr,
        /// Shortest duration.
        length_min: DurationExpr,
        /// Longest duration.
        length_max: DurationExpr,
    },
}

impl Effect {
    /// The risk this effect carries for the human side.
    pub fn consequence(&self) -> Consequence {
        match self {
            Effect::Named(action) => action.consequence(),
            _ => Consequence::None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Named(action) => action.name(),
            Effect::BulkTrade { trade: true, .. } => "bulk_trade_accept",
            Effect::BulkTrade { .. } => "bulk_donate",
            Effect::Lightning => "lightning",
            Effect::NextWeather => "next_weather",
            Effect::GiveItem { .. } => "npc_gets_item",
            Effect::CompanionMission(_) => "companion_mission",
            Effect::AddEffect { .. } => "add_effect",
            Effect::LoseEffect { .. } => "lose_effect",
            Effect::AddVar { .. } => "add_var",
            Effect::LoseVar { .. } => "lose_var",
            Effect::AdjustVar { .. } => "adjust_var",
            Effect::AddTrait { .. } => "add_trait",
            Effect::LoseTrait { .. } => "lose_trait",
            Effect::AddBionic { .. } => "add_bionic",
            Effect::LoseBionic { .. } => "lose_bionic",
            Effect::SpendCash(_) => "u_spend_cash",
            Effect::SpawnItem(_) => "u_spawn_item",
            Effect::BuyItem(_) => "u_buy_item",
            Effect::SellItem(_) => "u_sell_item",
            Effect::ConsumeItem { .. } => "consume_item",
            Effect::RemoveItemWith { .. } => "remove_item_with",
            Effect::ChangeFaction(_) => "npc_change_faction",
            Effect::ChangeClass(_) => "npc_change_class",
            Effect::FactionRep(_) => "u_faction_rep",
            Effect::AddDebt(_) => "add_debt",
            Effect::Rule(_) => "npc_rule",
            Effect::SetGoal(_) => "npc_goal",
            Effect::AddMission(_) => "add_mission",
            Effect::AssignMission(_) => "assign_mission",
            Effect::FinishMission { .. } => "finish_mission",
            Effect::BuyMonster { .. } => "u_buy_monster",
            Effect::LearnRecipe(_) => "u_learn_recipe",
            Effect::SetFirstTopic(_) => "npc_first_topic",
            Effect::Mapgen { .. } => "mapgen_update",
            Effect::TransformRadius { .. } => "transform_radius",
            Effect::LocationVariable { .. } => "location_variable",
            Effect::SoundEffect { .. } => "sound_effect",
            Effect::Message { .. } => "message",
            Effect::MakeSound { .. } => "make_sound",
            Effect::AddWet { .. } => "add_wet",
            Effect::AssignActivity { .. } => "assign_activity",
            Effect::QueueEoc { .. } => "queue_eocs",
            Effect::WeightedEocs(_) => "weighted_list_eocs",
            Effect::ModHealthy { .. } => "mod_healthy",
            Effect::AddMorale { .. } => "add_morale",
            Effect::LoseMorale { .. } => "lose_morale",
            Effect::FactionTrust(_) => "faction_trust",
            Effect::CastSpell { .. } => "cast_spell",
            Effect::Assign(_) => "arithmetic",
            Effect::SpawnMonster { .. } => "spawn_monster",
            Effect::SetField { .. } => "set_field",
            Effect::LightLevel { .. } => "custom_light_level",
        }
    }
}

/// Run a list of effects in order.
///
/// Effects are not transactional: a later effect sees what an earlier one
/// wrote, and an error stops the list where it happened.
pub fn run_effects(effects: &[Effect], d: &mut Dialogue<'_>) -> DialogueResult<()> {
    for effect in effects {
        tracing::debug!(effect = effect.name(), "applying effect");
        effect.apply(d)?;
    }
    Ok(())
}

/// The outcome pipeline of a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TalkEffect {
    /// Actions in document order.
    pub effects: Vec<Effect>,
    /// Opinion delta applied to the NPC.
    pub opinion: Opinion,
    /// Divisors applied to the selected mission's favor value.
    pub mission_opinion: Opinion,
    /// Where the conversation goes next.
    pub next_topic: TalkTopic,
    guaranteed: Consequence,
}

impl TalkEffect {
    /// A pipeline that only moves to a topic.
    pub fn to_topic(topic: impl Into<TalkTopic>) -> Self {
        Self {
            next_topic: topic.into(),
            ..Self::default()
        }
    }

    /// Append an effect.
    pub fn push(&mut self, effect: Effect) {
        self.guaranteed = self.guaranteed.max(effect.consequence());
        self.effects.push(effect);
    }

    /// Builder form of [`TalkEffect::push`].
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.push(effect);
        self
    }

    /// Set the opinion delta.
    pub fn with_opinion(mut self, opinion: Opinion) -> Self {
        self.opinion = opinion;
        self
    }

    /// Set the mission-scaled opinion divisors.
    pub fn with_mission_opinion(mut self, opinion: Opinion) -> Self {
        self.mission_opinion = opinion;
        self
    }

    /// The worst consequence this pipeline can have.
    pub fn get_consequence(&self, d: &Dialogue<'_>) -> Consequence {
        if d.has_actor(Role::Beta) && d.actor(Role::Beta).check_hostile_response(self.opinion.anger) {
            return Consequence::Hostile;
        }
        self.guaranteed
    }

    /// Apply the pipeline and return the next topic.
    pub fn apply(&self, d: &mut Dialogue<'_>) -> DialogueResult<TalkTopic> {
        if d.has_actor(Role::Beta) {
            let mission_value = {
                let beta = d.actor(Role::Beta);
                beta.selected_mission()
                    .and_then(|id| beta.mission(id))
                    .map(|m| m.value)
            };
            run_effects(&self.effects, d)?;
            let beta = d.actor_mut(Role::Beta);
            beta.add_opinion(self.opinion);
            if let Some(value) = mission_value {
                if !self.mission_opinion.is_zero() {
                    let favor = pv_core::opinion::cash_to_favor(value);
                    beta.add_opinion(self.mission_opinion.scaled_by(favor));
                }
            }
            if beta.turned_hostile() {
                beta.make_angry();
                tracing::debug!("npc turned hostile, ending conversation");
                return Ok(TalkTopic::new(crate::topic::TALK_DONE));
            }
        } else {
            run_effects(&self.effects, d)?;
        }
        d.recompute_missions();
        Ok(self.next_topic.clone())
    }
}
