//! Boolean conditions over a live conversation.

use pv_core::talker::TrainingKind;
use pv_core::{Gender, Role, TimeDuration, Talker};

use crate::dialogue::Dialogue;
use crate::error::DialogueResult;
use crate::expr::{CompareOp, IntExpr, StrExpr};

/// How many missions a mission count condition expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionCount {
    /// None at all.
    Zero,
    /// Exactly one.
    One,
    /// Two or more.
    Many,
}

impl MissionCount {
    /// Whether `n` missions satisfy this count.
    pub fn matches(self, n: usize) -> bool {
        match self {
            MissionCount::Zero => n == 0,
            MissionCount::One => n == 1,
            MissionCount::Many => n >= 2,
        }
    }
}

/// A compiled condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Condition {
    /// Always true.
    #[default]
    Always,
    /// Always false.
    Never,
    /// Logical NOT.
    Not(Box<Condition>),
    /// Logical AND, short-circuiting.
    And(Vec<Condition>),
    /// Logical OR, short-circuiting.
    Or(Vec<Condition>),
    /// A speaker has a gender.
    IsGender {
        /// Whose gender.
        role: Role,
        /// Expected gender.
        gender: Gender,
    },
    /// Number of missions the NPC has handed to the avatar.
    AssignedMissions(MissionCount),
    /// Number of missions the NPC can hand out.
    AvailableMissions(MissionCount),
    /// The selected mission's goal is met.
    MissionComplete,
    /// The selected mission's goal is not met.
    MissionIncomplete,
    /// The selected mission has this goal kind.
    MissionGoal(String),
    /// The NPC is free to take a task.
    NpcAvailable,
    /// The NPC follows the avatar.
    NpcFollowing,
    /// The NPC is friendly.
    NpcFriend,
    /// The NPC is hostile.
    NpcHostile,
    /// The NPC can teach skills.
    NpcTrainSkills,
    /// The NPC can teach martial arts.
    NpcTrainStyles,
    /// It is daytime.
    IsDay,
    /// The NPC stands outdoors.
    IsOutside,
    /// The conversation is held over the radio.
    IsByRadio,
    /// An effect left a reason.
    HasReason,
    /// A speaker wields something.
    HasWeapon(Role),
    /// A speaker drives.
    Driving(Role),
    /// A speaker can put the weapon away.
    CanStowWeapon(Role),
    /// A speaker rides a mount.
    IsRiding(Role),
    /// A speaker is alive.
    IsAlive(Role),
    /// A speaker has a trait.
    HasTrait {
        /// Whose traits.
        role: Role,
        /// Trait id.
        id: String,
    },
    /// A speaker has a status effect.
    HasEffect {
        /// Whose effects.
        role: Role,
        /// Effect id.
        id: String,
    },
    /// A speaker has a bionic installed.
    HasBionic {
        /// Whose bionics.
        role: Role,
        /// Bionic id.
        id: String,
    },
    /// A speaker variable holds a value.
    HasVar {
        /// Whose variable.
        role: Role,
        /// Full variable key.
        name: String,
        /// Expected value.
        value: String,
    },
    /// Compare the time since a stamped variable.
    CompareTimeSinceVar {
        /// Whose variable.
        role: Role,
        /// Full variable key.
        name: String,
        /// Comparison.
        op: CompareOp,
        /// Duration to compare against.
        duration: TimeDuration,
    },
    /// A speaker holds at least one of an item.
    HasItem {
        /// Whose inventory.
        role: Role,
        /// Item type id.
        item: String,
    },
    /// A speaker holds at least `count` of an item.
    HasItems {
        /// Whose inventory.
        role: Role,
        /// Item type id.
        item: String,
        /// Minimum amount or charges.
        count: IntExpr,
    },
    /// A speaker holds at least `count` items of a category.
    HasItemCategory {
        /// Whose inventory.
        role: Role,
        /// Category id.
        category: String,
        /// Minimum number of items.
        count: IntExpr,
    },
    /// A speaker's skill is at least `level`.
    HasSkill {
        /// Whose skill.
        role: Role,
        /// Skill id.
        skill: String,
        /// Minimum level.
        level: IntExpr,
    },
    /// A speaker knows a recipe.
    KnowsRecipe {
        /// Whose recipes.
        role: Role,
        /// Recipe id.
        recipe: String,
    },
    /// The avatar has at least this much cash.
    HasCash(IntExpr),
    /// The NPC owes the avatar at least this much.
    AreOwed(IntExpr),
    /// A speaker's faction trusts the avatar at least this much.
    HasFactionTrust {
        /// Whose faction.
        role: Role,
        /// Minimum trust.
        amount: IntExpr,
    },
    /// The NPC has a flag rule set.
    NpcRule(String),
    /// The NPC's aim rule has this value.
    NpcAimRule(String),
    /// The NPC's engagement rule has this value.
    NpcEngagementRule(String),
    /// An NPC with this role is near the avatar.
    NpcRoleNearby(String),
    /// The current weather has this id.
    IsWeather(String),
    /// At least this many days have passed.
    DaysSinceCataclysm(IntExpr),
    /// True with probability `1/n`.
    OneInChance(IntExpr),
    /// Compare two integers.
    CompareInt {
        /// Left operand.
        lhs: IntExpr,
        /// Comparison.
        op: CompareOp,
        /// Right operand.
        rhs: IntExpr,
    },
    /// Two strings are equal.
    CompareString(StrExpr, StrExpr),
}

impl Condition {
    /// Negate a condition.
    pub fn not(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    /// Evaluate against a live conversation.
    ///
    /// Evaluation never changes speaker or world state. A variable that
    /// cannot be read as a number is an error.
    pub fn evaluate(&self, d: &Dialogue<'_>) -> DialogueResult<bool> {
        let result = match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Not(inner) => !inner.evaluate(d)?,
            Condition::And(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(d)? {
                        return Ok(false);
                    }
                }
                true
            }
            Condition::Or(conditions) => {
                for condition in conditions {
                    if condition.evaluate(d)? {
                        return Ok(true);
                    }
                }
                false
            }
            Condition::IsGender { role, gender } => d.actor(*role).gender() == *gender,
            Condition::AssignedMissions(count) => count.matches(d.missions_assigned().len()),
            Condition::AvailableMissions(count) => {
                count.matches(d.actor(Role::Beta).available_missions().len())
            }
            Condition::MissionComplete => selected_goal_met(d) == Some(true),
            Condition::MissionIncomplete => selected_goal_met(d) == Some(false),
            Condition::MissionGoal(goal) => {
                let beta = d.actor(Role::Beta);
                beta.selected_mission()
                    .and_then(|id| beta.mission(id))
                    .is_some_and(|m| m.goal == *goal)
            }
            Condition::NpcAvailable => d.actor(Role::Beta).is_available(),
            Condition::NpcFollowing => d.actor(Role::Beta).is_following(),
            Condition::NpcFriend => d.actor(Role::Beta).is_friendly(),
            Condition::NpcHostile => d.actor(Role::Beta).is_enemy(),
            Condition::NpcTrainSkills => teaches(d.actor(Role::Beta), TrainingKind::Skill),
            Condition::NpcTrainStyles => teaches(d.actor(Role::Beta), TrainingKind::Style),
            Condition::IsDay => d.world().now().is_day(),
            Condition::IsOutside => d.world().is_outside(d.actor(Role::Beta).pos()),
            Condition::IsByRadio => d.is_by_radio(),
            Condition::HasReason => !d.reason().is_empty(),
            Condition::HasWeapon(role) => d.actor(*role).weapon_name().is_some(),
            Condition::Driving(role) => d.actor(*role).is_driving(),
            Condition::CanStowWeapon(role) => d.actor(*role).can_stow_weapon(),
            Condition::IsRiding(role) => d.actor(*role).is_riding(),
            Condition::IsAlive(role) => d.actor(*role).is_alive(),
            Condition::HasTrait { role, id } => d.actor(*role).has_trait(id),
            Condition::HasEffect { role, id } => d.actor(*role).has_effect(id),
            Condition::HasBionic { role, id } => d.actor(*role).has_bionic(id),
            Condition::HasVar { role, name, value } => {
                d.actor(*role).get_value(name).as_deref() == Some(value.as_str())
            }
            Condition::CompareTimeSinceVar {
                role,
                name,
                op,
                duration,
            } => match d.actor(*role).get_value(name) {
                Some(text) => {
                    let stamped = pv_core::vars::parse_int(name, Some(&text))?;
                    let elapsed = d.world().now().turn().wrapping_sub(stamped);
                    op.test(elapsed, duration.turns())
                }
                None => false,
            },
            Condition::HasItem { role, item } => {
                let actor = d.actor(*role);
                actor.charges_of(item) > 0 || actor.has_amount(item, 1)
            }
            Condition::HasItems { role, item, count } => {
                let count = count.evaluate(d)?;
                let actor = d.actor(*role);
                actor.has_amount(item, count) || actor.charges_of(item) >= count
            }
            Condition::HasItemCategory {
                role,
                category,
                count,
            } => {
                let count = count.evaluate(d)?;
                let held = d.actor(*role).items_in_category(category, false).len();
                i64::try_from(held).unwrap_or(i64::MAX) >= count
            }
            Condition::HasSkill { role, skill, level } => {
                i64::from(d.actor(*role).skill_level(skill)) >= level.evaluate(d)?
            }
            Condition::KnowsRecipe { role, recipe } => d.actor(*role).knows_recipe(recipe),
            Condition::HasCash(amount) => d.actor(Role::Alpha).cash() >= amount.evaluate(d)?,
            Condition::AreOwed(amount) => d.actor(Role::Beta).debt() >= amount.evaluate(d)?,
            Condition::HasFactionTrust { role, amount } => {
                i64::from(d.actor(*role).faction_trust()) >= amount.evaluate(d)?
            }
            Condition::NpcRule(rule) => d.actor(Role::Beta).has_rule(rule),
            Condition::NpcAimRule(value) => {
                d.actor(Role::Beta).rule_slot(pv_core::talker::RuleSlot::Aim).as_deref()
                    == Some(value.as_str())
            }
            Condition::NpcEngagementRule(value) => {
                d.actor(Role::Beta)
                    .rule_slot(pv_core::talker::RuleSlot::Engagement)
                    .as_deref()
                    == Some(value.as_str())
            }
            Condition::NpcRoleNearby(role) => {
                d.world().role_nearby(d.actor(Role::Alpha).pos(), role)
            }
            Condition::IsWeather(id) => d.world().weather().id == *id,
            Condition::DaysSinceCataclysm(days) => d.world().now().days() >= days.evaluate(d)?,
            Condition::OneInChance(n) => {
                let n = n.evaluate(d)?;
                n <= 1 || d.random_range(1, n) == 1
            }
            Condition::CompareInt { lhs, op, rhs } => op.test(lhs.evaluate(d)?, rhs.evaluate(d)?),
            Condition::CompareString(a, b) => a.evaluate(d) == b.evaluate(d),
        };
        Ok(result)
    }
}

fn selected_goal_met(d: &Dialogue<'_>) -> Option<bool> {
    let beta = d.actor(Role::Beta);
    let mission = beta.selected_mission().and_then(|id| beta.mission(id));
    if mission.is_none() {
        tracing::debug!("mission condition checked with no mission selected");
    }
    mission.map(|m| m.goal_met)
}

fn teaches(talker: &dyn Talker, kind: TrainingKind) -> bool {
    talker.training_offers().iter().any(|t| t.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ArithOp, VarScope};
    use crate::test_support::Fixture;
    use pv_core::talker::Training;
    use pv_core::{GameWorld, Item, Mission, MissionId, TimePoint};

    #[test]
    fn logic_short_circuits() {
        let mut fx = Fixture::new();
        let d = fx.dialogue();
        let garbage = Condition::CompareInt {
            lhs: IntExpr::binary(ArithOp::Div, IntExpr::Const(1), IntExpr::Const(0)),
            op: CompareOp::Eq,
            rhs: IntExpr::Const(0),
        };
        let and = Condition::And(vec![Condition::Never, garbage.clone()]);
        let or = Condition::Or(vec![Condition::Always, garbage.clone()]);
        assert_eq!(and.evaluate(&d), Ok(false));
        assert_eq!(or.evaluate(&d), Ok(true));
        assert!(Condition::And(vec![Condition::Always, garbage]).evaluate(&d).is_err());
        assert_eq!(Condition::not(Condition::Never).evaluate(&d), Ok(true));
    }

    #[test]
    fn gender_and_vars() {
        let mut fx = Fixture::new();
        fx.beta.gender = Gender::Female;
        fx.alpha.vars.set("npctalk_var_door", "open");
        let d = fx.dialogue();
        let female = Condition::IsGender {
            role: Role::Beta,
            gender: Gender::Female,
        };
        assert_eq!(female.evaluate(&d), Ok(true));
        let open = Condition::HasVar {
            role: Role::Alpha,
            name: "npctalk_var_door".into(),
            value: "open".into(),
        };
        assert_eq!(open.evaluate(&d), Ok(true));
        let closed = Condition::HasVar {
            role: Role::Alpha,
            name: "npctalk_var_door".into(),
            value: "closed".into(),
        };
        assert_eq!(closed.evaluate(&d), Ok(false));
    }

    #[test]
    fn mission_counts() {
        assert!(MissionCount::Zero.matches(0));
        assert!(MissionCount::One.matches(1));
        assert!(!MissionCount::One.matches(2));
        assert!(MissionCount::Many.matches(3));

        let mut fx = Fixture::new();
        fx.beta.missions.push(Mission::new(MissionId(1), "Fetch", 10));
        fx.beta.missions.push(Mission::new(MissionId(2), "Carry", 10));
        let d = fx.dialogue();
        assert_eq!(
            Condition::AvailableMissions(MissionCount::Many).evaluate(&d),
            Ok(true)
        );
        assert_eq!(
            Condition::AssignedMissions(MissionCount::Zero).evaluate(&d),
            Ok(true)
        );
        assert_eq!(Condition::MissionComplete.evaluate(&d), Ok(false));
        assert_eq!(Condition::MissionIncomplete.evaluate(&d), Ok(false));
    }

    #[test]
    fn items_and_cash() {
        let mut fx = Fixture::new();
        fx.alpha.inventory.push(Item::new("bandages").with_charges(3));
        fx.alpha.cash = 500;
        fx.beta.debt = 20;
        let d = fx.dialogue();
        let three = Condition::HasItems {
            role: Role::Alpha,
            item: "bandages".into(),
            count: IntExpr::Const(3),
        };
        let four = Condition::HasItems {
            role: Role::Alpha,
            item: "bandages".into(),
            count: IntExpr::Const(4),
        };
        assert_eq!(three.evaluate(&d), Ok(true));
        assert_eq!(four.evaluate(&d), Ok(false));
        assert_eq!(Condition::HasCash(IntExpr::Const(500)).evaluate(&d), Ok(true));
        assert_eq!(Condition::AreOwed(IntExpr::Const(21)).evaluate(&d), Ok(false));
    }

    #[test]
    fn trainers() {
        let mut fx = Fixture::new();
        fx.beta
            .trainings
            .push(Training::new(TrainingKind::Style, "karate", 0));
        let d = fx.dialogue();
        assert_eq!(Condition::NpcTrainStyles.evaluate(&d), Ok(true));
        assert_eq!(Condition::NpcTrainSkills.evaluate(&d), Ok(false));
    }

    #[test]
    fn time_since_var_compares_elapsed_turns() {
        let mut fx = Fixture::new();
        fx.world.set_now(TimePoint::from_turn(700));
        fx.beta.vars.set("met", "100");
        let d = fx.dialogue();
        let old = Condition::CompareTimeSinceVar {
            role: Role::Beta,
            name: "met".into(),
            op: CompareOp::Ge,
            duration: TimeDuration::from_minutes(10),
        };
        assert_eq!(old.evaluate(&d), Ok(true));
        let unset = Condition::CompareTimeSinceVar {
            role: Role::Alpha,
            name: "met".into(),
            op: CompareOp::Ge,
            duration: TimeDuration::ZERO,
        };
        assert_eq!(unset.evaluate(&d), Ok(false));
    }

    #[test]
    fn compare_string_reads_vars() {
        let mut fx = Fixture::new();
        fx.world.globals_mut().set("mood", "grim");
        let d = fx.dialogue();
        let grim = Condition::CompareString(
            StrExpr::Var {
                scope: VarScope::Global,
                name: "mood".into(),
            },
            StrExpr::Literal("grim".into()),
        );
        assert_eq!(grim.evaluate(&d), Ok(true));
        assert_eq!(
            Condition::OneInChance(IntExpr::Const(1)).evaluate(&d),
            Ok(true)
        );
    }
}
