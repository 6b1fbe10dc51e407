//! Conditions: `true`/`false`, named simple conditions, and keyed objects.

use serde_json::Value;

use pv_core::{Gender, Role};
use pv_dialogue::Condition;
use pv_dialogue::condition::MissionCount;
use pv_dialogue::expr::CompareOp;

use super::expr::{fixed_duration, int_expr, int_or, req_int, str_expr, var_name};
use crate::locate::KeyPath;
use crate::reader::{Cx, Obj, array};

/// Every simple condition name.
pub(crate) const SIMPLE_CONDITIONS: &[&str] = &[
    "u_male",
    "u_female",
    "npc_male",
    "npc_female",
    "has_no_assigned_mission",
    "has_assigned_mission",
    "has_many_assigned_missions",
    "has_no_available_mission",
    "has_available_mission",
    "has_many_available_missions",
    "mission_complete",
    "mission_incomplete",
    "npc_available",
    "npc_following",
    "npc_friend",
    "npc_hostile",
    "npc_train_skills",
    "npc_train_styles",
    "is_day",
    "is_outside",
    "u_has_weapon",
    "npc_has_weapon",
    "u_driving",
    "npc_driving",
    "is_by_radio",
    "has_reason",
    "u_can_stow_weapon",
    "npc_can_stow_weapon",
    "u_is_riding",
    "npc_is_riding",
    "u_is_alive",
    "npc_is_alive",
];

/// Every key that introduces an object condition.
pub(crate) const OBJECT_CONDITIONS: &[&str] = &[
    "not",
    "and",
    "or",
    "u_has_trait",
    "npc_has_trait",
    "u_has_effect",
    "npc_has_effect",
    "u_has_bionic",
    "npc_has_bionic",
    "u_has_var",
    "npc_has_var",
    "u_compare_time_since_var",
    "npc_compare_time_since_var",
    "u_has_item",
    "npc_has_item",
    "u_has_items",
    "npc_has_items",
    "u_has_item_category",
    "npc_has_item_category",
    "u_has_skill",
    "npc_has_skill",
    "u_know_recipe",
    "npc_know_recipe",
    "u_has_cash",
    "u_are_owed",
    "u_has_faction_trust",
    "npc_has_faction_trust",
    "npc_role_nearby",
    "npc_rule",
    "npc_aim_rule",
    "npc_engagement_rule",
    "is_weather",
    "mission_goal",
    "days_since_cataclysm",
    "one_in_chance",
    "compare_int",
    "compare_string",
];

const COMPARE_SYMBOLS: &[&str] = &["==", "!=", "<", ">", "<=", ">="];

/// The condition a simple name stands for.
pub(crate) fn simple(name: &str) -> Option<Condition> {
    let condition = match name {
        "u_male" => gender(Role::Alpha, Gender::Male),
        "u_female" => gender(Role::Alpha, Gender::Female),
        "npc_male" => gender(Role::Beta, Gender::Male),
        "npc_female" => gender(Role::Beta, Gender::Female),
        "has_no_assigned_mission" => Condition::AssignedMissions(MissionCount::Zero),
        "has_assigned_mission" => Condition::AssignedMissions(MissionCount::One),
        "has_many_assigned_missions" => Condition::AssignedMissions(MissionCount::Many),
        "has_no_available_mission" => Condition::AvailableMissions(MissionCount::Zero),
        "has_available_mission" => Condition::AvailableMissions(MissionCount::One),
        "has_many_available_missions" => Condition::AvailableMissions(MissionCount::Many),
        "mission_complete" => Condition::MissionComplete,
        "mission_incomplete" => Condition::MissionIncomplete,
        "npc_available" => Condition::NpcAvailable,
        "npc_following" => Condition::NpcFollowing,
        "npc_friend" => Condition::NpcFriend,
        "npc_hostile" => Condition::NpcHostile,
        "npc_train_skills" => Condition::NpcTrainSkills,
        "npc_train_styles" => Condition::NpcTrainStyles,
        "is_day" => Condition::IsDay,
        "is_outside" => Condition::IsOutside,
        "is_by_radio" => Condition::IsByRadio,
        "has_reason" => Condition::HasReason,
        other => {
            let (role, rest) = Role::split_key(other)?;
            match rest {
                "has_weapon" => Condition::HasWeapon(role),
                "driving" => Condition::Driving(role),
                "can_stow_weapon" => Condition::CanStowWeapon(role),
                "is_riding" => Condition::IsRiding(role),
                "is_alive" => Condition::IsAlive(role),
                _ => return None,
            }
        }
    };
    Some(condition)
}

fn gender(role: Role, gender: Gender) -> Condition {
    Condition::IsGender { role, gender }
}

/// Compile any condition value.
pub(crate) fn condition(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Condition> {
    match value {
        Value::Bool(true) => Some(Condition::Always),
        Value::Bool(false) => Some(Condition::Never),
        Value::String(name) => {
            let compiled = simple(name);
            if compiled.is_none() {
                cx.unknown(path, "condition", name, SIMPLE_CONDITIONS.iter().copied());
            }
            compiled
        }
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            object_condition(cx, &obj)
        }
        _ => {
            cx.error(path, "expected a condition");
            None
        }
    }
}

/// Compile an object whose key names the condition.
pub(crate) fn object_condition(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<Condition> {
    let Some(key) = obj.first_of(OBJECT_CONDITIONS) else {
        match obj.map.keys().next() {
            Some(first) => {
                let known = OBJECT_CONDITIONS.iter().chain(SIMPLE_CONDITIONS).copied();
                cx.unknown(&obj.at(first), "condition", first, known);
            }
            None => cx.error(&obj.path, "empty condition"),
        }
        return None;
    };
    let at = obj.at(key);
    let value = obj.get(key)?;
    match key {
        "not" => condition(cx, value, &at).map(Condition::not),
        "and" | "or" => {
            let items = array(cx, value, &at)?;
            let parts: Vec<Option<Condition>> =
                items.iter().map(|(v, p)| condition(cx, v, p)).collect();
            let parts: Vec<Condition> = parts.into_iter().collect::<Option<_>>()?;
            Some(if key == "and" {
                Condition::And(parts)
            } else {
                Condition::Or(parts)
            })
        }
        "u_has_cash" => int_expr(cx, value, &at).map(Condition::HasCash),
        "u_are_owed" => int_expr(cx, value, &at).map(Condition::AreOwed),
        "npc_role_nearby" => text(cx, obj, key).map(Condition::NpcRoleNearby),
        "npc_rule" => text(cx, obj, key).map(Condition::NpcRule),
        "npc_aim_rule" => text(cx, obj, key).map(Condition::NpcAimRule),
        "npc_engagement_rule" => text(cx, obj, key).map(Condition::NpcEngagementRule),
        "is_weather" => text(cx, obj, key).map(Condition::IsWeather),
        "mission_goal" => text(cx, obj, key).map(Condition::MissionGoal),
        "days_since_cataclysm" => int_expr(cx, value, &at).map(Condition::DaysSinceCataclysm),
        "one_in_chance" => int_expr(cx, value, &at).map(Condition::OneInChance),
        "compare_int" => compare_int(cx, value, &at),
        "compare_string" => compare_string(cx, value, &at),
        _ => actor_condition(cx, obj, key),
    }
}

fn text(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<String> {
    obj.str(cx, key).map(str::to_string)
}

fn actor_condition(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<Condition> {
    let (role, rest) = Role::split_key(key)?;
    let at = obj.at(key);
    match rest {
        "has_trait" => text(cx, obj, key).map(|id| Condition::HasTrait { role, id }),
        "has_effect" => text(cx, obj, key).map(|id| Condition::HasEffect { role, id }),
        "has_bionic" => text(cx, obj, key).map(|id| Condition::HasBionic { role, id }),
        "has_item" => text(cx, obj, key).map(|item| Condition::HasItem { role, item }),
        "know_recipe" => text(cx, obj, key).map(|recipe| Condition::KnowsRecipe { role, recipe }),
        "has_var" => {
            let name = var_name(cx, obj, key);
            let value = obj.req_str(cx, "value");
            Some(Condition::HasVar {
                role,
                name: name?,
                value: value?.to_string(),
            })
        }
        "compare_time_since_var" => {
            let name = var_name(cx, obj, key);
            let op = obj.req_str(cx, "op").and_then(|symbol| {
                let op = CompareOp::from_symbol(symbol);
                if op.is_none() {
                    cx.unknown(&obj.at("op"), "comparison", symbol, COMPARE_SYMBOLS.iter().copied());
                }
                op
            });
            let duration = match obj.get("time") {
                Some(value) => fixed_duration(cx, value, &obj.at("time")),
                None => {
                    obj.missing(cx, "time");
                    None
                }
            };
            Some(Condition::CompareTimeSinceVar {
                role,
                name: name?,
                op: op?,
                duration: duration?,
            })
        }
        "has_items" => {
            let inner = Obj::new(cx, obj.get(key)?, at)?;
            let item = inner.req_str(cx, "item");
            let count = req_int(cx, &inner, "count");
            Some(Condition::HasItems {
                role,
                item: item?.to_string(),
                count: count?,
            })
        }
        "has_item_category" => {
            let category = text(cx, obj, key);
            let count = int_or(cx, obj, "count", 1);
            Some(Condition::HasItemCategory {
                role,
                category: category?,
                count,
            })
        }
        "has_skill" => {
            let inner = Obj::new(cx, obj.get(key)?, at)?;
            let skill = inner.req_str(cx, "skill");
            let level = req_int(cx, &inner, "level");
            Some(Condition::HasSkill {
                role,
                skill: skill?.to_string(),
                level: level?,
            })
        }
        "has_faction_trust" => {
            int_expr(cx, obj.get(key)?, &at).map(|amount| Condition::HasFactionTrust { role, amount })
        }
        _ => None,
    }
}

fn compare_int(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Condition> {
    let items = array(cx, value, path)?;
    let [lhs, op, rhs] = items.as_slice() else {
        cx.error(path, "`compare_int` takes `[a, op, b]`");
        return None;
    };
    let a = int_expr(cx, lhs.0, &lhs.1);
    let op = match op.0.as_str() {
        Some(symbol) => {
            let compare = CompareOp::from_symbol(symbol);
            if compare.is_none() {
                cx.unknown(&op.1, "comparison", symbol, COMPARE_SYMBOLS.iter().copied());
            }
            compare
        }
        None => {
            cx.error(&op.1, "expected a comparison operator");
            None
        }
    };
    let b = int_expr(cx, rhs.0, &rhs.1);
    Some(Condition::CompareInt {
        lhs: a?,
        op: op?,
        rhs: b?,
    })
}

fn compare_string(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Condition> {
    let items = array(cx, value, path)?;
    let [lhs, rhs] = items.as_slice() else {
        cx.error(path, "`compare_string` takes two strings");
        return None;
    };
    let a = str_expr(cx, lhs.0, &lhs.1);
    let b = str_expr(cx, rhs.0, &rhs.1);
    Some(Condition::CompareString(a?, b?))
}
