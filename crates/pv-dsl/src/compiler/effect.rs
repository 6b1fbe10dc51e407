//! Effects: the string catalog, keyed sub-effect objects, effect lists and
//! the opinion-carrying effect blocks of responses.

use serde_json::Value;

use pv_core::talker::{RuleChange, RuleSlot};
use pv_core::world::{MessageKind, SoundKind};
use pv_core::{NamedAction, Opinion, Role, TimeDuration};
use pv_dialogue::effect::{ItemTransfer, MissionOutcome, NearbyNpcs, PositionVar, TextSource};
use pv_dialogue::expr::{ArithOp, IntExpr, VarScope};
use pv_dialogue::{Effect, EffectOnCondition, TalkEffect, TrialMod};

use super::condition::condition;
use super::expr::{assignment, duration_or, int_expr, int_or, req_duration, req_int, var_name};
use crate::locate::KeyPath;
use crate::reader::{Cx, Obj, array, one_or_many};

/// String effects that are not named actions.
const STRING_EFFECTS: &[&str] = &[
    "u_bulk_trade_accept",
    "npc_bulk_trade_accept",
    "u_bulk_donate",
    "npc_bulk_donate",
    "lightning",
    "next_weather",
    "npc_gets_item",
    "npc_gets_item_to_use",
];

/// Keys that introduce a sub-effect object, in the order they are tried.
pub(crate) const SUB_EFFECTS: &[&str] = &[
    "companion_mission",
    "u_add_effect",
    "npc_add_effect",
    "u_lose_effect",
    "npc_lose_effect",
    "u_add_var",
    "npc_add_var",
    "u_lose_var",
    "npc_lose_var",
    "u_adjust_var",
    "npc_adjust_var",
    "u_add_trait",
    "npc_add_trait",
    "u_lose_trait",
    "npc_lose_trait",
    "u_spend_cash",
    "u_sell_item",
    "u_buy_item",
    "u_spawn_item",
    "u_consume_item",
    "npc_consume_item",
    "u_remove_item_with",
    "npc_remove_item_with",
    "u_bulk_trade_accept",
    "npc_bulk_trade_accept",
    "u_bulk_donate",
    "npc_bulk_donate",
    "npc_change_class",
    "add_mission",
    "npc_change_faction",
    "u_faction_rep",
    "add_debt",
    "toggle_npc_rule",
    "set_npc_rule",
    "clear_npc_rule",
    "set_npc_engagement_rule",
    "set_npc_aim_rule",
    "set_npc_cbm_reserve_rule",
    "set_npc_cbm_recharge_rule",
    "npc_set_goal",
    "mapgen_update",
    "u_transform_radius",
    "npc_transform_radius",
    "u_location_variable",
    "npc_location_variable",
    "u_buy_monster",
    "u_learn_recipe",
    "npc_first_topic",
    "sound_effect",
    "u_message",
    "npc_message",
    "u_add_wet",
    "npc_add_wet",
    "u_assign_activity",
    "npc_assign_activity",
    "assign_mission",
    "finish_mission",
    "u_make_sound",
    "npc_make_sound",
    "set_queue_effect_on_condition",
    "u_set_queue_eoc",
    "npc_set_queue_eoc",
    "set_weighted_list_eocs",
    "u_mod_healthy",
    "npc_mod_healthy",
    "u_add_morale",
    "npc_add_morale",
    "u_lose_morale",
    "npc_lose_morale",
    "u_add_faction_trust",
    "u_lose_faction_trust",
    "u_add_bionic",
    "npc_add_bionic",
    "u_lose_bionic",
    "npc_lose_bionic",
    "u_cast_spell",
    "npc_cast_spell",
    "arithmetic",
    "u_set_spawn_monster",
    "npc_set_spawn_monster",
    "u_set_field",
    "npc_set_field",
    "custom_light_level",
];

const MESSAGE_KINDS: &[&str] = &[
    "good", "neutral", "bad", "mixed", "warning", "info", "debug", "headshot", "critical",
    "grazing",
];

const SOUND_KINDS: &[&str] = &[
    "background",
    "weather",
    "music",
    "movement",
    "speech",
    "electronic_speech",
    "activity",
    "destructive_activity",
    "alarm",
    "combat",
    "alert",
    "order",
];

/// A bare effect name.
pub(crate) fn string_effect(cx: &mut Cx<'_>, name: &str, path: &KeyPath) -> Option<Effect> {
    if let Some(action) = NamedAction::from_name(name) {
        return Some(Effect::Named(action));
    }
    let effect = match name {
        "u_bulk_trade_accept" => bulk(Role::Alpha, true, None),
        "npc_bulk_trade_accept" => bulk(Role::Beta, true, None),
        "u_bulk_donate" => bulk(Role::Alpha, false, None),
        "npc_bulk_donate" => bulk(Role::Beta, false, None),
        "lightning" => Effect::Lightning,
        "next_weather" => Effect::NextWeather,
        "npc_gets_item" => Effect::GiveItem { to_use: false },
        "npc_gets_item_to_use" => Effect::GiveItem { to_use: true },
        _ => {
            let known = NamedAction::names().chain(STRING_EFFECTS.iter().copied());
            cx.unknown(path, "effect", name, known);
            return None;
        }
    };
    Some(effect)
}

fn bulk(role: Role, trade: bool, quantity: Option<i64>) -> Effect {
    Effect::BulkTrade {
        role,
        trade,
        quantity,
    }
}

/// One effect or an array of them; every entry is checked.
pub(crate) fn effect_list(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Vec<Effect>> {
    let mut effects = Some(Vec::new());
    for (entry, at) in one_or_many(value, path) {
        let effect = match entry {
            Value::String(name) => string_effect(cx, name, &at),
            Value::Object(_) => Obj::new(cx, entry, at).and_then(|obj| sub_effect(cx, &obj)),
            _ => {
                cx.error(&at, "expected an effect name or an effect object");
                None
            }
        };
        match (effects.as_mut(), effect) {
            (Some(list), Some(effect)) => list.push(effect),
            _ => effects = None,
        }
    }
    effects
}

/// The `opinion`, `mission_opinion` and `member` effects of an object.
pub(crate) fn effect_block(cx: &mut Cx<'_>, obj: &Obj<'_>, member: &str) -> Option<TalkEffect> {
    let opinion = obj.object(cx, "opinion").map(|o| opinion(cx, &o));
    let mission_opinion = obj.object(cx, "mission_opinion").map(|o| self::opinion(cx, &o));
    let effects = match obj.get(member) {
        Some(value) => effect_list(cx, value, &obj.at(member))?,
        None => Vec::new(),
    };
    let mut block = TalkEffect::default();
    for effect in effects {
        block.push(effect);
    }
    if let Some(opinion) = opinion {
        block = block.with_opinion(opinion);
    }
    if let Some(opinion) = mission_opinion {
        block = block.with_mission_opinion(opinion);
    }
    Some(block)
}

fn opinion(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Opinion {
    let mut field = |key: &str| obj.small_int(cx, key).unwrap_or(0);
    let trust = field("trust");
    let fear = field("fear");
    let value = field("value");
    let anger = field("anger");
    Opinion::new(trust, fear, value, anger)
}

/// An effect-on-condition definition; inline ones may omit their id.
pub(crate) fn effect_on_condition(
    cx: &mut Cx<'_>,
    obj: &Obj<'_>,
    inline: bool,
) -> Option<EffectOnCondition> {
    let id = if inline && !obj.has("id") {
        Some(cx.inline_id("eoc"))
    } else {
        obj.req_str(cx, "id").map(str::to_string)
    };
    let condition = obj
        .get("condition")
        .map(|value| condition(cx, value, &obj.at("condition")));
    let effects = match obj.get("effect") {
        Some(value) => effect_list(cx, value, &obj.at("effect")),
        None => Some(Vec::new()),
    };
    let false_effects = obj
        .get("false_effect")
        .map(|value| effect_list(cx, value, &obj.at("false_effect")));

    let mut eoc = EffectOnCondition::new(id?, effects?);
    if let Some(condition) = condition {
        eoc = eoc.with_condition(condition?);
    }
    if let Some(false_effects) = false_effects {
        eoc = eoc.with_false_effect(false_effects?);
    }
    Some(eoc)
}

/// An effect-on-condition named by id or declared inline.
fn eoc_ref(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<String> {
    match value {
        Value::String(id) => {
            cx.eoc_refs.push((id.clone(), path.clone()));
            Some(id.clone())
        }
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            let eoc = effect_on_condition(cx, &obj, true)?;
            let id = eoc.id.clone();
            cx.inline_eocs.push(eoc);
            Some(id)
        }
        _ => {
            cx.error(path, "expected an effect-on-condition id or object");
            None
        }
    }
}

/// A keyed effect object.
pub(crate) fn sub_effect(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<Effect> {
    let Some(key) = obj.first_of(SUB_EFFECTS) else {
        match obj.map.keys().next() {
            Some(first) => cx.unknown(&obj.at(first), "effect", first, SUB_EFFECTS.iter().copied()),
            None => cx.error(&obj.path, "empty effect"),
        }
        return None;
    };
    let (role, name) = Role::split_key(key).unwrap_or((Role::Alpha, key));
    let at = obj.at(key);
    let value = obj.get(key)?;

    let effect = match name {
        "companion_mission" => Effect::CompanionMission(owned(cx, obj, key)?),
        "add_effect" => {
            let id = owned(cx, obj, key);
            let duration = req_duration(cx, obj, "duration");
            let intensity = int_or(cx, obj, "intensity", 0);
            let target_part = obj.str(cx, "target_part").map(str::to_string);
            let force = obj.bool(cx, "force", false);
            Effect::AddEffect {
                role,
                id: id?,
                duration: duration?,
                intensity,
                target_part,
                force,
            }
        }
        "lose_effect" => Effect::LoseEffect { role, id: owned(cx, obj, key)? },
        "add_var" => add_var(cx, obj, key, role)?,
        "lose_var" => Effect::LoseVar {
            role,
            name: var_name(cx, obj, key)?,
        },
        "adjust_var" => {
            let name = var_name(cx, obj, key);
            let adjustment = req_int(cx, obj, "adjustment");
            Effect::AdjustVar {
                role,
                name: name?,
                adjustment: adjustment?,
            }
        }
        "add_trait" => Effect::AddTrait { role, id: owned(cx, obj, key)? },
        "lose_trait" => Effect::LoseTrait { role, id: owned(cx, obj, key)? },
        "add_bionic" => Effect::AddBionic { role, id: owned(cx, obj, key)? },
        "lose_bionic" => Effect::LoseBionic { role, id: owned(cx, obj, key)? },
        "spend_cash" => Effect::SpendCash(obj.int(cx, key)?),
        "sell_item" | "buy_item" | "spawn_item" | "consume_item" | "remove_item_with" => {
            item_effect(cx, obj, key, role, name)?
        }
        "bulk_trade_accept" | "bulk_donate" => {
            let quantity = obj.int(cx, key)?;
            bulk(role, name == "bulk_trade_accept", Some(quantity))
        }
        "change_class" => Effect::ChangeClass(owned(cx, obj, key)?),
        "add_mission" => Effect::AddMission(owned(cx, obj, key)?),
        "change_faction" => Effect::ChangeFaction(owned(cx, obj, key)?),
        "faction_rep" => Effect::FactionRep(obj.small_int(cx, key)?),
        "add_debt" => Effect::AddDebt(debt_mods(cx, value, &at)?),
        "toggle_npc_rule" => Effect::Rule(RuleChange::Toggle(owned(cx, obj, key)?)),
        "set_npc_rule" => Effect::Rule(RuleChange::Set(owned(cx, obj, key)?)),
        "clear_npc_rule" => Effect::Rule(RuleChange::Clear(owned(cx, obj, key)?)),
        "set_npc_engagement_rule" => rule_slot(RuleSlot::Engagement, owned(cx, obj, key)?),
        "set_npc_aim_rule" => rule_slot(RuleSlot::Aim, owned(cx, obj, key)?),
        "set_npc_cbm_reserve_rule" => rule_slot(RuleSlot::CbmReserve, owned(cx, obj, key)?),
        "set_npc_cbm_recharge_rule" => rule_slot(RuleSlot::CbmRecharge, owned(cx, obj, key)?),
        "set_goal" => Effect::SetGoal(goal(cx, value, &at)?),
        "mapgen_update" => {
            let updates = obj.strings(cx, key);
            let target = target_var(cx, obj, Role::Beta);
            Effect::Mapgen { updates, target }
        }
        "transform_radius" => {
            let radius = int_expr(cx, value, &at);
            let transform = obj.req_str(cx, "ter_furn_transform");
            let target = target_var(cx, obj, role);
            Effect::TransformRadius {
                role,
                transform: transform?.to_string(),
                radius: radius?,
                target,
            }
        }
        "location_variable" => {
            let var = Obj::new(cx, value, at).and_then(|inner| position_var(cx, &inner, role));
            let min_radius = int_or(cx, obj, "min_radius", 0);
            let max_radius = int_or(cx, obj, "max_radius", 0);
            let outdoor_only = obj.bool(cx, "outdoor_only", false);
            Effect::LocationVariable {
                role,
                var: var?,
                min_radius,
                max_radius,
                outdoor_only,
            }
        }
        "buy_monster" => {
            let monster = owned(cx, obj, key);
            let cost = obj.int_or(cx, "cost", 0);
            let count = obj.small_int(cx, "count").unwrap_or(1);
            let pacified = obj.bool(cx, "pacified", false);
            let name = obj.str(cx, "name").map(str::to_string);
            Effect::BuyMonster {
                monster: monster?,
                cost,
                count,
                pacified,
                name,
            }
        }
        "learn_recipe" => Effect::LearnRecipe(owned(cx, obj, key)?),
        "first_topic" => Effect::SetFirstTopic(owned(cx, obj, key)?),
        "sound_effect" => {
            let variant = owned(cx, obj, key);
            let id = obj.req_str(cx, "id");
            let outdoor_event = obj.bool(cx, "outdoor_event", false);
            let volume = obj.small_int(cx, "volume").filter(|v| *v >= 0);
            Effect::SoundEffect {
                id: id?.to_string(),
                variant: variant?,
                volume,
                outdoor_event,
            }
        }
        "message" => {
            let source = text_source(cx, obj, key);
            let outdoor_only = obj.bool(cx, "outdoor_only", false);
            let sound = obj.bool(cx, "sound", false);
            let popup = obj.bool(cx, "popup", false);
            let kind = kind_of(cx, obj, "neutral", MessageKind::from_name, MESSAGE_KINDS);
            Effect::Message {
                role,
                text: source?,
                outdoor_only,
                sound,
                popup,
                kind: kind?,
            }
        }
        "make_sound" => {
            let source = text_source(cx, obj, key);
            let volume = match obj.get("volume") {
                Some(_) => obj.small_int(cx, "volume"),
                None => {
                    obj.missing(cx, "volume");
                    None
                }
            };
            let kind = kind_of(cx, obj, "background", SoundKind::from_name, SOUND_KINDS);
            let target = target_var(cx, obj, role);
            Effect::MakeSound {
                role,
                text: source?,
                volume: volume?,
                kind: kind?,
                target,
            }
        }
        "add_wet" => Effect::AddWet {
            role,
            amount: int_expr(cx, value, &at)?,
        },
        "assign_activity" => {
            let activity = owned(cx, obj, key);
            let duration = req_duration(cx, obj, "duration");
            Effect::AssignActivity {
                role,
                activity: activity?,
                duration: duration?,
            }
        }
        "assign_mission" => Effect::AssignMission(owned(cx, obj, key)?),
        "finish_mission" => {
            let mission_type = owned(cx, obj, key);
            let outcome = if obj.has("step") {
                obj.small_int(cx, "step").map(MissionOutcome::Step)
            } else if obj.has("success") {
                Some(if obj.bool(cx, "success", false) {
                    MissionOutcome::Success
                } else {
                    MissionOutcome::Failure
                })
            } else {
                obj.missing(cx, "success");
                None
            };
            Effect::FinishMission {
                mission_type: mission_type?,
                outcome: outcome?,
            }
        }
        "set_queue_effect_on_condition" | "set_queue_eoc" => queue_eoc(cx, obj, key, role)?,
        "set_weighted_list_eocs" => Effect::WeightedEocs(weighted_eocs(cx, value, &at)?),
        "mod_healthy" => {
            let amount = int_expr(cx, value, &at);
            let cap = req_int(cx, obj, "cap");
            Effect::ModHealthy {
                role,
                amount: amount?,
                cap: cap?,
            }
        }
        "add_morale" => {
            let morale_type = owned(cx, obj, key);
            let bonus = req_int(cx, obj, "bonus");
            let max_bonus = req_int(cx, obj, "max_bonus");
            let duration = duration_or(cx, obj, "duration", TimeDuration::from_hours(1));
            let decay_start = duration_or(cx, obj, "decay_start", TimeDuration::from_minutes(30));
            let capped = obj.bool(cx, "capped", false);
            Effect::AddMorale {
                role,
                morale_type: morale_type?,
                bonus: bonus?,
                max_bonus: max_bonus?,
                duration,
                decay_start,
                capped,
            }
        }
        "lose_morale" => Effect::LoseMorale {
            role,
            morale_type: owned(cx, obj, key)?,
        },
        "add_faction_trust" => Effect::FactionTrust(int_expr(cx, value, &at)?),
        "lose_faction_trust" => {
            let amount = int_expr(cx, value, &at)?;
            Effect::FactionTrust(IntExpr::binary(ArithOp::Sub, IntExpr::Const(0), amount))
        }
        "cast_spell" => Effect::CastSpell {
            role,
            spell: spell_id(cx, value, &at)?,
        },
        "arithmetic" => Effect::Assign(assignment(cx, value, &at)?),
        "set_spawn_monster" => {
            let monster = owned(cx, obj, key);
            let hallucinations = int_or(cx, obj, "hallucination_count", 0);
            let real = int_or(cx, obj, "real_count", 0);
            let lifespan_min = duration_or(cx, obj, "lifespan_min", TimeDuration::ZERO);
            let lifespan_max = duration_or(cx, obj, "lifespan_max", TimeDuration::ZERO);
            let target = target_var(cx, obj, role);
            Effect::SpawnMonster {
                role,
                monster: monster?,
                hallucinations,
                real,
                lifespan_min,
                lifespan_max,
                target,
            }
        }
        "set_field" => {
            let field = owned(cx, obj, key);
            let intensity = int_or(cx, obj, "intensity", 1);
            let age = duration_or(cx, obj, "age", TimeDuration::from_turns(1));
            let radius = int_or(cx, obj, "radius", 10_000_000);
            let hit_player = obj.bool(cx, "hit_player", true);
            let target = target_var(cx, obj, role);
            Effect::SetField {
                role,
                field: field?,
                intensity,
                age,
                radius,
                hit_player,
                target,
            }
        }
        "custom_light_level" => {
            let level = int_expr(cx, value, &at);
            let length_min = duration_or(cx, obj, "length_min", TimeDuration::ZERO);
            let length_max = duration_or(cx, obj, "length_max", TimeDuration::ZERO);
            Effect::LightLevel {
                level: level?,
                length_min,
                length_max,
            }
        }
        _ => {
            cx.unknown(&at, "effect", key, SUB_EFFECTS.iter().copied());
            return None;
        }
    };
    Some(effect)
}

fn owned(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<String> {
    obj.str(cx, key).map(str::to_string)
}

fn rule_slot(slot: RuleSlot, value: String) -> Effect {
    Effect::Rule(RuleChange::Slot(slot, value))
}

fn add_var(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str, role: Role) -> Option<Effect> {
    let name = var_name(cx, obj, key);
    let stamp_time = obj.bool(cx, "time", false);
    let values = if stamp_time {
        Some(Vec::new())
    } else if obj.has("possible_values") {
        let values = obj.strings(cx, "possible_values");
        if values.is_empty() {
            cx.error(&obj.at("possible_values"), "`possible_values` is empty");
            None
        } else {
            Some(values)
        }
    } else {
        obj.req_str(cx, "value").map(|v| vec![v.to_string()])
    };
    Some(Effect::AddVar {
        role,
        name: name?,
        values: values?,
        stamp_time,
    })
}

fn item_effect(
    cx: &mut Cx<'_>,
    obj: &Obj<'_>,
    key: &str,
    role: Role,
    name: &str,
) -> Option<Effect> {
    let item = obj.str(cx, key).map(str::to_string);
    let cost = obj.int_or(cx, "cost", 0);
    let count = obj.int_or(cx, "count", 1);
    let container = obj.str(cx, "container").map(str::to_string);
    let transfer = |item: String| {
        let transfer = ItemTransfer::new(item, count).with_cost(cost);
        match &container {
            Some(container) => transfer.with_container(container.as_str()),
            None => transfer,
        }
    };
    let effect = match name {
        "sell_item" => Effect::SellItem(transfer(item?)),
        "buy_item" => {
            if cost <= 0 {
                cx.error(&obj.at(key), "`u_buy_item` needs a positive `cost`");
                return None;
            }
            Effect::BuyItem(transfer(item?))
        }
        "spawn_item" => Effect::SpawnItem(transfer(item?)),
        "consume_item" => Effect::ConsumeItem {
            role,
            item: item?,
            count,
        },
        _ => Effect::RemoveItemWith { role, item: item? },
    };
    Some(effect)
}

fn debt_mods(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Vec<TrialMod>> {
    let mut mods = Some(Vec::new());
    for (pair, at) in array(cx, value, path)? {
        let parsed = match pair.as_array().map(Vec::as_slice) {
            Some([Value::String(name), weight]) => match weight.as_i64().map(i32::try_from) {
                Some(Ok(weight)) => Some(TrialMod::new(name.as_str(), weight)),
                _ => {
                    cx.error(&at.index(1), "expected a whole-number weight");
                    None
                }
            },
            _ => {
                cx.error(&at, "expected `[name, weight]`");
                None
            }
        };
        match (mods.as_mut(), parsed) {
            (Some(list), Some(m)) => list.push(m),
            _ => mods = None,
        }
    }
    mods
}

fn goal(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<String> {
    match value {
        Value::String(goal) => Some(goal.clone()),
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            obj.req_str(cx, "om_terrain").map(str::to_string)
        }
        _ => {
            cx.error(path, "expected a destination");
            None
        }
    }
}

fn spell_id(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<String> {
    match value {
        Value::String(spell) => Some(spell.clone()),
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            obj.req_str(cx, "id").map(str::to_string)
        }
        _ => {
            cx.error(path, "expected a spell id or a spell object");
            None
        }
    }
}

/// `{value, type, context, global}` naming a position variable.
fn position_var(cx: &mut Cx<'_>, obj: &Obj<'_>, role: Role) -> Option<PositionVar> {
    let scope = if obj.bool(cx, "global", false) {
        VarScope::Global
    } else {
        VarScope::Actor(role)
    };
    var_name(cx, obj, "value").map(|name| PositionVar::new(scope, name))
}

/// The optional `target_var` of a positioned effect.
fn target_var(cx: &mut Cx<'_>, obj: &Obj<'_>, role: Role) -> Option<PositionVar> {
    let target = obj.object(cx, "target_var")?;
    position_var(cx, &target, role)
}

fn text_source(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<TextSource> {
    let text = obj.str(cx, key)?.to_string();
    if obj.bool(cx, "snippet", false) {
        let same = obj.bool(cx, "same_snippet", false);
        Some(TextSource::Snippet {
            category: text,
            same,
        })
    } else {
        Some(TextSource::Literal(text))
    }
}

fn kind_of<K>(
    cx: &mut Cx<'_>,
    obj: &Obj<'_>,
    default: &str,
    from_name: fn(&str) -> Option<K>,
    known: &[&str],
) -> Option<K> {
    let name = obj.str_or(cx, "type", default);
    let kind = from_name(&name);
    if kind.is_none() {
        cx.unknown(&obj.at("type"), "type", &name, known.iter().copied());
    }
    kind
}

fn queue_eoc(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str, role: Role) -> Option<Effect> {
    let mut eocs = Some(Vec::new());
    for (entry, at) in one_or_many(obj.get(key)?, &obj.at(key)) {
        match (eocs.as_mut(), eoc_ref(cx, entry, &at)) {
            (Some(list), Some(id)) => list.push(id),
            _ => eocs = None,
        }
    }
    let delay_min = duration_or(cx, obj, "time_in_future_min", TimeDuration::ZERO);
    let delay_max = duration_or(cx, obj, "time_in_future_max", TimeDuration::ZERO);
    let nearby = obj.bool(cx, "affect_nearby_npcs", false).then(|| NearbyNpcs {
        names: obj.strings(cx, "npcs_to_affect"),
        range: obj.small_int(cx, "npc_range"),
    });
    Some(Effect::QueueEoc {
        role,
        eocs: eocs?,
        delay_min,
        delay_max,
        nearby,
    })
}

fn weighted_eocs(
    cx: &mut Cx<'_>,
    value: &Value,
    path: &KeyPath,
) -> Option<Vec<(String, IntExpr)>> {
    let mut list = Some(Vec::new());
    for (pair, at) in array(cx, value, path)? {
        let entry = match pair.as_array().map(Vec::as_slice) {
            Some([eoc]) => eoc_ref(cx, eoc, &at.index(0)).map(|id| (id, IntExpr::Const(1))),
            Some([eoc, weight]) => {
                let id = eoc_ref(cx, eoc, &at.index(0));
                let weight = int_expr(cx, weight, &at.index(1));
                id.zip(weight)
            }
            _ => {
                cx.error(&at, "expected `[eoc, weight]`");
                None
            }
        };
        match (list.as_mut(), entry) {
            (Some(entries), Some(entry)) => entries.push(entry),
            _ => list = None,
        }
    }
    list
}
