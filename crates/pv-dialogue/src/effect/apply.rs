use pv_core::talker::{EffectGrant, MoraleChange};
use pv_core::vars::parse_int;
use pv_core::world::{FieldPlacement, MonsterPurchase, MonsterSpawn, Sound};
use pv_core::{Role, TimeDuration, Tripoint};

use super::schedule::{queue_eocs, random_duration, run_weighted};
use super::{trade, Effect, MissionOutcome, PositionVar, TextSource};
use crate::dialogue::Dialogue;
use crate::error::DialogueResult;
use crate::expr::read_position;

const SLEEP_EFFECT: &str = "sleep";
const DEFAULT_SFX_VOLUME: i32 = 80;
const LOCATION_ATTEMPTS: usize = 25;

fn narrow(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn target_position(
    d: &Dialogue<'_>,
    role: Role,
    target: Option<&PositionVar>,
) -> DialogueResult<Tripoint> {
    let fallback = d.actor(role).pos();
    match target {
        Some(var) => read_position(d, var.scope, &var.name, fallback),
        None => Ok(fallback),
    }
}

/// Resolve message text; `role` is the receiver, and pinned snippets live on
/// the other speaker.
fn resolve_text(d: &mut Dialogue<'_>, role: Role, source: &TextSource) -> String {
    let (category, same) = match source {
        TextSource::Literal(text) => return text.clone(),
        TextSource::Snippet { category, same } => (category, *same),
    };
    let registry = d.shared_registry();
    let pool = registry.snippets(category);
    if !same {
        return d
            .random_index(pool.len())
            .map(|i| pool[i].text.clone())
            .unwrap_or_default();
    }
    let key = format!("{category}_snippet_id");
    let holder = role.other();
    let pinned = d.actor(holder).get_value(&key).filter(|id| !id.is_empty());
    let id = match pinned {
        Some(id) => id,
        None => {
            let Some(i) = d.random_index(pool.len()) else {
                return String::new();
            };
            let id = pool[i].id.clone();
            d.actor_mut(holder).set_value(&key, &id);
            id
        }
    };
    registry
        .snippet(&id)
        .map(|s| s.text.clone())
        .unwrap_or_default()
}

fn can_hear(d: &Dialogue<'_>, role: Role, outdoor_only: bool) -> bool {
    let listener = d.actor(role);
    if listener.has_effect(SLEEP_EFFECT) || listener.is_deaf() {
        return false;
    }
    !outdoor_only || listener.pos().z >= 0
}

fn find_location(
    d: &Dialogue<'_>,
    center: Tripoint,
    min_radius: i32,
    max_radius: i32,
    outdoor_only: bool,
) -> Option<Tripoint> {
    if max_radius <= 0 {
        return Some(center);
    }
    let span = i64::from(max_radius);
    (0..LOCATION_ATTEMPTS).find_map(|_| {
        let offset = Tripoint::new(
            narrow(d.random_range(-span, span)),
            narrow(d.random_range(-span, span)),
            0,
        );
        let candidate = center + offset;
        let valid = d.world().is_valid_target(candidate, outdoor_only);
        (valid && candidate.distance(center) >= min_radius).then_some(candidate)
    })
}

impl Effect {
    /// Apply the effect to a live conversation.
    pub fn apply(&self, d: &mut Dialogue<'_>) -> DialogueResult<()> {
        match self {
            Effect::Named(action) => d.actor_mut(Role::Beta).perform(*action),
            Effect::BulkTrade {
                role,
                trade,
                quantity,
            } => trade::bulk_trade(d, *role, *trade, *quantity),
            Effect::Lightning => {
                if d.actor(Role::Alpha).pos().z >= 0 {
                    d.world_mut().lightning();
                }
            }
            Effect::NextWeather => d.world_mut().next_weather(),
            Effect::GiveItem { to_use } => {
                d.reason = d.actor_mut(Role::Beta).receive_gift(*to_use);
            }
            Effect::CompanionMission(role) => d.world_mut().companion_mission(role),
            Effect::AddEffect {
                role,
                id,
                duration,
                intensity,
                target_part,
                force,
            } => {
                let grant = EffectGrant {
                    id: id.clone(),
                    duration: duration.evaluate(d)?,
                    intensity: narrow(intensity.evaluate(d)?),
                    target_part: target_part.clone(),
                    force: *force,
                };
                d.actor_mut(*role).add_effect(grant);
            }
            Effect::LoseEffect { role, id } => d.actor_mut(*role).remove_effect(id, None),
            Effect::AddVar {
                role,
                name,
                values,
                stamp_time,
            } => {
                let value = if *stamp_time {
                    d.world().now().turn().to_string()
                } else {
                    d.random_index(values.len())
                        .map(|i| values[i].clone())
                        .unwrap_or_default()
                };
                d.actor_mut(*role).set_value(name, &value);
            }
            Effect::LoseVar { role, name } => d.actor_mut(*role).remove_value(name),
            Effect::AdjustVar {
                role,
                name,
                adjustment,
            } => {
                let delta = adjustment.evaluate(d)?;
                let current = parse_int(name, d.actor(*role).get_value(name).as_deref())?;
                let value = current.wrapping_add(delta);
                d.actor_mut(*role).set_value(name, &value.to_string());
            }
            Effect::AddTrait { role, id } => d.actor_mut(*role).add_trait(id),
            Effect::LoseTrait { role, id } => d.actor_mut(*role).remove_trait(id),
            Effect::AddBionic { role, id } => d.actor_mut(*role).add_bionic(id),
            Effect::LoseBionic { role, id } => d.actor_mut(*role).remove_bionic(id),
            Effect::SpendCash(amount) => {
                if !trade::pay(d, *amount) {
                    tracing::debug!(amount, "not enough cash to spend");
                }
            }
            Effect::SpawnItem(transfer) => trade::receive_item(d, transfer),
            Effect::BuyItem(transfer) => trade::buy_item(d, transfer),
            Effect::SellItem(transfer) => trade::sell_item(d, transfer),
            Effect::ConsumeItem { role, item, count } => {
                trade::consume_item(d, *role, item, *count);
            }
            Effect::RemoveItemWith { role, item } => {
                d.actor_mut(*role).use_amount(item, i64::MAX);
            }
            Effect::ChangeFaction(faction) => d.actor_mut(Role::Beta).set_faction(faction),
            Effect::ChangeClass(class) => d.actor_mut(Role::Beta).set_class(class),
            Effect::FactionRep(amount) => {
                if let Some(faction) = d.actor(Role::Beta).faction() {
                    d.world_mut().adjust_faction_rep(&faction, *amount);
                }
            }
            Effect::AddDebt(mods) => {
                let mut debt = 0i64;
                for m in mods {
                    if m.attribute == "TOTAL" {
                        debt = debt.saturating_mul(i64::from(m.weight));
                    } else {
                        let alpha = d.actor(Role::Alpha).parse_mod(&m.attribute, m.weight);
                        let beta = d.actor(Role::Beta).parse_mod(&m.attribute, m.weight);
                        debt = debt
                            .saturating_add(i64::from(alpha))
                            .saturating_add(i64::from(beta));
                    }
                }
                d.actor_mut(Role::Beta).add_debt(debt);
            }
            Effect::Rule(change) => d.actor_mut(Role::Beta).change_rule(change.clone()),
            Effect::SetGoal(location) => d.actor_mut(Role::Beta).set_goal(location),
            Effect::AddMission(mission_type) => d.actor_mut(Role::Beta).add_mission(mission_type),
            Effect::AssignMission(mission_type) => {
                let alpha = d.actor(Role::Alpha).id();
                let giver = d.actor_mut(Role::Beta);
                giver.add_mission(mission_type);
                let fresh = giver
                    .available_missions()
                    .into_iter()
                    .rev()
                    .find(|id| giver.mission(*id).is_some_and(|m| m.type_id == *mission_type));
                match fresh {
                    Some(id) => giver.assign_mission(id, alpha),
                    None => tracing::warn!(mission = %mission_type, "new mission was not created"),
                }
            }
            Effect::FinishMission {
                mission_type,
                outcome,
            } => {
                let alpha = d.actor(Role::Alpha).id();
                let giver = d.actor_mut(Role::Beta);
                let active = giver.assigned_missions().into_iter().find(|id| {
                    giver
                        .mission(*id)
                        .is_some_and(|m| m.type_id == *mission_type && m.is_assigned_to(alpha))
                });
                match (active, outcome) {
                    (None, _) => tracing::debug!(mission = %mission_type, "no active mission to finish"),
                    (Some(id), MissionOutcome::Step(step)) => giver.step_mission(id, *step),
                    (Some(id), MissionOutcome::Success) => giver.finish_mission(id, true),
                    (Some(id), MissionOutcome::Failure) => giver.finish_mission(id, false),
                }
            }
            Effect::BuyMonster {
                monster,
                cost,
                count,
                pacified,
                name,
            } => {
                if trade::pay(d, *cost) {
                    d.world_mut().buy_monster(MonsterPurchase {
                        monster: monster.clone(),
                        count: *count,
                        pacified: *pacified,
                        name: name.clone(),
                    });
                } else {
                    d.world_mut().popup("You can't afford it!");
                }
            }
            Effect::LearnRecipe(recipe) => {
                d.actor_mut(Role::Alpha).learn_recipe(recipe);
                let result = trade::item_name(d.world(), recipe);
                d.world_mut()
                    .popup(&format!("You learn how to craft {result}."));
            }
            Effect::SetFirstTopic(topic) => d.actor_mut(Role::Beta).set_first_topic(topic),
            Effect::Mapgen { updates, target } => {
                let role = if d.has_actor(Role::Beta) {
                    Role::Beta
                } else {
                    Role::Alpha
                };
                let pos = target_position(d, role, target.as_ref())?;
                for update in updates {
                    d.world_mut().mapgen_update(update, pos);
                }
            }
            Effect::TransformRadius {
                role,
                transform,
                radius,
                target,
            } => {
                let pos = target_position(d, *role, target.as_ref())?;
                let radius = narrow(radius.evaluate(d)?);
                d.world_mut().transform_radius(transform, radius, pos);
            }
            Effect::LocationVariable {
                role,
                var,
                min_radius,
                max_radius,
                outdoor_only,
            } => {
                let center = d.actor(*role).pos();
                let max = narrow(max_radius.evaluate(d)?);
                let min = narrow(min_radius.evaluate(d)?);
                match find_location(d, center, min, max, *outdoor_only) {
                    Some(pos) => var.scope.write(d, &var.name, &pos.to_string()),
                    None => tracing::debug!(var = %var.name, "no location found"),
                }
            }
            Effect::SoundEffect {
                id,
                variant,
                volume,
                outdoor_event,
            } => {
                if can_hear(d, Role::Alpha, *outdoor_event) {
                    let volume = volume.unwrap_or(DEFAULT_SFX_VOLUME);
                    d.world_mut().sound_effect(id, variant, volume);
                }
            }
            Effect::Message {
                role,
                text,
                outdoor_only,
                sound,
                popup,
                kind,
            } => {
                if d.actor(*role).is_npc() {
                    return Ok(());
                }
                let message = resolve_text(d, *role, text);
                if *sound && !can_hear(d, *role, *outdoor_only) {
                    return Ok(());
                }
                if *popup {
                    d.world_mut().popup(&message);
                } else {
                    d.world_mut().add_message(*kind, &message);
                }
            }
            Effect::MakeSound {
                role,
                text,
                volume,
                kind,
                target,
            } => {
                let pos = target_position(d, *role, target.as_ref())?;
                let description = resolve_text(d, *role, text);
                d.world_mut().sound(Sound {
                    pos,
                    volume: *volume,
                    kind: *kind,
                    description,
                });
            }
            Effect::AddWet { role, amount } => {
                let amount = narrow(amount.evaluate(d)?);
                d.actor_mut(*role).add_wet(amount);
            }
            Effect::AssignActivity {
                role,
                activity,
                duration,
            } => {
                let duration = duration.evaluate(d)?;
                d.actor_mut(*role).assign_activity(activity, duration);
            }
            Effect::QueueEoc {
                role,
                eocs,
                delay_min,
                delay_max,
                nearby,
            } => queue_eocs(d, *role, eocs, delay_min, delay_max, nearby.as_ref())?,
            Effect::WeightedEocs(choices) => run_weighted(d, choices)?,
            Effect::ModHealthy { role, amount, cap } => {
                let amount = narrow(amount.evaluate(d)?);
                let cap = narrow(cap.evaluate(d)?);
                d.actor_mut(*role).mod_healthy(amount, cap);
            }
            Effect::AddMorale {
                role,
                morale_type,
                bonus,
                max_bonus,
                duration,
                decay_start,
                capped,
            } => {
                let change = MoraleChange {
                    morale_type: morale_type.clone(),
                    bonus: narrow(bonus.evaluate(d)?),
                    max_bonus: narrow(max_bonus.evaluate(d)?),
                    duration: duration.evaluate(d)?,
                    decay_start: decay_start.evaluate(d)?,
                    capped: *capped,
                };
                d.actor_mut(*role).add_morale(change);
            }
            Effect::LoseMorale { role, morale_type } => {
                d.actor_mut(*role).remove_morale(morale_type);
            }
            Effect::FactionTrust(amount) => {
                let amount = narrow(amount.evaluate(d)?);
                d.actor_mut(Role::Beta).add_faction_trust(amount);
            }
            Effect::CastSpell { role, spell } => d.actor_mut(*role).cast_spell(spell),
            Effect::Assign(assignment) => assignment.apply(d)?,
            Effect::SpawnMonster {
                role,
                monster,
                hallucinations,
                real,
                lifespan_min,
                lifespan_max,
                target,
            } => {
                let pos = target_position(d, *role, target.as_ref())?;
                let min = lifespan_min.evaluate(d)?;
                let lifespan = if min > TimeDuration::ZERO {
                    let max = lifespan_max.evaluate(d)?;
                    Some(random_duration(d, min, max))
                } else {
                    None
                };
                let spawn = MonsterSpawn {
                    group: monster.clone(),
                    pos,
                    hallucinations: narrow(hallucinations.evaluate(d)?),
                    real: narrow(real.evaluate(d)?),
                    lifespan,
                };
                if d.world_mut().spawn_monsters(spawn) == 0 {
                    tracing::debug!(monster = %monster, "no spawn point found");
                }
            }
            Effect::SetField {
                role,
                field,
                intensity,
                age,
                radius,
                hit_player,
                target,
            } => {
                let placement = FieldPlacement {
                    field: field.clone(),
                    pos: target_position(d, *role, target.as_ref())?,
                    intensity: narrow(intensity.evaluate(d)?),
                    age: age.evaluate(d)?,
                    radius: narrow(radius.evaluate(d)?),
                    hit_player: *hit_player,
                };
                d.world_mut().set_field(placement);
            }
            Effect::LightLevel {
                level,
                length_min,
                length_max,
            } => {
                let level = narrow(level.evaluate(d)?);
                let length = random_duration(d, length_min.evaluate(d)?, length_max.evaluate(d)?);
                let until = d.world().now() + length + TimeDuration::from_turns(1);
                d.world_mut().set_light_level(level, until);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pv_core::sandbox::WorldEvent;
    use pv_core::talker::RuleChange;
    use pv_core::world::{MessageKind, SoundKind};
    use pv_core::{
        GameWorld, Mission, MissionId, MissionStatus, NamedAction, Opinion, Talker, TimePoint,
    };

    use super::*;
    use crate::effect::TalkEffect;
    use crate::expr::{ArithOp, Assignment, DurationExpr, IntExpr, IntTarget, VarScope};
    use crate::registry::{Snippet, TopicRegistry};
    use crate::test_support::Fixture;
    use crate::trial::TrialMod;

    fn apply(fx: &mut Fixture, effects: &[Effect]) {
        let mut d = fx.dialogue();
        super::super::run_effects(effects, &mut d).unwrap();
    }

    #[test]
    fn named_actions_reach_the_npc() {
        let mut fx = Fixture::new();
        apply(&mut fx, &[Effect::Named(NamedAction::Follow)]);
        assert!(fx.beta.following);
        assert_eq!(fx.beta.performed, vec![NamedAction::Follow]);
    }

    #[test]
    fn variables_are_set_stamped_adjusted_and_removed() {
        let mut fx = Fixture::new();
        fx.world.set_now(TimePoint::from_turn(77));
        apply(
            &mut fx,
            &[
                Effect::AddVar {
                    role: Role::Beta,
                    name: "met".into(),
                    values: vec!["yes".into()],
                    stamp_time: false,
                },
                Effect::AddVar {
                    role: Role::Alpha,
                    name: "seen".into(),
                    values: Vec::new(),
                    stamp_time: true,
                },
                Effect::AdjustVar {
                    role: Role::Alpha,
                    name: "count".into(),
                    adjustment: IntExpr::Const(4),
                },
                Effect::AdjustVar {
                    role: Role::Alpha,
                    name: "count".into(),
                    adjustment: IntExpr::Const(-1),
                },
                Effect::LoseVar {
                    role: Role::Beta,
                    name: "met".into(),
                },
            ],
        );
        assert_eq!(fx.beta.get_value("met"), None);
        assert_eq!(fx.alpha.get_value("seen").as_deref(), Some("77"));
        assert_eq!(fx.alpha.get_value("count").as_deref(), Some("3"));
    }

    #[test]
    fn adjusting_garbage_is_an_error() {
        let mut fx = Fixture::new();
        fx.alpha.vars.set("count", "many");
        let mut d = fx.dialogue();
        let effect = Effect::AdjustVar {
            role: Role::Alpha,
            name: "count".into(),
            adjustment: IntExpr::Const(1),
        };
        assert!(effect.apply(&mut d).is_err());
    }

    #[test]
    fn later_effects_see_earlier_writes() {
        let mut fx = Fixture::new();
        let x = IntTarget::Var {
            scope: VarScope::Actor(Role::Alpha),
            name: "x".into(),
        };
        let y = IntTarget::Var {
            scope: VarScope::Actor(Role::Alpha),
            name: "y".into(),
        };
        apply(
            &mut fx,
            &[
                Effect::Assign(Assignment::new(
                    x.clone(),
                    IntExpr::binary(ArithOp::Add, IntExpr::Const(2), IntExpr::Const(3)),
                )),
                Effect::Assign(Assignment::compound(y, ArithOp::Add, x.as_expr())),
                Effect::Assign(Assignment::step(x, 1)),
            ],
        );
        assert_eq!(fx.alpha.get_value("x").as_deref(), Some("6"));
        assert_eq!(fx.alpha.get_value("y").as_deref(), Some("5"));
    }

    #[test]
    fn debt_modifiers_multiply_on_total() {
        let mut fx = Fixture::new();
        fx.beta.opinion.trust = 3;
        apply(
            &mut fx,
            &[Effect::AddDebt(vec![
                TrialMod::new("TRUST", 2),
                TrialMod::new("TOTAL", 10),
            ])],
        );
        let expected = 10
            * i64::from(
                fx.alpha.parse_mod("TRUST", 2) + fx.beta.parse_mod("TRUST", 2),
            );
        assert_eq!(fx.beta.debt, expected);
    }

    #[test]
    fn messages_only_reach_the_human_side() {
        let mut fx = Fixture::new();
        apply(
            &mut fx,
            &[
                Effect::Message {
                    role: Role::Beta,
                    text: TextSource::Literal("for the npc".into()),
                    outdoor_only: false,
                    sound: false,
                    popup: false,
                    kind: MessageKind::Neutral,
                },
                Effect::Message {
                    role: Role::Alpha,
                    text: TextSource::Literal("You hear birds.".into()),
                    outdoor_only: false,
                    sound: true,
                    popup: false,
                    kind: MessageKind::Good,
                },
            ],
        );
        assert_eq!(fx.world.messages().collect::<Vec<_>>(), vec!["You hear birds."]);
    }

    #[test]
    fn deaf_listeners_miss_sound_messages() {
        let mut fx = Fixture::new();
        fx.alpha.deaf = true;
        apply(
            &mut fx,
            &[Effect::Message {
                role: Role::Alpha,
                text: TextSource::Literal("A bell rings.".into()),
                outdoor_only: false,
                sound: true,
                popup: false,
                kind: MessageKind::Neutral,
            }],
        );
        assert_eq!(fx.world.messages().count(), 0);
    }

    #[test]
    fn same_snippet_is_pinned_on_the_other_speaker() {
        let mut registry = TopicRegistry::new();
        for (id, text) in [("a", "first"), ("b", "second"), ("c", "third")] {
            registry.insert_snippet("rumor", Snippet::new(id, text));
        }
        let mut fx = Fixture::with_registry(registry);
        let rumor = Effect::Message {
            role: Role::Alpha,
            text: TextSource::Snippet {
                category: "rumor".into(),
                same: true,
            },
            outdoor_only: false,
            sound: false,
            popup: false,
            kind: MessageKind::Info,
        };
        apply(&mut fx, &[rumor.clone(), rumor.clone(), rumor]);
        let pinned = fx.beta.get_value("rumor_snippet_id");
        assert!(pinned.is_some());
        let messages: Vec<_> = fx.world.messages().collect();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| *m == messages[0]));
    }

    #[test]
    fn sounds_use_the_target_variable() {
        let mut fx = Fixture::new();
        fx.alpha.vars.set("spot", "(3,4,0)");
        fx.beta.pos = Tripoint::new(9, 9, 0);
        apply(
            &mut fx,
            &[
                Effect::MakeSound {
                    role: Role::Alpha,
                    text: TextSource::Literal("a crash".into()),
                    volume: 40,
                    kind: SoundKind::Combat,
                    target: Some(PositionVar::new(VarScope::Actor(Role::Alpha), "spot")),
                },
                Effect::MakeSound {
                    role: Role::Beta,
                    text: TextSource::Literal("a cough".into()),
                    volume: 5,
                    kind: SoundKind::Speech,
                    target: None,
                },
            ],
        );
        let positions: Vec<_> = fx
            .world
            .events
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Sound(sound) => Some(sound.pos),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![Tripoint::new(3, 4, 0), Tripoint::new(9, 9, 0)]);
    }

    #[test]
    fn location_variable_respects_radius() {
        let mut fx = Fixture::new();
        fx.beta.pos = Tripoint::new(100, 100, 0);
        apply(
            &mut fx,
            &[
                Effect::LocationVariable {
                    role: Role::Beta,
                    var: PositionVar::new(VarScope::Global, "camp"),
                    min_radius: IntExpr::Const(3),
                    max_radius: IntExpr::Const(6),
                    outdoor_only: false,
                },
                Effect::LocationVariable {
                    role: Role::Beta,
                    var: PositionVar::new(VarScope::Actor(Role::Beta), "here"),
                    min_radius: IntExpr::Const(0),
                    max_radius: IntExpr::Const(0),
                    outdoor_only: false,
                },
            ],
        );
        let camp: Tripoint = fx.world.globals().get("camp").unwrap().parse().unwrap();
        let distance = camp.distance(Tripoint::new(100, 100, 0));
        assert!((3..=6).contains(&distance), "distance {distance}");
        assert_eq!(fx.beta.get_value("here").as_deref(), Some("(100,100,0)"));
    }

    #[test]
    fn lightning_needs_open_sky() {
        let mut fx = Fixture::new();
        fx.alpha.pos = Tripoint::new(0, 0, -1);
        apply(&mut fx, &[Effect::Lightning, Effect::NextWeather]);
        assert_eq!(fx.world.events, vec![WorldEvent::NextWeather]);
    }

    #[test]
    fn sound_effects_default_to_full_volume() {
        let mut fx = Fixture::new();
        apply(
            &mut fx,
            &[Effect::SoundEffect {
                id: "thunder".into(),
                variant: "near".into(),
                volume: None,
                outdoor_event: true,
            }],
        );
        assert_eq!(
            fx.world.events,
            vec![WorldEvent::SoundEffect("thunder".into(), "near".into(), 80)]
        );
    }

    #[test]
    fn missions_are_assigned_and_finished_by_type() {
        let mut fx = Fixture::new();
        apply(&mut fx, &[Effect::AssignMission("MISSION_FETCH".into())]);
        let assigned = fx.beta.assigned_missions();
        assert_eq!(assigned.len(), 1);
        assert!(fx.beta.missions[0].is_assigned_to(fx.alpha.id));

        apply(
            &mut fx,
            &[Effect::FinishMission {
                mission_type: "MISSION_FETCH".into(),
                outcome: MissionOutcome::Step(2),
            }],
        );
        assert_eq!(fx.beta.missions[0].step, 2);
        apply(
            &mut fx,
            &[Effect::FinishMission {
                mission_type: "MISSION_FETCH".into(),
                outcome: MissionOutcome::Success,
            }],
        );
        assert_eq!(fx.beta.missions[0].status, MissionStatus::Succeeded);
    }

    #[test]
    fn mission_opinion_uses_the_value_from_before_the_effects() {
        let mut fx = Fixture::new();
        fx.beta.missions.push(Mission::new(MissionId(3), "Clear the mall", 10_000));
        fx.beta.selected_mission = Some(MissionId(3));
        let outcome = TalkEffect::to_topic("TALK_DONE")
            .with_effect(Effect::Named(NamedAction::ClearMission))
            .with_mission_opinion(Opinion::new(2, 0, 0, 0));
        outcome.apply(&mut fx.dialogue()).unwrap();
        assert_eq!(fx.beta.selected_mission, None);
        assert_eq!(fx.beta.opinion.trust, 5);
    }

    #[test]
    fn finishing_ignores_other_players_missions() {
        let mut fx = Fixture::new();
        let mut mission = Mission::new(MissionId(9), "Find a cat", 100);
        mission.type_id = "MISSION_CAT".into();
        mission.status = MissionStatus::InProgress;
        mission.assigned_to = Some(fx.beta.id);
        fx.beta.missions.push(mission);
        apply(
            &mut fx,
            &[Effect::FinishMission {
                mission_type: "MISSION_CAT".into(),
                outcome: MissionOutcome::Failure,
            }],
        );
        assert_eq!(fx.beta.missions[0].status, MissionStatus::InProgress);
    }

    #[test]
    fn rules_goals_and_spells() {
        let mut fx = Fixture::new();
        apply(
            &mut fx,
            &[
                Effect::Rule(RuleChange::Toggle("use_guns".into())),
                Effect::SetGoal("evac_center".into()),
                Effect::CastSpell {
                    role: Role::Alpha,
                    spell: "light".into(),
                },
            ],
        );
        assert!(fx.beta.rules.contains("use_guns"));
        assert_eq!(fx.beta.goal.as_deref(), Some("evac_center"));
        assert_eq!(fx.alpha.spells_cast, vec!["light".to_string()]);
    }

    #[test]
    fn light_level_lasts_one_turn_past_its_length() {
        let mut fx = Fixture::new();
        fx.world.set_now(TimePoint::from_turn(10));
        apply(
            &mut fx,
            &[Effect::LightLevel {
                level: IntExpr::Const(3),
                length_min: DurationExpr::Fixed(TimeDuration::from_turns(5)),
                length_max: DurationExpr::Fixed(TimeDuration::from_turns(5)),
            }],
        );
        assert_eq!(
            fx.world.events,
            vec![WorldEvent::Light(3, TimePoint::from_turn(16))]
        );
    }

    #[test]
    fn gifts_set_the_reason() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        Effect::GiveItem { to_use: true }.apply(&mut d).unwrap();
        assert_eq!(d.take_reason(), "Thanks, I'll put it to use.");
    }
}
