//! Running effects-on-condition from inside a pipeline.

use pv_core::world::QueuedEffect;
use pv_core::{Role, TimeDuration};

use super::NearbyNpcs;
use crate::dialogue::Dialogue;
use crate::eoc::EffectOnCondition;
use crate::error::{DialogueError, DialogueResult};
use crate::expr::{DurationExpr, IntExpr};

/// A uniformly drawn duration in `min..=max`.
pub(super) fn random_duration(d: &Dialogue<'_>, min: TimeDuration, max: TimeDuration) -> TimeDuration {
    TimeDuration::from_turns(d.random_range(min.turns(), max.turns()))
}

fn lookup<'r>(
    registry: &'r crate::registry::TopicRegistry,
    ids: &[String],
) -> DialogueResult<Vec<&'r EffectOnCondition>> {
    ids.iter()
        .map(|id| {
            registry
                .eoc(id)
                .ok_or_else(|| DialogueError::UnknownEoc(id.clone()))
        })
        .collect()
}

fn activate_all(eocs: &[&EffectOnCondition], d: &mut Dialogue<'_>) -> DialogueResult<()> {
    for eoc in eocs {
        eoc.activate(d)?;
    }
    Ok(())
}

/// Queue effects-on-condition for later, or run them now.
///
/// With a positive maximum delay the effects are handed to the world's
/// scheduler. Otherwise they run immediately, either on the current speakers
/// or once per nearby NPC taken from a snapshot made before the first run.
pub(super) fn queue_eocs(
    d: &mut Dialogue<'_>,
    role: Role,
    ids: &[String],
    delay_min: &DurationExpr,
    delay_max: &DurationExpr,
    nearby: Option<&NearbyNpcs>,
) -> DialogueResult<()> {
    let registry = d.shared_registry();
    let eocs = lookup(&registry, ids)?;

    let max = delay_max.evaluate(d)?;
    if max.turns() > 0 {
        let min = delay_min.evaluate(d)?;
        let at = d.world().now() + random_duration(d, min, max);
        let alpha = d
            .has_actor(Role::Alpha)
            .then(|| d.actor(Role::Alpha).id());
        for eoc in &eocs {
            tracing::debug!(eoc = %eoc.id, turn = at.turn(), "queued effect_on_condition");
            d.world_mut().queue_effect(QueuedEffect {
                eoc: eoc.id.clone(),
                at,
                alpha,
                beta: None,
            });
        }
        return Ok(());
    }

    let Some(filter) = nearby else {
        let mut same = d.nested();
        return activate_all(&eocs, &mut same);
    };

    let center = d.actor(role).pos();
    let snapshot = d
        .world()
        .npcs_near(center, filter.range.unwrap_or(i32::MAX));
    for id in snapshot {
        let Some(npc) = d.world_mut().detach_npc(id) else {
            continue;
        };
        if !filter.admits(npc.as_ref()) {
            d.world_mut().attach_npc(npc);
            continue;
        }
        let mut solo = d.nested_owned(npc);
        let outcome = activate_all(&eocs, &mut solo);
        if let Some(npc) = solo.release() {
            d.world_mut().attach_npc(npc);
        }
        outcome?;
    }
    Ok(())
}

/// Pick one effect-on-condition by weight and run it on the human side alone.
pub(super) fn run_weighted(d: &mut Dialogue<'_>, choices: &[(String, IntExpr)]) -> DialogueResult<()> {
    let registry = d.shared_registry();
    let mut weighted = Vec::with_capacity(choices.len());
    for (id, weight) in choices {
        weighted.push((id, weight.evaluate(d)?.max(0)));
    }
    let total = weighted.iter().fold(0i64, |sum, (_, w)| sum.saturating_add(*w));
    if total == 0 {
        return Ok(());
    }
    let mut draw = d.random_range(1, total);
    let mut chosen = None;
    for (id, weight) in weighted {
        if draw <= weight {
            chosen = Some(id);
            break;
        }
        draw -= weight;
    }
    let Some(id) = chosen else {
        return Ok(());
    };
    let eoc = registry
        .eoc(id)
        .ok_or_else(|| DialogueError::UnknownEoc(id.clone()))?;
    let mut solo = d.nested_alpha();
    eoc.activate(&mut solo)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pv_core::sandbox::Character;
    use pv_core::{GameWorld, Talker, TimePoint, Tripoint};

    use super::*;
    use crate::condition::Condition;
    use crate::effect::Effect;
    use crate::registry::TopicRegistry;
    use crate::test_support::Fixture;

    fn set_met() -> Effect {
        Effect::AddVar {
            role: Role::Alpha,
            name: "npctalk_var_met".into(),
            values: vec!["yes".into()],
            stamp_time: false,
        }
    }

    fn registry() -> TopicRegistry {
        let mut registry = TopicRegistry::new();
        registry.insert_eoc(EffectOnCondition::new("meet", vec![set_met()]));
        registry.insert_eoc(
            EffectOnCondition::new("never", vec![set_met()]).with_condition(Condition::Never),
        );
        registry
    }

    #[test]
    fn delayed_effects_go_to_the_scheduler() {
        let mut fx = Fixture::with_registry(registry());
        fx.world.set_now(TimePoint::from_turn(100));
        let mut d = fx.dialogue();
        let delay = DurationExpr::Fixed(TimeDuration::from_minutes(5));
        queue_eocs(&mut d, Role::Beta, &["meet".to_string()], &delay, &delay, None).unwrap();
        drop(d);
        let queued: Vec<_> = fx.world.queued().collect();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].at, TimePoint::from_turn(400));
        assert_eq!(queued[0].alpha, Some(fx.alpha.id));
        assert_eq!(fx.alpha.get_value("npctalk_var_met"), None);
    }

    #[test]
    fn immediate_effects_run_on_the_same_speakers() {
        let mut fx = Fixture::with_registry(registry());
        let mut d = fx.dialogue();
        let now = DurationExpr::default();
        queue_eocs(&mut d, Role::Beta, &["meet".to_string(), "never".to_string()], &now, &now, None).unwrap();
        drop(d);
        assert_eq!(fx.alpha.get_value("npctalk_var_met").as_deref(), Some("yes"));
    }

    #[test]
    fn nearby_npcs_each_run_as_alpha() {
        let mut fx = Fixture::with_registry(registry());
        let mut near = Character::npc("Cato", "TALK_CATO");
        near.pos = Tripoint::new(2, 0, 0);
        let near_id = near.id;
        let mut far = Character::npc("Dara", "TALK_DARA");
        far.pos = Tripoint::new(40, 0, 0);
        let far_id = far.id;
        fx.world.add_npc(Box::new(near), None);
        fx.world.add_npc(Box::new(far), None);

        let mut d = fx.dialogue();
        let now = DurationExpr::default();
        let nearby = NearbyNpcs {
            names: Vec::new(),
            range: Some(10),
        };
        queue_eocs(&mut d, Role::Alpha, &["meet".to_string()], &now, &now, Some(&nearby)).unwrap();
        drop(d);

        let met = |id| {
            fx.world
                .npc(id)
                .and_then(|npc| npc.get_value("npctalk_var_met"))
        };
        assert_eq!(met(near_id).as_deref(), Some("yes"));
        assert_eq!(met(far_id), None);
        assert_eq!(fx.alpha.get_value("npctalk_var_met"), None);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut fx = Fixture::with_registry(registry());
        let mut d = fx.dialogue();
        let now = DurationExpr::default();
        let result = queue_eocs(&mut d, Role::Beta, &["missing".to_string()], &now, &now, None);
        assert_eq!(result, Err(DialogueError::UnknownEoc("missing".into())));
    }

    #[test]
    fn weighted_list_skips_zero_weights() {
        let mut fx = Fixture::with_registry(registry());
        let mut d = fx.dialogue();
        let choices = vec![
            ("never".to_string(), IntExpr::Const(0)),
            ("meet".to_string(), IntExpr::Const(3)),
        ];
        run_weighted(&mut d, &choices).unwrap();
        drop(d);
        assert_eq!(fx.alpha.get_value("npctalk_var_met").as_deref(), Some("yes"));
    }

    #[test]
    fn huge_weights_saturate() {
        let mut fx = Fixture::with_registry(registry());
        let mut d = fx.dialogue();
        let choices = vec![
            ("meet".to_string(), IntExpr::Const(i64::MAX)),
            ("never".to_string(), IntExpr::Const(i64::MAX)),
        ];
        run_weighted(&mut d, &choices).unwrap();
        drop(d);
        assert_eq!(fx.alpha.get_value("npctalk_var_met").as_deref(), Some("yes"));
    }
}
