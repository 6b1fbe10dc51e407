//! Effects-on-condition: named effect lists that other effects can trigger.

use crate::condition::Condition;
use crate::dialogue::Dialogue;
use crate::effect::{run_effects, Effect};
use crate::error::DialogueResult;

/// A named, condition-gated effect list.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectOnCondition {
    /// Document id.
    pub id: String,
    /// Gate checked on activation.
    pub condition: Condition,
    /// Effects run when the gate holds.
    pub effect: Vec<Effect>,
    /// Effects run when it does not.
    pub false_effect: Option<Vec<Effect>>,
}

impl EffectOnCondition {
    /// An unconditional effect-on-condition.
    pub fn new(id: impl Into<String>, effect: Vec<Effect>) -> Self {
        Self {
            id: id.into(),
            condition: Condition::Always,
            effect,
            false_effect: None,
        }
    }

    /// Gate the effects on a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Effects to run when the condition fails.
    pub fn with_false_effect(mut self, effects: Vec<Effect>) -> Self {
        self.false_effect = Some(effects);
        self
    }

    /// Check the condition and run the matching branch.
    ///
    /// Returns whether the condition held.
    pub fn activate(&self, d: &mut Dialogue<'_>) -> DialogueResult<bool> {
        let holds = self.condition.evaluate(d)?;
        tracing::debug!(eoc = %self.id, holds, "activating effect_on_condition");
        if holds {
            run_effects(&self.effect, d)?;
        } else if let Some(effects) = &self.false_effect {
            run_effects(effects, d)?;
        }
        Ok(holds)
    }
}

#[cfg(test)]
mod tests {
    use pv_core::{Role, Talker};

    use super::*;
    use crate::test_support::Fixture;

    fn mark(value: &str) -> Effect {
        Effect::AddVar {
            role: Role::Beta,
            name: "mark".into(),
            values: vec![value.to_string()],
            stamp_time: false,
        }
    }

    #[test]
    fn true_branch_runs_when_condition_holds() {
        let mut fx = Fixture::new();
        let eoc = EffectOnCondition::new("e", vec![mark("yes")]).with_false_effect(vec![mark("no")]);
        let mut d = fx.dialogue();
        assert_eq!(eoc.activate(&mut d), Ok(true));
        drop(d);
        assert_eq!(fx.beta.get_value("mark").as_deref(), Some("yes"));
    }

    #[test]
    fn false_branch_runs_otherwise() {
        let mut fx = Fixture::new();
        let eoc = EffectOnCondition::new("e", vec![mark("yes")])
            .with_condition(Condition::Never)
            .with_false_effect(vec![mark("no")]);
        let mut d = fx.dialogue();
        assert_eq!(eoc.activate(&mut d), Ok(false));
        drop(d);
        assert_eq!(fx.beta.get_value("mark").as_deref(), Some("no"));
    }

    #[test]
    fn missing_false_branch_does_nothing() {
        let mut fx = Fixture::new();
        let eoc = EffectOnCondition::new("e", vec![mark("yes")]).with_condition(Condition::Never);
        let mut d = fx.dialogue();
        assert_eq!(eoc.activate(&mut d), Ok(false));
        drop(d);
        assert_eq!(fx.beta.get_value("mark"), None);
    }
}
