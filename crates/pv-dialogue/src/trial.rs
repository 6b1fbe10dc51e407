//! Probabilistic gates on responses.

use std::fmt;

use pv_core::Role;

use crate::condition::Condition;
use crate::dialogue::Dialogue;
use crate::error::DialogueResult;

/// Skill practised by attempting an opposed trial.
pub const SPEECH_SKILL: &str = "speech";

/// What kind of trial gates a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrialKind {
    /// Always succeeds.
    #[default]
    None,
    /// Deception.
    Lie,
    /// Persuasion.
    Persuade,
    /// Intimidation.
    Intimidate,
    /// Succeeds exactly when a condition holds.
    Condition,
}

impl TrialKind {
    /// Look up a kind by its document name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "NONE" => TrialKind::None,
            "LIE" => TrialKind::Lie,
            "PERSUADE" => TrialKind::Persuade,
            "INTIMIDATE" => TrialKind::Intimidate,
            "CONDITION" => TrialKind::Condition,
            _ => return None,
        };
        Some(kind)
    }

    /// Document names of every kind.
    pub fn names() -> [&'static str; 5] {
        ["NONE", "LIE", "PERSUADE", "INTIMIDATE", "CONDITION"]
    }

    /// The key passed to [`pv_core::Talker::trial_chance_mod`] for opposed kinds.
    pub fn chance_mod_key(self) -> Option<&'static str> {
        match self {
            TrialKind::Lie => Some("lie"),
            TrialKind::Persuade => Some("persuade"),
            TrialKind::Intimidate => Some("intimidate"),
            TrialKind::None | TrialKind::Condition => None,
        }
    }

    /// Whether this kind pits the speakers' skills against each other.
    pub fn is_opposed(self) -> bool {
        self.chance_mod_key().is_some()
    }
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrialKind::None => "NONE",
            TrialKind::Lie => "LIE",
            TrialKind::Persuade => "PERSUADE",
            TrialKind::Intimidate => "INTIMIDATE",
            TrialKind::Condition => "CONDITION",
        };
        f.write_str(name)
    }
}

/// One named modifier of a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialMod {
    /// Attribute read from both speakers.
    pub attribute: String,
    /// Weight of the attribute.
    pub weight: i32,
}

impl TrialMod {
    /// Create a modifier.
    pub fn new(attribute: impl Into<String>, weight: i32) -> Self {
        Self {
            attribute: attribute.into(),
            weight,
        }
    }
}

/// A trial attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalkTrial {
    /// Kind of trial.
    pub kind: TrialKind,
    /// Base chance in percent.
    pub difficulty: i32,
    /// Condition for [`TrialKind::Condition`].
    pub condition: Condition,
    /// Named modifiers.
    pub mods: Vec<TrialMod>,
}

impl TalkTrial {
    /// A trial of a kind with a base difficulty.
    pub fn new(kind: TrialKind, difficulty: i32) -> Self {
        Self {
            kind,
            difficulty,
            ..Self::default()
        }
    }

    /// A trial that succeeds when `condition` holds.
    pub fn conditional(condition: Condition) -> Self {
        Self {
            kind: TrialKind::Condition,
            condition,
            ..Self::default()
        }
    }

    /// Add a modifier.
    pub fn with_mod(mut self, attribute: impl Into<String>, weight: i32) -> Self {
        self.mods.push(TrialMod::new(attribute, weight));
        self
    }

    fn mind_controlled(d: &Dialogue<'_>) -> bool {
        d.actor(Role::Alpha).has_trait(&d.config().mind_control_trait)
    }

    /// Chance of success in percent, clamped to `0..=100`.
    ///
    /// Each modifier contributes its weight once plus the weighted attribute
    /// of both speakers.
    pub fn calc_chance(&self, d: &Dialogue<'_>) -> DialogueResult<i32> {
        if Self::mind_controlled(d) {
            return Ok(100);
        }
        let alpha = d.actor(Role::Alpha);
        let beta = d.actor(Role::Beta);
        let mut chance = i64::from(self.difficulty);
        match self.kind {
            TrialKind::None => chance = 100,
            TrialKind::Condition => {
                chance = if self.condition.evaluate(d)? { 100 } else { 0 };
            }
            TrialKind::Lie | TrialKind::Persuade | TrialKind::Intimidate => {
                if let Some(key) = self.kind.chance_mod_key() {
                    chance += i64::from(alpha.trial_chance_mod(key));
                    chance += i64::from(beta.trial_chance_mod(key));
                }
            }
        }
        for m in &self.mods {
            chance += i64::from(m.weight);
            chance += i64::from(alpha.parse_mod(&m.attribute, m.weight));
            chance += i64::from(beta.parse_mod(&m.attribute, m.weight));
        }
        Ok(chance.clamp(0, 100) as i32)
    }

    /// Roll the trial.
    pub fn roll(&self, d: &mut Dialogue<'_>) -> DialogueResult<bool> {
        let draw = d.random_range(0, 99);
        self.roll_with_draw(d, draw)
    }

    /// Resolve the trial against a given draw from `0..=99`.
    ///
    /// Opposed trials teach the alpha speaker a little speech, more on
    /// success than on failure and more for harder trials.
    pub fn roll_with_draw(&self, d: &mut Dialogue<'_>, draw: i64) -> DialogueResult<bool> {
        if self.kind == TrialKind::None || Self::mind_controlled(d) {
            return Ok(true);
        }
        let chance = self.calc_chance(d)?;
        let success = draw < i64::from(chance);
        if self.kind.is_opposed() {
            let practice = if success {
                (100 - chance) / 10
            } else {
                (100 - chance) / 7
            };
            d.actor_mut(Role::Alpha).practice(SPEECH_SKILL, practice);
        }
        tracing::debug!(trial = %self.kind, chance, draw, success, "trial rolled");
        Ok(success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use proptest::prelude::*;

    #[test]
    fn none_always_succeeds() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        let trial = TalkTrial::default().with_mod("ANGER", -500);
        for draw in [0, 50, 99] {
            assert_eq!(trial.roll_with_draw(&mut d, draw), Ok(true));
        }
    }

    #[test]
    fn mind_control_overrides_every_kind() {
        let mut fx = Fixture::new();
        fx.alpha.traits.insert("DEBUG_MIND_CONTROL".into());
        let mut d = fx.dialogue();
        let trial = TalkTrial::new(TrialKind::Intimidate, -40);
        assert_eq!(trial.calc_chance(&d), Ok(100));
        assert_eq!(trial.roll_with_draw(&mut d, 99), Ok(true));
    }

    #[test]
    fn condition_trials_are_all_or_nothing() {
        let mut fx = Fixture::new();
        let d = fx.dialogue();
        assert_eq!(TalkTrial::conditional(Condition::Always).calc_chance(&d), Ok(100));
        assert_eq!(TalkTrial::conditional(Condition::Never).calc_chance(&d), Ok(0));
    }

    #[test]
    fn persuade_with_flat_speech_mod() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        let trial = TalkTrial::new(TrialKind::Persuade, 0).with_mod("speech", 5);
        assert_eq!(trial.calc_chance(&d), Ok(5));
        assert_eq!(trial.roll_with_draw(&mut d, 4), Ok(true));
        assert_eq!(trial.roll_with_draw(&mut d, 5), Ok(false));
    }

    #[test]
    fn opposed_trials_teach_speech() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        let trial = TalkTrial::new(TrialKind::Lie, 30);
        assert_eq!(trial.roll_with_draw(&mut d, 10), Ok(true));
        assert_eq!(trial.roll_with_draw(&mut d, 90), Ok(false));
        drop(d);
        assert_eq!(fx.alpha.practice.get(SPEECH_SKILL), Some(&(7 + 10)));
    }

    #[test]
    fn trial_kind_names() {
        for name in TrialKind::names() {
            let kind = TrialKind::from_name(name).unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert_eq!(TrialKind::from_name("BRIBE"), None);
    }

    proptest! {
        #[test]
        fn chance_is_clamped(difficulty in -10_000i32..10_000, weight in -10_000i32..10_000) {
            let mut fx = Fixture::new();
            let d = fx.dialogue();
            let trial = TalkTrial::new(TrialKind::Intimidate, difficulty).with_mod("TRUST", weight);
            let chance = trial.calc_chance(&d).unwrap();
            prop_assert!((0..=100).contains(&chance));
        }
    }
}
