//! Responses the human side can pick.

use pv_core::talker::Training;
use pv_core::{Consequence, MissionId, Role};

use crate::condition::Condition;
use crate::dialogue::Dialogue;
use crate::effect::TalkEffect;
use crate::error::DialogueResult;
use crate::topic::TalkTopic;
use crate::trial::TalkTrial;

/// Response text, optionally switched by a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrueFalseText {
    /// Condition picking the text.
    pub condition: Condition,
    /// Text when the condition holds.
    pub true_text: String,
    /// Text when it does not.
    pub false_text: String,
}

impl TrueFalseText {
    /// Text that never switches.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            condition: Condition::Always,
            true_text: text.into(),
            false_text: String::new(),
        }
    }

    /// Text switched by `condition`.
    pub fn switched(
        condition: Condition,
        true_text: impl Into<String>,
        false_text: impl Into<String>,
    ) -> Self {
        Self {
            condition,
            true_text: true_text.into(),
            false_text: false_text.into(),
        }
    }

    /// The text for the current state.
    pub fn pick(&self, d: &Dialogue<'_>) -> DialogueResult<&str> {
        if self.condition.evaluate(d)? {
            Ok(&self.true_text)
        } else {
            Ok(&self.false_text)
        }
    }
}

/// A response with its trial and both outcome pipelines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TalkResponse {
    /// What the human side says.
    pub text: TrueFalseText,
    /// Gate on success.
    pub trial: TalkTrial,
    /// Pipeline on success.
    pub success: TalkEffect,
    /// Pipeline on failure.
    pub failure: TalkEffect,
    /// Mission selected on the NPC when this response is chosen.
    pub mission: Option<MissionId>,
    /// Training stored on the NPC when this response is chosen.
    pub training: Option<Training>,
}

impl TalkResponse {
    /// A response that always leads to `topic`.
    pub fn new(text: impl Into<String>, topic: impl Into<TalkTopic>) -> Self {
        Self {
            text: TrueFalseText::plain(text),
            success: TalkEffect::to_topic(topic),
            ..Self::default()
        }
    }

    /// Replace the text.
    pub fn with_text(mut self, text: TrueFalseText) -> Self {
        self.text = text;
        self
    }

    /// Gate on a trial.
    pub fn with_trial(mut self, trial: TalkTrial) -> Self {
        self.trial = trial;
        self
    }

    /// Set the success pipeline.
    pub fn with_success(mut self, success: TalkEffect) -> Self {
        self.success = success;
        self
    }

    /// Set the failure pipeline.
    pub fn with_failure(mut self, failure: TalkEffect) -> Self {
        self.failure = failure;
        self
    }

    /// Select a mission when chosen.
    pub fn with_mission(mut self, mission: MissionId) -> Self {
        self.mission = Some(mission);
        self
    }

    /// Store a training when chosen.
    pub fn with_training(mut self, training: Training) -> Self {
        self.training = Some(training);
        self
    }

    /// Point both outcomes at an item.
    pub fn for_item(mut self, item: &str) -> Self {
        self.success.next_topic.item = Some(item.to_string());
        self.failure.next_topic.item = Some(item.to_string());
        self
    }

    /// The response text for the current state.
    pub fn text(&self, d: &Dialogue<'_>) -> DialogueResult<String> {
        self.text.pick(d).map(str::to_string)
    }

    /// `[KIND chance%]` for opposed trials.
    pub fn trial_label(&self, d: &Dialogue<'_>) -> DialogueResult<Option<String>> {
        if !self.trial.kind.is_opposed() {
            return Ok(None);
        }
        let chance = self.trial.calc_chance(d)?;
        Ok(Some(format!("[{} {chance}%]", self.trial.kind)))
    }

    /// The text as offered, with the chance prefixed for opposed trials.
    pub fn option_text(&self, d: &Dialogue<'_>) -> DialogueResult<String> {
        let text = self.text(d)?;
        Ok(match self.trial_label(d)? {
            Some(label) => format!("{label} {text}"),
            None => text,
        })
    }

    /// The worst consequence of choosing this response.
    ///
    /// A certain trial only risks the success pipeline and an impossible
    /// one only the failure pipeline.
    pub fn get_consequence(&self, d: &Dialogue<'_>) -> DialogueResult<Consequence> {
        let chance = self.trial.calc_chance(d)?;
        let consequence = if chance >= 100 {
            self.success.get_consequence(d)
        } else if chance <= 0 {
            self.failure.get_consequence(d)
        } else {
            self.success
                .get_consequence(d)
                .max(self.failure.get_consequence(d))
        };
        Ok(consequence)
    }

    /// Whether this response ends the conversation with no risk and no effects.
    pub fn is_clean_exit(&self, d: &Dialogue<'_>) -> DialogueResult<bool> {
        Ok(self.trial.calc_chance(d)? >= 100
            && self.success.effects.is_empty()
            && self.success.next_topic.is_done())
    }
}

/// A document response with its gate and switch-group flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSpec {
    /// The response offered.
    pub response: TalkResponse,
    /// Gate; `None` means always offered.
    pub condition: Option<Condition>,
    /// Member of the topic's switch group.
    pub switch: bool,
    /// Switch entry that fires only when no earlier entry did.
    pub default: bool,
}

impl ResponseSpec {
    /// An ungated response.
    pub fn new(response: TalkResponse) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    /// Gate on a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Join the switch group.
    pub fn in_switch(mut self) -> Self {
        self.switch = true;
        self
    }

    /// Join the switch group as a default.
    pub fn as_default(mut self) -> Self {
        self.switch = true;
        self.default = true;
        self
    }

    fn offered(&self, d: &Dialogue<'_>, switch_done: bool) -> DialogueResult<bool> {
        if self.switch && switch_done {
            return Ok(false);
        }
        match &self.condition {
            Some(condition) => condition.evaluate(d),
            None => Ok(true),
        }
    }

    fn closes_switch(&self) -> bool {
        self.switch && !self.default
    }

    /// Append the response if offered. Returns whether it closed the switch group.
    pub fn generate(&self, d: &mut Dialogue<'_>, switch_done: bool) -> DialogueResult<bool> {
        if !self.offered(d, switch_done)? {
            return Ok(false);
        }
        d.responses.push(self.response.clone());
        Ok(self.closes_switch())
    }

    /// Insert an item-bound copy at the front if offered.
    pub fn generate_for_item(
        &self,
        d: &mut Dialogue<'_>,
        item: &str,
        switch_done: bool,
    ) -> DialogueResult<bool> {
        if !self.offered(d, switch_done)? {
            return Ok(false);
        }
        d.responses.insert(0, self.response.clone().for_item(item));
        Ok(self.closes_switch())
    }
}

/// What a repeat response is instantiated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatCriteria {
    /// Item type ids held by the speaker.
    Items(Vec<String>),
    /// Item categories held by the speaker.
    Categories(Vec<String>),
}

/// A response instantiated once per matching item of one speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatResponse {
    /// Whose inventory is searched.
    pub role: Role,
    /// Match containers by the category of their contents.
    pub include_containers: bool,
    /// What to look for.
    pub criteria: RepeatCriteria,
    /// The response template.
    pub response: ResponseSpec,
}

impl RepeatResponse {
    /// A repeat response over the alpha speaker's inventory.
    pub fn new(criteria: RepeatCriteria, response: ResponseSpec) -> Self {
        Self {
            role: Role::Alpha,
            include_containers: false,
            criteria,
            response,
        }
    }

    /// Search the other speaker's inventory.
    pub fn on(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Item ids to instantiate the response for, in order.
    pub fn matching_items(&self, d: &Dialogue<'_>) -> Vec<String> {
        let holder = d.actor(self.role);
        match &self.criteria {
            RepeatCriteria::Items(items) => items
                .iter()
                .filter(|id| holder.charges_of(id) > 0 || holder.has_amount(id, 1))
                .cloned()
                .collect(),
            RepeatCriteria::Categories(categories) => categories
                .iter()
                .flat_map(|c| holder.items_in_category(c, self.include_containers))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pv_core::{Item, NamedAction, Opinion};

    use super::*;
    use crate::effect::Effect;
    use crate::test_support::Fixture;
    use crate::topic::{TopicDef, TALK_DONE};
    use crate::trial::TrialKind;

    fn offered(fx: &mut Fixture, topic: &TopicDef) -> Vec<String> {
        let mut d = fx.dialogue();
        topic.gen_responses(&mut d).unwrap();
        d.responses()
            .iter()
            .map(|r| r.text(&d).unwrap())
            .collect()
    }

    fn switch_topic(first: Condition) -> TopicDef {
        TopicDef::new("TALK_BREE")
            .with_response(
                ResponseSpec::new(TalkResponse::new("first", TALK_DONE))
                    .with_condition(first)
                    .in_switch(),
            )
            .with_response(
                ResponseSpec::new(TalkResponse::new("second", TALK_DONE))
                    .with_condition(Condition::Always)
                    .in_switch(),
            )
            .with_response(ResponseSpec::new(TalkResponse::new("fallback", TALK_DONE)).as_default())
    }

    #[test]
    fn first_switch_entry_suppresses_the_rest() {
        let mut fx = Fixture::new();
        assert_eq!(offered(&mut fx, &switch_topic(Condition::Always)), vec!["first"]);
    }

    #[test]
    fn default_fires_when_no_entry_did() {
        let mut fx = Fixture::new();
        let topic = TopicDef::new("TALK_BREE")
            .with_response(
                ResponseSpec::new(TalkResponse::new("first", TALK_DONE))
                    .with_condition(Condition::Never)
                    .in_switch(),
            )
            .with_response(ResponseSpec::new(TalkResponse::new("fallback", TALK_DONE)).as_default());
        assert_eq!(offered(&mut fx, &topic), vec!["fallback"]);
    }

    #[test]
    fn later_switch_entry_fires_when_first_fails() {
        let mut fx = Fixture::new();
        assert_eq!(offered(&mut fx, &switch_topic(Condition::Never)), vec!["second"]);
    }

    #[test]
    fn repeat_responses_go_first() {
        let mut fx = Fixture::new();
        fx.alpha.inventory.push(Item::new("apple"));
        fx.alpha.inventory.push(Item::new("pear"));
        let topic = TopicDef::new("TALK_BREE")
            .with_response(ResponseSpec::new(TalkResponse::new("Bye.", TALK_DONE)))
            .with_repeat(RepeatResponse::new(
                RepeatCriteria::Items(vec!["apple".into(), "pear".into(), "plum".into()]),
                ResponseSpec::new(TalkResponse::new("Sell <topic_item>", "TALK_SELL")),
            ));
        let mut d = fx.dialogue();
        topic.gen_responses(&mut d).unwrap();
        let items: Vec<_> = d
            .responses()
            .iter()
            .map(|r| r.success.next_topic.item.clone())
            .collect();
        assert_eq!(
            items,
            vec![Some("pear".to_string()), Some("apple".to_string()), None]
        );
    }

    #[test]
    fn switched_text_follows_its_condition() {
        let mut fx = Fixture::new();
        let response = TalkResponse::new("", TALK_DONE)
            .with_text(TrueFalseText::switched(Condition::Never, "yes", "no"));
        let d = fx.dialogue();
        assert_eq!(response.text(&d).unwrap(), "no");
    }

    #[test]
    fn opposed_trials_show_their_chance() {
        let mut fx = Fixture::new();
        let response = TalkResponse::new("Trust me.", "TALK_OK")
            .with_trial(TalkTrial::new(TrialKind::Persuade, 30))
            .with_failure(TalkEffect::to_topic("TALK_NO"));
        let d = fx.dialogue();
        insta::assert_snapshot!(response.option_text(&d).unwrap(), @"[PERSUADE 30%] Trust me.");
    }

    #[test]
    fn consequence_follows_the_possible_outcomes() {
        let mut fx = Fixture::new();
        let attack = TalkEffect::default().with_effect(Effect::Named(NamedAction::Hostile));
        let certain = TalkResponse::new("Fight!", TALK_DONE)
            .with_success(TalkEffect::to_topic(TALK_DONE))
            .with_failure(attack.clone());
        let risky = certain
            .clone()
            .with_trial(TalkTrial::new(TrialKind::Intimidate, 50));
        let hopeless = certain
            .clone()
            .with_trial(TalkTrial::new(TrialKind::Intimidate, -20));
        let d = fx.dialogue();
        assert_eq!(certain.get_consequence(&d), Ok(Consequence::None));
        assert_eq!(risky.get_consequence(&d), Ok(Consequence::Hostile));
        assert_eq!(hopeless.get_consequence(&d), Ok(Consequence::Hostile));
    }

    #[test]
    fn anger_that_crosses_the_threshold_is_hostile() {
        let mut fx = Fixture::new();
        fx.beta.anger_threshold = 10;
        fx.beta.opinion.anger = 8;
        let insult = TalkResponse::new("You smell.", TALK_DONE)
            .with_success(TalkEffect::to_topic(TALK_DONE).with_opinion(Opinion::new(0, 0, 0, 3)));
        let d = fx.dialogue();
        assert_eq!(insult.get_consequence(&d), Ok(Consequence::Hostile));
    }

    #[test]
    fn clean_exits_have_no_effects() {
        let mut fx = Fixture::new();
        let bye = TalkResponse::new("Bye.", TALK_DONE);
        let wave = TalkResponse::new("Bye!", TALK_DONE)
            .with_success(TalkEffect::to_topic(TALK_DONE).with_effect(Effect::NextWeather));
        let d = fx.dialogue();
        assert_eq!(bye.is_clean_exit(&d), Ok(true));
        assert_eq!(wave.is_clean_exit(&d), Ok(false));
    }
}
