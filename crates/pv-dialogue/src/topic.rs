//! Topics: the line an NPC says and the responses offered after it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use pv_core::vars::TALK_VAR_PREFIX;
use pv_core::Role;

use crate::condition::Condition;
use crate::dialogue::Dialogue;
use crate::effect::TalkEffect;
use crate::error::DialogueResult;
use crate::response::{RepeatResponse, ResponseSpec};

/// Pops the topic stack.
pub const TALK_NONE: &str = "TALK_NONE";
/// Ends the conversation.
pub const TALK_DONE: &str = "TALK_DONE";

/// A topic on the stack, optionally about an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkTopic {
    /// Topic id.
    pub id: String,
    /// Item the topic is about.
    pub item: Option<String>,
}

impl TalkTopic {
    /// A topic without an item.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item: None,
        }
    }

    /// Attach an item.
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Whether this is the pop sentinel.
    pub fn is_none(&self) -> bool {
        self.id == TALK_NONE
    }

    /// Whether this is the end sentinel.
    pub fn is_done(&self) -> bool {
        self.id == TALK_DONE
    }
}

impl Default for TalkTopic {
    fn default() -> Self {
        Self::new(TALK_NONE)
    }
}

impl From<&str> for TalkTopic {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TalkTopic {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TalkTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item {
            Some(item) => write!(f, "{} ({item})", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// The text an NPC says on entering a topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DynamicLine {
    /// No line; the built-in line for the topic is used.
    #[default]
    Empty,
    /// Fixed text.
    Text(String),
    /// One entry picked at random.
    OneOf(Vec<DynamicLine>),
    /// Every entry, concatenated.
    Concat(Vec<DynamicLine>),
    /// The session reason, which is cleared.
    UseReason,
    /// Text chosen by the grammatical gender of some speakers.
    ///
    /// The variants are keyed by the gender keys of `subjects` joined with
    /// `:`; a missing key falls back to `line`.
    Gendered {
        /// Fallback text.
        line: String,
        /// Speakers whose gender matters, in key order.
        subjects: Vec<Role>,
        /// Variant text by joined gender key.
        variants: BTreeMap<String, String>,
    },
    /// One of two lines depending on a condition.
    Conditional {
        /// Condition deciding the branch.
        condition: Condition,
        /// Line when it holds.
        yes: Box<DynamicLine>,
        /// Line when it does not.
        no: Box<DynamicLine>,
    },
}

impl DynamicLine {
    /// Fixed text.
    pub fn text(text: impl Into<String>) -> Self {
        DynamicLine::Text(text.into())
    }

    /// A conditional line.
    pub fn conditional(condition: Condition, yes: DynamicLine, no: DynamicLine) -> Self {
        DynamicLine::Conditional {
            condition,
            yes: Box::new(yes),
            no: Box::new(no),
        }
    }

    /// Produce the line for the current state.
    pub fn evaluate(&self, d: &mut Dialogue<'_>) -> DialogueResult<String> {
        match self {
            DynamicLine::Empty => Ok(String::new()),
            DynamicLine::Text(text) => Ok(text.clone()),
            DynamicLine::OneOf(lines) => match d.random_index(lines.len()) {
                Some(i) => lines[i].evaluate(d),
                None => Ok(String::new()),
            },
            DynamicLine::Concat(lines) => {
                let mut all = String::new();
                for line in lines {
                    all.push_str(&line.evaluate(d)?);
                }
                Ok(all)
            }
            DynamicLine::UseReason => Ok(d.take_reason()),
            DynamicLine::Gendered {
                line,
                subjects,
                variants,
            } => {
                let key = subjects
                    .iter()
                    .map(|role| d.actor(*role).gender().key())
                    .collect::<Vec<_>>()
                    .join(":");
                Ok(variants.get(&key).unwrap_or(line).clone())
            }
            DynamicLine::Conditional { condition, yes, no } => {
                if condition.evaluate(d)? {
                    yes.evaluate(d)
                } else {
                    no.evaluate(d)
                }
            }
        }
    }
}

/// An effect fired on entering a topic, before any response is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerEffect {
    /// Gate.
    pub condition: Condition,
    /// Effects to run.
    pub effect: TalkEffect,
    /// Variable on the alpha speaker that marks this effect as fired.
    pub sentinel: Option<String>,
}

impl SpeakerEffect {
    /// An ungated, repeatable speaker effect.
    pub fn new(effect: TalkEffect) -> Self {
        Self {
            condition: Condition::Always,
            effect,
            sentinel: None,
        }
    }

    /// Gate on a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Fire at most once per alpha speaker for this topic and sentinel.
    pub fn with_sentinel(mut self, topic: &str, sentinel: &str) -> Self {
        self.sentinel = Some(sentinel_var(topic, sentinel));
        self
    }

    /// Whether the effect should fire now.
    pub fn is_ready(&self, d: &Dialogue<'_>) -> DialogueResult<bool> {
        if let Some(var) = &self.sentinel {
            if d.actor(Role::Alpha).get_value(var).as_deref() == Some("yes") {
                return Ok(false);
            }
        }
        self.condition.evaluate(d)
    }

    /// Run the effect and set the sentinel.
    pub fn fire(&self, d: &mut Dialogue<'_>) -> DialogueResult<()> {
        self.effect.apply(d)?;
        if let Some(var) = &self.sentinel {
            d.actor_mut(Role::Alpha).set_value(var, "yes");
        }
        Ok(())
    }
}

/// The variable name guarding a sentinel speaker effect.
pub fn sentinel_var(topic: &str, sentinel: &str) -> String {
    format!("{TALK_VAR_PREFIX}sentinel_{topic}_{sentinel}")
}

/// A topic loaded from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicDef {
    /// Topic id.
    pub id: String,
    /// The NPC's line.
    pub line: DynamicLine,
    /// Responses in document order.
    pub responses: Vec<ResponseSpec>,
    /// Responses instantiated once per matching item.
    pub repeat_responses: Vec<RepeatResponse>,
    /// Effects fired on entry.
    pub speaker_effects: Vec<SpeakerEffect>,
    /// Whether built-in responses for this id are suppressed.
    pub replace_built_in_responses: bool,
}

impl TopicDef {
    /// An empty topic.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the line.
    pub fn with_line(mut self, line: DynamicLine) -> Self {
        self.line = line;
        self
    }

    /// Add a response.
    pub fn with_response(mut self, response: ResponseSpec) -> Self {
        self.responses.push(response);
        self
    }

    /// Add a repeat response.
    pub fn with_repeat(mut self, repeat: RepeatResponse) -> Self {
        self.repeat_responses.push(repeat);
        self
    }

    /// Add a speaker effect.
    pub fn with_speaker_effect(mut self, effect: SpeakerEffect) -> Self {
        self.speaker_effects.push(effect);
        self
    }

    /// Suppress built-in responses.
    pub fn replacing_built_ins(mut self) -> Self {
        self.replace_built_in_responses = true;
        self
    }

    /// Fold a later definition of the same id into this one.
    ///
    /// A non-empty line replaces the old one; responses and effects append.
    pub fn merge(&mut self, later: TopicDef) {
        if later.line != DynamicLine::Empty {
            self.line = later.line;
        }
        self.responses.extend(later.responses);
        self.repeat_responses.extend(later.repeat_responses);
        self.speaker_effects.extend(later.speaker_effects);
        self.replace_built_in_responses |= later.replace_built_in_responses;
    }

    /// Append this topic's responses to the session's list.
    ///
    /// Returns whether built-in responses should be skipped.
    pub fn gen_responses(&self, d: &mut Dialogue<'_>) -> DialogueResult<bool> {
        let mut switch_done = false;
        for spec in &self.responses {
            switch_done |= spec.generate(d, switch_done)?;
        }
        for repeat in &self.repeat_responses {
            for item in repeat.matching_items(d) {
                switch_done |= repeat.response.generate_for_item(d, &item, switch_done)?;
            }
        }
        Ok(self.replace_built_in_responses)
    }

    /// Topic ids reachable in one step.
    ///
    /// With `only_unconditional`, responses behind a condition are ignored.
    pub fn reachable_topics(&self, only_unconditional: bool) -> BTreeSet<String> {
        self.responses
            .iter()
            .chain(self.repeat_responses.iter().map(|r| &r.response))
            .filter(|spec| !only_unconditional || spec.condition.is_none())
            .flat_map(|spec| {
                [
                    spec.response.success.next_topic.id.clone(),
                    spec.response.failure.next_topic.id.clone(),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pv_core::{Gender, Talker};

    use super::*;
    use crate::effect::Effect;
    use crate::response::TalkResponse;
    use crate::test_support::Fixture;

    fn set(name: &str) -> Effect {
        Effect::AddVar {
            role: Role::Alpha,
            name: name.into(),
            values: vec!["1".to_string()],
            stamp_time: false,
        }
    }

    #[test]
    fn conditional_lines_pick_a_branch() {
        let mut fx = Fixture::new();
        fx.beta.gender = Gender::Female;
        let line = DynamicLine::conditional(
            Condition::IsGender {
                role: Role::Beta,
                gender: Gender::Female,
            },
            DynamicLine::text("ma'am"),
            DynamicLine::text("sir"),
        );
        let mut d = fx.dialogue();
        assert_eq!(line.evaluate(&mut d).unwrap(), "ma'am");
    }

    #[test]
    fn concatenation_and_reason() {
        let mut fx = Fixture::new();
        let line = DynamicLine::Concat(vec![DynamicLine::text("Because "), DynamicLine::UseReason]);
        let mut d = fx.dialogue();
        d.reason = "I said so.".into();
        assert_eq!(line.evaluate(&mut d).unwrap(), "Because I said so.");
        assert!(d.reason().is_empty());
    }

    #[test]
    fn gendered_lines_use_joined_keys() {
        let mut fx = Fixture::new();
        fx.alpha.gender = Gender::Male;
        fx.beta.gender = Gender::Female;
        let line = DynamicLine::Gendered {
            line: "Hello.".into(),
            subjects: vec![Role::Alpha, Role::Beta],
            variants: BTreeMap::from([("male:female".to_string(), "Hello, mister.".to_string())]),
        };
        let mut d = fx.dialogue();
        assert_eq!(line.evaluate(&mut d).unwrap(), "Hello, mister.");
        drop(d);
        fx.beta.gender = Gender::Male;
        let mut d = fx.dialogue();
        assert_eq!(line.evaluate(&mut d).unwrap(), "Hello.");
    }

    #[test]
    fn sentinels_fire_once_per_value() {
        let mut fx = Fixture::new();
        let first = SpeakerEffect::new(TalkEffect::default().with_effect(set("greeted")))
            .with_sentinel("TALK_BREE", "intro");
        {
            let mut d = fx.dialogue();
            assert_eq!(first.is_ready(&d), Ok(true));
            first.fire(&mut d).unwrap();
            assert_eq!(first.is_ready(&d), Ok(false));
        }
        assert_eq!(
            fx.alpha.get_value("npctalk_var_sentinel_TALK_BREE_intro").as_deref(),
            Some("yes")
        );

        let second = SpeakerEffect::new(TalkEffect::default().with_effect(set("again")))
            .with_sentinel("TALK_BREE", "intro_2");
        let d = fx.dialogue();
        assert_eq!(second.is_ready(&d), Ok(true));
    }

    #[test]
    fn merging_appends_responses() {
        let mut base = TopicDef::new("TALK_BREE")
            .with_line(DynamicLine::text("Hi."))
            .with_response(ResponseSpec::new(TalkResponse::new("Bye.", TALK_DONE)));
        base.merge(
            TopicDef::new("TALK_BREE")
                .with_response(ResponseSpec::new(TalkResponse::new("Trade?", "TALK_TRADE"))),
        );
        assert_eq!(base.line, DynamicLine::text("Hi."));
        assert_eq!(base.responses.len(), 2);
        assert!(!base.replace_built_in_responses);
    }

    #[test]
    fn reachability_can_skip_conditional_responses() {
        let topic = TopicDef::new("TALK_BREE")
            .with_response(ResponseSpec::new(TalkResponse::new("Bye.", TALK_DONE)))
            .with_response(
                ResponseSpec::new(TalkResponse::new("Secret?", "TALK_SECRET"))
                    .with_condition(Condition::IsDay),
            );
        let all = topic.reachable_topics(false);
        assert!(all.contains("TALK_SECRET"));
        assert!(all.contains(TALK_DONE));
        let plain = topic.reachable_topics(true);
        assert!(!plain.contains("TALK_SECRET"));
    }
}
