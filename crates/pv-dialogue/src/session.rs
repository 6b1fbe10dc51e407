//! The conversation loop: show a line, offer responses, follow the choice.

use pv_core::{Consequence, Role, Talker};

use crate::builtin;
use crate::dialogue::Dialogue;
use crate::error::{DialogueError, DialogueResult};
use crate::tags::parse_tags;
use crate::topic::TalkTopic;

/// How an offered response is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineColor {
    /// Ordinary talk.
    White,
    /// Choosing this may start a fight.
    Red,
    /// An action, or choosing this leaves you helpless.
    LightRed,
    /// Something done rather than said.
    Green,
}

/// One response as offered to the human side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionLine {
    /// Rendered text, with tags substituted.
    pub text: String,
    /// How to draw it.
    pub color: LineColor,
}

/// Topics the human side can jump to from any choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTalk {
    /// Look at the other speaker.
    LookAt,
    /// Size up their stats.
    SizeUp,
    /// Check their opinion of you.
    CheckOpinion,
    /// Yell.
    Yell,
}

impl SpecialTalk {
    /// Parse a key binding name such as `LOOK_AT`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "LOOK_AT" => Some(SpecialTalk::LookAt),
            "SIZE_UP_STATS" => Some(SpecialTalk::SizeUp),
            "CHECK_OPINION" => Some(SpecialTalk::CheckOpinion),
            "YELL" => Some(SpecialTalk::Yell),
            _ => None,
        }
    }

    /// The topic this jumps to.
    pub fn topic(self) -> &'static str {
        match self {
            SpecialTalk::LookAt => "TALK_LOOK_AT",
            SpecialTalk::SizeUp => "TALK_SIZE_UP",
            SpecialTalk::CheckOpinion => "TALK_OPINION",
            SpecialTalk::Yell => "TALK_SHOUT",
        }
    }
}

/// What the human side picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// A response by index.
    Index(usize),
    /// Leave the conversation the safest way.
    Quit,
    /// Jump to a special topic.
    Special(SpecialTalk),
}

/// The front end a conversation talks through.
pub trait DialogueUi {
    /// Show a line. `speaker` is empty for narration.
    fn show_line(&mut self, speaker: &str, text: &str);

    /// Show the response the human side just gave.
    fn show_response(&mut self, text: &str);

    /// Ask for a choice among the offered responses.
    fn choose(&mut self, options: &[OptionLine]) -> Choice;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Show a notice that is not part of the conversation.
    fn notice(&mut self, text: &str);
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pick an opening topic for a stranger from their personality and opinion.
///
/// May change the NPC's attitude: muggers start mugging, and strangers with
/// no strong feelings forget any earlier attitude.
pub fn pick_talk_topic(npc: &mut dyn Talker) -> &'static str {
    let p = npc.personality();
    let o = npc.opinion();
    if p.aggression > 0 {
        if o.fear * 2 < p.bravery && p.altruism < 0 {
            npc.set_attitude("mug");
            return "TALK_MUG";
        }
        if p.aggression + p.bravery - o.fear > 0 {
            return "TALK_STRANGER_AGGRESSIVE";
        }
    }
    if o.fear * 2 > p.altruism + p.bravery {
        return "TALK_STRANGER_SCARED";
    }
    if o.fear * 2 > p.bravery + o.trust {
        return "TALK_STRANGER_WARY";
    }
    if o.trust - o.fear > (p.bravery + p.altruism) / 2 {
        return "TALK_STRANGER_FRIENDLY";
    }
    npc.set_attitude("null");
    "TALK_STRANGER_NEUTRAL"
}

impl Dialogue<'_> {
    /// Hold the conversation until it ends.
    ///
    /// A runtime error ends the conversation early. It is logged and
    /// returned after the usual end-of-conversation handling.
    pub fn talk(&mut self, ui: &mut dyn DialogueUi) -> DialogueResult<()> {
        if !self.has_actor(Role::Beta) || !self.has_actor(Role::Alpha) {
            tracing::warn!("a conversation needs both speakers");
            return Ok(());
        }
        let result = self.talk_loop(ui);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "conversation aborted");
            ui.notice("The conversation breaks off.");
        }
        self.settle_activity(ui);
        result
    }

    fn talk_loop(&mut self, ui: &mut dyn DialogueUi) -> DialogueResult<()> {
        let by_radio = self.by_radio;
        let topics = self.actor(Role::Beta).topics(by_radio);
        for topic in topics {
            self.add_topic(topic);
        }
        self.check_senses();
        self.recompute_missions();

        while let Some(topic) = self.current_topic().cloned() {
            let next = self.opt(ui, &topic)?;
            if next.is_none() {
                self.pop_category();
            } else if next.is_done() {
                break;
            } else {
                self.topic_stack.push(next);
            }
        }
        self.say_goodbye(ui);
        Ok(())
    }

    fn check_senses(&mut self) {
        let provoked = self
            .current_topic()
            .is_some_and(|t| t.id == "TALK_MUG" || t.id == "TALK_STRANGER_AGGRESSIVE");
        let alpha = self.actor(Role::Alpha);
        let (deaf, mute) = (alpha.is_deaf(), alpha.is_mute());
        for (impaired, calm, angry) in [
            (deaf, "TALK_DEAF", "TALK_DEAF_ANGRY"),
            (mute, "TALK_MUTE", "TALK_MUTE_ANGRY"),
        ] {
            if !impaired {
                continue;
            }
            if provoked {
                self.actor_mut(Role::Beta).make_angry();
                self.add_topic(angry);
            } else {
                self.add_topic(calm);
            }
        }
    }

    fn pop_category(&mut self) {
        let Some(popped) = self.topic_stack.pop() else {
            return;
        };
        let registry = self.shared_registry();
        let categories = registry.categories();
        let Some(category) = categories.category(&popped.id) else {
            return;
        };
        let mut removed = 1;
        while self
            .topic_stack
            .last()
            .is_some_and(|top| categories.category(&top.id) == Some(category))
        {
            self.topic_stack.pop();
            removed += 1;
        }
        tracing::debug!(category, removed, "popped topic category");
    }

    fn say_goodbye(&mut self, ui: &mut dyn DialogueUi) {
        let beta = self.actor(Role::Beta);
        if !beta.is_npc() || !beta.is_alive() {
            return;
        }
        let bye = beta.bye_line();
        let (speaker, text) = self.present_line(&bye);
        ui.show_line(&speaker, &text);
        self.actor_mut(Role::Beta).say(&bye);
    }

    fn settle_activity(&mut self, ui: &mut dyn DialogueUi) {
        let Some(activity) = self.actor(Role::Alpha).activity() else {
            return;
        };
        if self.config().keeps_activity(&activity) {
            return;
        }
        if self.actor(Role::Beta).has_effect(&self.config().busy_effect) {
            return;
        }
        let prompt = format!(
            "{} talked to you.  Stop {activity}?",
            self.actor(Role::Beta).disp_name()
        );
        if ui.confirm(&prompt) {
            self.actor_mut(Role::Alpha).cancel_activity();
        }
    }

    /// The NPC's line for a topic, or the built-in line if the document
    /// has none.
    pub fn dynamic_line(&mut self, topic: &str) -> DialogueResult<String> {
        let registry = self.shared_registry();
        if let Some(def) = registry.topic(topic) {
            let line = def.line.evaluate(self)?;
            if !line.is_empty() {
                return Ok(line);
            }
        }
        let line = builtin::built_in_line(self, topic);
        if line.is_empty() && registry.topic(topic).is_none() {
            let err = DialogueError::TopicNotFound(topic.to_string());
            tracing::warn!(error = %err, "no line for topic");
        }
        Ok(line)
    }

    /// Fill the response list for a topic.
    pub fn gen_responses(&mut self, topic: &str) -> DialogueResult<()> {
        self.responses.clear();
        let registry = self.shared_registry();
        let replaced = match registry.topic(topic) {
            Some(def) => def.gen_responses(self)?,
            None => false,
        };
        if !replaced {
            builtin::built_in_responses(self, topic);
        }
        builtin::closing_responses(self);
        Ok(())
    }

    fn fire_speaker_effects(&mut self, topic: &str) -> DialogueResult<()> {
        let registry = self.shared_registry();
        let Some(def) = registry.topic(topic) else {
            return Ok(());
        };
        for effect in &def.speaker_effects {
            if effect.is_ready(self)? {
                effect.fire(self)?;
            }
        }
        Ok(())
    }

    /// (speaker, text) for a line as shown to the human side.
    fn present_line(&self, line: &str) -> (String, String) {
        let line = parse_tags(self, line);
        let name = self.actor(Role::Beta).disp_name();
        if let Some(rest) = line.strip_prefix('&') {
            (String::new(), capitalize(rest))
        } else if let Some(rest) = line.strip_prefix('*') {
            (String::new(), format!("{name} {rest}"))
        } else {
            (name, format!("\"{}\"", capitalize(&line)))
        }
    }

    /// The offered responses, rendered.
    pub fn option_lines(&self) -> DialogueResult<Vec<OptionLine>> {
        self.responses
            .iter()
            .map(|response| -> DialogueResult<OptionLine> {
                let text = parse_tags(self, &response.text(self)?);
                let (text, mut color) = if let Some(rest) = text.strip_prefix('*') {
                    (rest.to_string(), LineColor::LightRed)
                } else if let Some(rest) = text.strip_prefix('&') {
                    (rest.to_string(), LineColor::Green)
                } else {
                    (text, LineColor::White)
                };
                match response.get_consequence(self)? {
                    Consequence::Hostile => color = LineColor::Red,
                    Consequence::Helpless => color = LineColor::LightRed,
                    Consequence::Action => color = LineColor::Green,
                    Consequence::None => {}
                }
                let text = match response.trial_label(self)? {
                    Some(label) => format!("{label} {text}"),
                    None => text,
                };
                Ok(OptionLine { text, color })
            })
            .collect()
    }

    /// The response that leaves safely, if there is one.
    ///
    /// A lone response is always taken. Otherwise the first certain response
    /// that ends the conversation without effects is.
    pub fn best_quit(&self) -> DialogueResult<Option<usize>> {
        if self.responses.len() == 1 {
            return Ok(Some(0));
        }
        for (i, response) in self.responses.iter().enumerate() {
            if response.is_clean_exit(self)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn ask(&mut self, ui: &mut dyn DialogueUi, options: &[OptionLine]) -> DialogueResult<Result<usize, TalkTopic>> {
        loop {
            let index = match ui.choose(options) {
                Choice::Special(special) => return Ok(Err(TalkTopic::new(special.topic()))),
                Choice::Quit => match self.best_quit()? {
                    Some(index) => return Ok(Ok(index)),
                    None => {
                        ui.notice("No good option.");
                        continue;
                    }
                },
                Choice::Index(index) => index,
            };
            let Some(response) = self.responses.get(index) else {
                let err = DialogueError::InvalidResponse {
                    index,
                    len: self.responses.len(),
                };
                tracing::debug!(error = %err, "ignoring choice");
                continue;
            };
            let prompt = match response.get_consequence(self)? {
                Consequence::Hostile => Some("You may be attacked!  Proceed?"),
                Consequence::Helpless => Some("You'll be helpless!  Proceed?"),
                Consequence::Action | Consequence::None => None,
            };
            if prompt.is_none_or(|p| ui.confirm(p)) {
                return Ok(Ok(index));
            }
        }
    }

    /// Run one topic: show its line, offer its responses, and follow the
    /// choice. Returns the next topic.
    pub fn opt(&mut self, ui: &mut dyn DialogueUi, topic: &TalkTopic) -> DialogueResult<TalkTopic> {
        tracing::debug!(topic = %topic, "entering topic");
        self.cur_item = topic.item.clone();
        let line = self.dynamic_line(&topic.id)?;
        self.fire_speaker_effects(&topic.id)?;
        self.gen_responses(&topic.id)?;

        if !line.is_empty() {
            let (speaker, text) = self.present_line(&line);
            ui.show_line(&speaker, &text);
        }
        let options = self.option_lines()?;
        let index = match self.ask(ui, &options)? {
            Ok(index) => index,
            Err(special) => return Ok(special),
        };

        let chosen = self.responses[index].clone();
        let said = parse_tags(self, &chosen.text(self)?);
        ui.show_response(said.trim_start_matches(['&', '*']));
        if let Some(mission) = chosen.mission {
            self.actor_mut(Role::Beta).select_mission(Some(mission));
        }
        if let Some(training) = &chosen.training {
            self.actor_mut(Role::Beta)
                .store_chosen_training(Some(training.clone()));
        }
        let success = chosen.trial.roll(self)?;
        tracing::debug!(success, trial = %chosen.trial.kind, "trial rolled");
        let outcome = if success {
            &chosen.success
        } else {
            &chosen.failure
        };
        outcome.apply(self)
    }
}
