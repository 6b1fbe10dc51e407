//! Topics: dynamic lines, responses, trials, repeat responses and speaker
//! effects.

use std::collections::BTreeMap;

use serde_json::Value;

use pv_core::Role;
use pv_core::talker::{Training, TrainingKind};
use pv_dialogue::{
    DynamicLine, RepeatCriteria, RepeatResponse, ResponseSpec, SpeakerEffect, TalkEffect,
    TalkResponse, TalkTopic, TalkTrial, TopicDef, TrialKind, TrueFalseText,
};

use super::condition::{OBJECT_CONDITIONS, SIMPLE_CONDITIONS, condition, object_condition, simple};
use super::effect::effect_block;
use crate::locate::KeyPath;
use crate::reader::{Cx, Obj, array, one_or_many, strings};

const TRAINING_TAGS: &[(&str, TrainingKind)] = &[
    ("skill", TrainingKind::Skill),
    ("style", TrainingKind::Style),
    ("spell", TrainingKind::Spell),
    ("proficiency", TrainingKind::Proficiency),
];

/// A compiled topic body, shared by every id the document lists.
pub(crate) struct TopicBody {
    line: DynamicLine,
    responses: Vec<ResponseSpec>,
    repeats: Vec<RepeatResponse>,
    speaker_effects: Vec<(SpeakerEffect, Option<String>)>,
    replace_built_ins: bool,
}

impl TopicBody {
    /// The definition for one topic id.
    pub fn instantiate(&self, id: &str) -> TopicDef {
        let mut def = TopicDef::new(id).with_line(self.line.clone());
        for response in &self.responses {
            def = def.with_response(response.clone());
        }
        for repeat in &self.repeats {
            def = def.with_repeat(repeat.clone());
        }
        for (effect, sentinel) in &self.speaker_effects {
            let effect = match sentinel {
                Some(sentinel) => effect.clone().with_sentinel(id, sentinel),
                None => effect.clone(),
            };
            def = def.with_speaker_effect(effect);
        }
        if self.replace_built_ins {
            def = def.replacing_built_ins();
        }
        def
    }
}

/// Compile everything in a topic object except its id.
pub(crate) fn topic_body(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TopicBody> {
    let line = match obj.get("dynamic_line") {
        Some(value) => dynamic_line(cx, value, &obj.at("dynamic_line")),
        None => Some(DynamicLine::Empty),
    };
    let responses = match obj.get("responses") {
        Some(value) => responses(cx, value, &obj.at("responses")),
        None => {
            obj.missing(cx, "responses");
            None
        }
    };
    let repeats = collect(cx, obj, "repeat_responses", repeat_response);
    let speaker_effects = collect(cx, obj, "speaker_effect", speaker_effect);
    let replace_built_ins = obj.bool(cx, "replace_built_in_responses", false);
    Some(TopicBody {
        line: line?,
        responses: responses?,
        repeats: repeats?,
        speaker_effects: speaker_effects?,
        replace_built_ins,
    })
}

/// Compile each object in `obj[key]`, which may be one object or an array.
fn collect<T>(
    cx: &mut Cx<'_>,
    obj: &Obj<'_>,
    key: &str,
    compile: fn(&mut Cx<'_>, &Obj<'_>) -> Option<T>,
) -> Option<Vec<T>> {
    let Some(value) = obj.get(key) else {
        return Some(Vec::new());
    };
    let mut out = Some(Vec::new());
    for (entry, at) in one_or_many(value, &obj.at(key)) {
        let compiled = Obj::new(cx, entry, at).and_then(|entry| compile(cx, &entry));
        match (out.as_mut(), compiled) {
            (Some(list), Some(item)) => list.push(item),
            _ => out = None,
        }
    }
    out
}

fn responses(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Vec<ResponseSpec>> {
    let entries = array(cx, value, path)?;
    if entries.is_empty() {
        cx.error(path, "a topic needs at least one response");
        return None;
    }
    let mut out = Some(Vec::new());
    for (entry, at) in entries {
        let compiled = Obj::new(cx, entry, at).and_then(|obj| response_spec(cx, &obj));
        match (out.as_mut(), compiled) {
            (Some(list), Some(spec)) => list.push(spec),
            _ => out = None,
        }
    }
    out
}

/// A response with its `condition`, `switch` and `default` flags.
fn response_spec(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<ResponseSpec> {
    let response = response(cx, obj);
    let gate = obj
        .get("condition")
        .map(|value| condition(cx, value, &obj.at("condition")));
    let switch = obj.bool(cx, "switch", false);
    let default = obj.bool(cx, "default", false);

    let mut spec = ResponseSpec::new(response?);
    if let Some(gate) = gate {
        spec = spec.with_condition(gate?);
    }
    if switch {
        spec = spec.in_switch();
    }
    if default {
        spec = spec.as_default();
    }
    Some(spec)
}

fn response(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TalkResponse> {
    let text = response_text(cx, obj);
    let trial = match obj.object(cx, "trial") {
        Some(trial_obj) => trial(cx, &trial_obj),
        None if obj.has("trial") => None,
        None => Some(TalkTrial::default()),
    };

    let success = if let Some(success) = obj.object(cx, "success") {
        outcome(cx, &success)
    } else {
        match obj.get("topic") {
            Some(Value::String(topic)) => effect_block(cx, obj, "effect").map(|mut block| {
                block.next_topic = TalkTopic::new(topic.as_str());
                block
            }),
            Some(_) => next_topic(cx, obj).map(TalkEffect::to_topic),
            None => Some(TalkEffect::default()),
        }
    };

    let has_trial = trial.as_ref().is_some_and(|t| t.kind != TrialKind::None);
    let failure = match obj.object(cx, "failure") {
        Some(failure) => outcome(cx, &failure),
        None if obj.has("failure") => None,
        None if has_trial => {
            cx.error(&obj.path, "a response with a `trial` needs a `failure`");
            None
        }
        None => Some(TalkEffect::default()),
    };

    let training = training(cx, obj);

    let mut response = TalkResponse::default()
        .with_text(text?)
        .with_trial(trial?)
        .with_success(success?)
        .with_failure(failure?);
    if let Some(training) = training {
        response = response.with_training(training);
    }
    Some(response)
}

fn response_text(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TrueFalseText> {
    let Some(switched) = obj.object(cx, "truefalsetext") else {
        return obj.req_str(cx, "text").map(TrueFalseText::plain);
    };
    let gate = match switched.get("condition") {
        Some(value) => condition(cx, value, &switched.at("condition")),
        None => {
            switched.missing(cx, "condition");
            None
        }
    };
    let yes = switched.req_str(cx, "true");
    let no = switched.req_str(cx, "false");
    Some(TrueFalseText::switched(gate?, yes?, no?))
}

/// A success or failure block: effects, opinions and the next topic.
fn outcome(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TalkEffect> {
    let block = effect_block(cx, obj, "effect");
    let topic = if obj.has("topic") {
        next_topic(cx, obj)
    } else {
        Some(TalkTopic::default())
    };
    let mut block = block?;
    block.next_topic = topic?;
    Some(block)
}

/// The `topic` of an object: an id, or an inline topic registered on the side.
fn next_topic(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TalkTopic> {
    let value = obj.get("topic")?;
    let path = obj.at("topic");
    match value {
        Value::String(id) => Some(TalkTopic::new(id.as_str())),
        Value::Object(_) => {
            let inline = Obj::new(cx, value, path)?;
            let id = inline.req_str(cx, "id");
            let body = topic_body(cx, &inline);
            let id = id?;
            cx.inline_topics.push(body?.instantiate(id));
            Some(TalkTopic::new(id))
        }
        _ => {
            cx.error(&path, "`topic` must be a topic id or a topic object");
            None
        }
    }
}

fn trial(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<TalkTrial> {
    let name = obj.str_or(cx, "type", "NONE");
    let Some(kind) = TrialKind::from_name(&name) else {
        cx.unknown(&obj.at("type"), "trial type", &name, TrialKind::names());
        return None;
    };
    let mut trial = match kind {
        TrialKind::None => TalkTrial::default(),
        TrialKind::Condition => match obj.get("condition") {
            Some(value) => TalkTrial::conditional(condition(cx, value, &obj.at("condition"))?),
            None => {
                obj.missing(cx, "condition");
                return None;
            }
        },
        kind => {
            if !obj.has("difficulty") {
                obj.missing(cx, "difficulty");
                return None;
            }
            TalkTrial::new(kind, obj.small_int(cx, "difficulty")?)
        }
    };
    if let Some(mods) = obj.get("mod") {
        for (pair, at) in array(cx, mods, &obj.at("mod"))? {
            match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(attribute), weight]) => {
                    match weight.as_i64().and_then(|w| i32::try_from(w).ok()) {
                        Some(weight) => trial = trial.with_mod(attribute.as_str(), weight),
                        None => cx.error(&at.index(1), "expected a whole-number weight"),
                    }
                }
                _ => cx.error(&at, "expected `[attribute, weight]`"),
            }
        }
    }
    Some(trial)
}

fn training(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<Training> {
    TRAINING_TAGS
        .iter()
        .find_map(|(key, kind)| obj.str(cx, key).map(|id| Training::new(*kind, id, 0)))
}

fn repeat_response(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<RepeatResponse> {
    let role = Role::from_is_npc(obj.bool(cx, "is_npc", false));
    let include_containers = obj.bool(cx, "include_containers", false);
    let criteria = if obj.has("for_item") {
        Some(RepeatCriteria::Items(obj.strings(cx, "for_item")))
    } else if obj.has("for_category") {
        Some(RepeatCriteria::Categories(obj.strings(cx, "for_category")))
    } else {
        cx.error(&obj.path, "no repeat information: expected `for_item` or `for_category`");
        None
    };
    let criteria = criteria.filter(|criteria| {
        let (RepeatCriteria::Items(list) | RepeatCriteria::Categories(list)) = criteria;
        if list.is_empty() {
            cx.error(&obj.path, "empty repeat information");
        }
        !list.is_empty()
    });
    let response = match obj.object(cx, "response") {
        Some(inner) => response_spec(cx, &inner),
        None => {
            if !obj.has("response") {
                obj.missing(cx, "response");
            }
            None
        }
    };
    let mut repeat = RepeatResponse::new(criteria?, response?).on(role);
    repeat.include_containers = include_containers;
    Some(repeat)
}

fn speaker_effect(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<(SpeakerEffect, Option<String>)> {
    let effect = effect_block(cx, obj, "effect");
    let gate = obj
        .get("condition")
        .map(|value| condition(cx, value, &obj.at("condition")));
    let sentinel = obj.str(cx, "sentinel").map(str::to_string);
    let mut speaker = SpeakerEffect::new(effect?);
    if let Some(gate) = gate {
        speaker = speaker.with_condition(gate?);
    }
    Some((speaker, sentinel))
}

/// A dynamic line in any of its forms.
pub(crate) fn dynamic_line(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<DynamicLine> {
    match value {
        Value::String(text) if text.is_empty() => Some(DynamicLine::Empty),
        Value::String(text) => Some(DynamicLine::text(text.as_str())),
        Value::Array(_) => lines(cx, value, path).map(DynamicLine::OneOf),
        Value::Object(_) => {
            let obj = Obj::new(cx, value, path.clone())?;
            line_object(cx, &obj)
        }
        _ => {
            cx.error(path, "expected a string, an array or an object");
            None
        }
    }
}

fn lines(cx: &mut Cx<'_>, value: &Value, path: &KeyPath) -> Option<Vec<DynamicLine>> {
    let mut out = Some(Vec::new());
    for (entry, at) in array(cx, value, path)? {
        match (out.as_mut(), dynamic_line(cx, entry, &at)) {
            (Some(list), Some(line)) => list.push(line),
            _ => out = None,
        }
    }
    out
}

fn line_object(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<DynamicLine> {
    if let Some(parts) = obj.get("and") {
        return lines(cx, parts, &obj.at("and")).map(DynamicLine::Concat);
    }
    if obj.bool(cx, "use_reason", false) {
        return Some(DynamicLine::UseReason);
    }
    if obj.has("gendered_line") {
        return gendered(cx, obj);
    }

    let yes = branch(cx, obj, "yes");
    let no = branch(cx, obj, "no");
    for name in SIMPLE_CONDITIONS {
        let Some(value) = obj.get(name) else {
            continue;
        };
        let gate = simple(name)?;
        return match value {
            Value::Bool(true) => Some(DynamicLine::conditional(gate, yes?, no?)),
            Value::Bool(false) => {
                cx.error(&obj.at(name), "value must be true");
                None
            }
            line => {
                let line = dynamic_line(cx, line, &obj.at(name));
                Some(DynamicLine::conditional(gate, line?, no?))
            }
        };
    }
    if obj.first_of(OBJECT_CONDITIONS).is_some() {
        let gate = object_condition(cx, obj);
        return Some(DynamicLine::conditional(gate?, yes?, no?));
    }
    cx.error(&obj.path, "dynamic line not supported");
    None
}

fn branch(cx: &mut Cx<'_>, obj: &Obj<'_>, key: &str) -> Option<DynamicLine> {
    match obj.get(key) {
        Some(value) => dynamic_line(cx, value, &obj.at(key)),
        None => Some(DynamicLine::Empty),
    }
}

fn gendered(cx: &mut Cx<'_>, obj: &Obj<'_>) -> Option<DynamicLine> {
    let subjects = match obj.get("relevant_genders") {
        Some(value) => {
            let path = obj.at("relevant_genders");
            let mut roles = Some(Vec::new());
            for (i, subject) in strings(cx, value, &path).iter().enumerate() {
                match (roles.as_mut(), Role::from_prefix(subject)) {
                    (Some(list), Some(role)) => list.push(role),
                    (_, None) => {
                        cx.error(&path.index(i), "expected `u` or `npc`");
                        roles = None;
                    }
                    (None, Some(_)) => {}
                }
            }
            roles
        }
        None => {
            cx.error(&obj.path, "a `gendered_line` needs `relevant_genders`");
            None
        }
    };

    let path = obj.at("gendered_line");
    let forms = match obj.get("gendered_line") {
        Some(Value::String(line)) => Some((line.clone(), BTreeMap::new())),
        Some(Value::Object(variants)) => {
            let mut line = String::new();
            let mut keyed = BTreeMap::new();
            let mut ok = true;
            for (key, text) in variants {
                let Some(text) = text.as_str() else {
                    cx.error(&path.key(key), "expected a string");
                    ok = false;
                    continue;
                };
                if key == "default" {
                    line = text.to_string();
                } else {
                    keyed.insert(key.clone(), text.to_string());
                }
            }
            ok.then_some((line, keyed))
        }
        _ => {
            cx.error(&path, "`gendered_line` must be a string or an object");
            None
        }
    };

    let (line, variants) = forms?;
    Some(DynamicLine::Gendered {
        line,
        subjects: subjects?,
        variants,
    })
}
