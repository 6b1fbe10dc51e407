//! Lines and responses for topics the engine knows without any document.

use pv_core::talker::Training;
use pv_core::{MissionId, Role};

use crate::dialogue::Dialogue;
use crate::response::TalkResponse;
use crate::topic::{TALK_DONE, TALK_NONE};

/// Topics whose line comes from the selected mission.
pub const MISSION_TOPICS: &[&str] = &[
    "TALK_MISSION_DESCRIBE",
    "TALK_MISSION_DESCRIBE_URGENT",
    "TALK_MISSION_OFFER",
    "TALK_MISSION_ACCEPTED",
    "TALK_MISSION_REJECTED",
    "TALK_MISSION_ADVICE",
    "TALK_MISSION_INQUIRE",
    "TALK_MISSION_SUCCESS",
    "TALK_MISSION_SUCCESS_LIE",
    "TALK_MISSION_FAILURE",
];

const FOLLOW_UP_SUFFIXES: [&str; 3] = [
    "  And I have more I'd like you to do.",
    "  I could use a hand with something else if you are interested.",
    "  If you are interested, I have another job for you.",
];

/// The built-in line for a topic, or an empty string if there is none.
///
/// Some topics act on the speakers: `TALK_SHOUT` makes the alpha speaker
/// shout and `TALK_MIND_CONTROL` enslaves the beta speaker.
pub fn built_in_line(d: &mut Dialogue<'_>, topic: &str) -> String {
    if MISSION_TOPICS.contains(&topic) {
        return mission_line(d, topic);
    }
    match topic {
        "TALK_DEAF" => "&You are deaf and can't talk.".to_string(),
        "TALK_DEAF_ANGRY" => format!(
            "&You are deaf and can't talk.  When you don't respond, {} becomes angry!",
            d.actor(Role::Beta).disp_name()
        ),
        "TALK_MUTE" => "&You are mute and can't talk.".to_string(),
        "TALK_MUTE_ANGRY" => format!(
            "&You are mute and can't talk.  When you don't respond, {} becomes angry!",
            d.actor(Role::Beta).disp_name()
        ),
        TALK_NONE | TALK_DONE => d.actor(Role::Beta).bye_line(),
        "TALK_TRAIN" => {
            if d.actor(Role::Alpha).interrupted_training().is_some() {
                "Shall we resume?".to_string()
            } else if d.actor(Role::Beta).training_offers().is_empty() {
                "Sorry, but it doesn't seem I have anything to teach you.".to_string()
            } else {
                "Here's what I can teach you...".to_string()
            }
        }
        "TALK_TRAIN_NPC" => {
            if d.actor(Role::Alpha).training_offers().is_empty() {
                "Sorry, there's nothing I can learn from you.".to_string()
            } else {
                "Sure, I'm all ears.".to_string()
            }
        }
        "TALK_TRAIN_SEMINAR" => "What do you want me to teach?".to_string(),
        "TALK_HOW_MUCH_FURTHER" => d.actor(Role::Beta).distance_to_goal(),
        "TALK_DESCRIBE_MISSION" => d.actor(Role::Beta).job_description(),
        "TALK_SHOUT" => {
            let alpha = d.actor_mut(Role::Alpha);
            alpha.shout();
            if alpha.is_deaf() {
                "&You yell, but can't hear yourself.".to_string()
            } else if alpha.is_mute() {
                "&You yell, but can't form words.".to_string()
            } else {
                "&You yell.".to_string()
            }
        }
        "TALK_SIZE_UP" => d.actor(Role::Beta).evaluation(),
        "TALK_LOOK_AT" => format!("&{}", d.actor(Role::Beta).short_description()),
        "TALK_OPINION" => format!("&{}", d.actor(Role::Beta).opinion_text()),
        "TALK_MIND_CONTROL" => {
            if d.actor_mut(Role::Beta).enslave_mind() {
                "YES, MASTER!".to_string()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

fn mission_line(d: &Dialogue<'_>, topic: &str) -> String {
    let beta = d.actor(Role::Beta);
    let Some(mission) = beta.selected_mission().and_then(|id| beta.mission(id)) else {
        tracing::warn!(topic, npc = %beta.disp_name(), "mission topic without a selected mission");
        return "BUG: no mission selected".to_string();
    };
    let mut line = mission.dialogue_for_topic(topic).unwrap_or_default().to_string();
    if topic == "TALK_MISSION_SUCCESS" && mission.has_follow_up() {
        if let Some(i) = d.random_index(FOLLOW_UP_SUFFIXES.len()) {
            line.push_str(FOLLOW_UP_SUFFIXES[i]);
        }
    }
    line
}

fn mission_name(d: &Dialogue<'_>, id: MissionId) -> String {
    d.actor(Role::Beta)
        .mission(id)
        .map_or_else(|| id.to_string(), |m| m.name)
}

fn push(d: &mut Dialogue<'_>, response: TalkResponse) {
    d.responses.push(response);
}

fn push_training(d: &mut Dialogue<'_>, offers: Vec<Training>, start: &str) {
    if offers.is_empty() {
        push(d, TalkResponse::new("Oh, okay.", TALK_NONE));
        return;
    }
    for training in offers {
        push(
            d,
            TalkResponse::new(training.offer_text(), start).with_training(training),
        );
    }
    push(d, TalkResponse::new("Eh, never mind.", TALK_NONE));
}

/// Append the built-in responses for a topic.
pub fn built_in_responses(d: &mut Dialogue<'_>, topic: &str) {
    match topic {
        "TALK_MISSION_LIST" => {
            let missions = d.actor(Role::Beta).available_missions();
            if let [only] = missions.as_slice() {
                d.responses.insert(
                    0,
                    TalkResponse::new("Tell me about it.", "TALK_MISSION_OFFER").with_mission(*only),
                );
            } else {
                for id in missions {
                    let name = mission_name(d, id);
                    d.responses.insert(
                        0,
                        TalkResponse::new(name, "TALK_MISSION_OFFER").with_mission(id),
                    );
                }
            }
        }
        "TALK_MISSION_LIST_ASSIGNED" => {
            let missions = d.missions_assigned.clone();
            if let [only] = missions.as_slice() {
                push(
                    d,
                    TalkResponse::new("I have news.", "TALK_MISSION_INQUIRE").with_mission(*only),
                );
            } else {
                for id in missions {
                    let name = mission_name(d, id);
                    push(d, TalkResponse::new(name, "TALK_MISSION_INQUIRE").with_mission(id));
                }
            }
        }
        "TALK_TRAIN" => {
            if let Some(training) = d.actor(Role::Alpha).interrupted_training() {
                let text = format!("Yes, let's resume training {}", training.id);
                push(
                    d,
                    TalkResponse::new(text, "TALK_TRAIN_START").with_training(training),
                );
            }
            let offers = d.actor(Role::Beta).training_offers();
            push_training(d, offers, "TALK_TRAIN_START");
        }
        "TALK_TRAIN_NPC" => {
            let offers = d.actor(Role::Alpha).training_offers();
            push_training(d, offers, "TALK_TRAIN_NPC_START");
        }
        "TALK_TRAIN_SEMINAR" => {
            let offers = d.actor(Role::Beta).training_offers();
            push_training(d, offers, "TALK_TRAIN_SEMINAR_START");
        }
        "TALK_HOW_MUCH_FURTHER" => {
            push(d, TalkResponse::new("Okay, thanks.", TALK_NONE));
            push(d, TalkResponse::new("Let's keep moving.", TALK_DONE));
        }
        _ => {}
    }
}

/// Responses added to every topic after the others.
///
/// A mind-controlling alpha speaker may always give orders, and a topic
/// without responses always gets a way out.
pub fn closing_responses(d: &mut Dialogue<'_>) {
    let mind_control = d.actor(Role::Alpha).has_trait(&d.config().mind_control_trait)
        && d.has_actor(Role::Beta)
        && !d.actor(Role::Beta).is_ally();
    if mind_control {
        push(d, TalkResponse::new("OBEY ME!", "TALK_MIND_CONTROL"));
        push(d, TalkResponse::new("Bye.", TALK_DONE));
    }
    if d.responses.is_empty() {
        push(d, TalkResponse::new("Bye.", TALK_DONE));
    }
}

#[cfg(test)]
mod tests {
    use pv_core::talker::TrainingKind;
    use pv_core::{Mission, MissionStatus};

    use super::*;
    use crate::test_support::Fixture;

    fn texts(d: &Dialogue<'_>) -> Vec<String> {
        d.responses().iter().map(|r| r.text(d).unwrap()).collect()
    }

    #[test]
    fn training_lists_every_offer() {
        let mut fx = Fixture::new();
        fx.beta.trainings = vec![
            Training::new(TrainingKind::Skill, "firstaid", 200),
            Training::new(TrainingKind::Style, "karate", 0),
        ];
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_TRAIN"), "Here's what I can teach you...");
        built_in_responses(&mut d, "TALK_TRAIN");
        assert_eq!(
            texts(&d),
            vec![
                "firstaid (skill): 200".to_string(),
                "karate (style)".to_string(),
                "Eh, never mind.".to_string(),
            ]
        );
        assert_eq!(
            d.responses()[1].training.as_ref().map(|t| t.id.as_str()),
            Some("karate")
        );
    }

    #[test]
    fn nothing_to_teach() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        assert_eq!(
            built_in_line(&mut d, "TALK_TRAIN"),
            "Sorry, but it doesn't seem I have anything to teach you."
        );
        built_in_responses(&mut d, "TALK_TRAIN");
        assert_eq!(texts(&d), vec!["Oh, okay.".to_string()]);
    }

    #[test]
    fn interrupted_training_can_resume() {
        let mut fx = Fixture::new();
        fx.alpha.backlog = vec!["ACT_TRAIN".into()];
        fx.alpha.chosen_training = Some(Training::new(TrainingKind::Skill, "archery", 0));
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_TRAIN"), "Shall we resume?");
        built_in_responses(&mut d, "TALK_TRAIN");
        assert_eq!(texts(&d)[0], "Yes, let's resume training archery");
    }

    #[test]
    fn single_mission_is_offered_by_description() {
        let mut fx = Fixture::new();
        fx.beta.missions = vec![Mission::new(MissionId(7), "Find the book", 100)];
        let mut d = fx.dialogue();
        built_in_responses(&mut d, "TALK_MISSION_LIST");
        let offer = &d.responses()[0];
        assert_eq!(offer.text(&d).unwrap(), "Tell me about it.");
        assert_eq!(offer.mission, Some(MissionId(7)));
        assert_eq!(offer.success.next_topic.id, "TALK_MISSION_OFFER");
    }

    #[test]
    fn several_missions_are_offered_by_name() {
        let mut fx = Fixture::new();
        fx.beta.missions = vec![
            Mission::new(MissionId(1), "Find the book", 100),
            Mission::new(MissionId(2), "Kill the rat", 50),
        ];
        let mut d = fx.dialogue();
        built_in_responses(&mut d, "TALK_MISSION_LIST");
        assert_eq!(
            texts(&d),
            vec!["Kill the rat".to_string(), "Find the book".to_string()]
        );
    }

    #[test]
    fn mission_success_mentions_the_follow_up() {
        let mut fx = Fixture::new();
        let mut mission = Mission::new(MissionId(3), "Find the book", 100)
            .with_dialogue("TALK_MISSION_SUCCESS", "Thank you!")
            .with_follow_up("MISSION_RETURN_BOOK");
        mission.status = MissionStatus::InProgress;
        fx.beta.missions = vec![mission];
        fx.beta.selected_mission = Some(MissionId(3));
        let mut d = fx.dialogue();
        let line = built_in_line(&mut d, "TALK_MISSION_SUCCESS");
        assert!(line.starts_with("Thank you!  "));
        assert!(FOLLOW_UP_SUFFIXES.iter().any(|s| line.ends_with(s)));
        assert_eq!(built_in_line(&mut d, "TALK_MISSION_ADVICE"), "");
    }

    #[test]
    fn mission_topic_without_selection_says_so() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_MISSION_OFFER"), "BUG: no mission selected");
    }

    #[test]
    fn shouting_depends_on_hearing_and_voice() {
        let mut fx = Fixture::new();
        fx.alpha.mute = true;
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_SHOUT"), "&You yell, but can't form words.");
        drop(d);
        fx.alpha.deaf = true;
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_SHOUT"), "&You yell, but can't hear yourself.");
    }

    #[test]
    fn appearance_topics_are_narrated() {
        let mut fx = Fixture::new();
        fx.beta.opinion.trust = 3;
        let mut d = fx.dialogue();
        assert_eq!(built_in_line(&mut d, "TALK_LOOK_AT"), "&You see Bree.");
        assert_eq!(
            built_in_line(&mut d, "TALK_OPINION"),
            "&Trust: 3  Fear: 0  Value: 0  Anger: 0"
        );
        assert_eq!(built_in_line(&mut d, "TALK_DONE"), "Bye.");
    }

    #[test]
    fn mind_control_adds_orders() {
        let mut fx = Fixture::new();
        fx.alpha.traits.insert("DEBUG_MIND_CONTROL".into());
        let mut d = fx.dialogue();
        closing_responses(&mut d);
        assert_eq!(texts(&d), vec!["OBEY ME!".to_string(), "Bye.".to_string()]);
        assert_eq!(built_in_line(&mut d, "TALK_MIND_CONTROL"), "YES, MASTER!");
        drop(d);
        assert!(fx.beta.ally);
    }

    #[test]
    fn empty_topics_get_a_goodbye() {
        let mut fx = Fixture::new();
        let mut d = fx.dialogue();
        closing_responses(&mut d);
        assert_eq!(texts(&d), vec!["Bye.".to_string()]);
        assert!(d.responses()[0].success.next_topic.is_done());
    }
}
