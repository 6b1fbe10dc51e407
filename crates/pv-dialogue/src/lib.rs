//! Conversation engine for Palaver.
//!
//! Topics, responses, trials, and effect pipelines are plain values built by
//! a compiler (see `pv-dsl`) and evaluated against a live [`Dialogue`]. The
//! engine only talks to speakers through [`pv_core::Talker`] and to the game
//! through [`pv_core::GameWorld`].

/// Lines and responses for topics that need no document.
pub mod builtin;
/// Compiled boolean conditions.
pub mod condition;
/// Session configuration and topic categories.
pub mod config;
/// Live conversation state.
pub mod dialogue;
/// Compiled effects and outcome pipelines.
pub mod effect;
/// Effects-on-condition.
pub mod eoc;
/// Error types used throughout the crate.
pub mod error;
/// Compiled integer, duration, and string expressions.
pub mod expr;
/// The topic registry and its load/unload lifecycle.
pub mod registry;
/// Responses, switch groups, and repeat responses.
pub mod response;
/// The conversation loop and its UI trait.
pub mod session;
/// Inline text tags.
pub mod tags;
/// Topics and dynamic lines.
pub mod topic;
/// Trials gating a response's success.
pub mod trial;

#[cfg(test)]
mod test_support;

/// Re-export condition types.
pub use condition::Condition;
/// Re-export configuration types.
pub use config::{DialogueConfig, TopicCategories};
/// Re-export the dialogue state.
pub use dialogue::Dialogue;
/// Re-export effect types.
pub use effect::{Effect, TalkEffect};
/// Re-export effects-on-condition.
pub use eoc::EffectOnCondition;
/// Re-export error types.
pub use error::{DialogueError, DialogueResult};
/// Re-export registry types.
pub use registry::{Snippet, TopicRegistry};
/// Re-export response types.
pub use response::{RepeatCriteria, RepeatResponse, ResponseSpec, TalkResponse, TrueFalseText};
/// Re-export session types.
pub use session::{Choice, DialogueUi, LineColor, OptionLine, SpecialTalk, pick_talk_topic};
/// Re-export topic types.
pub use topic::{DynamicLine, SpeakerEffect, TALK_DONE, TALK_NONE, TalkTopic, TopicDef};
/// Re-export trial types.
pub use trial::{TalkTrial, TrialKind, TrialMod};
