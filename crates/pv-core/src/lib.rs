//! Core types for Palaver: the actor facade and the world collaborator.
//!
//! The conversation engine never touches concrete game entities. Everything
//! it needs from "whoever is speaking" goes through the [`Talker`] trait, and
//! everything it needs from the surrounding game goes through [`GameWorld`].
//! The [`sandbox`] module provides in-memory implementations of both, used by
//! the CLI and by tests.

/// Zero-argument named actions an NPC can be asked to perform.
pub mod action;
/// Error types used throughout the crate.
pub mod error;
/// Items and item types.
pub mod item;
/// Missions offered by and assigned through NPCs.
pub mod mission;
/// Opinion values and their mission-scaled variant.
pub mod opinion;
/// Conversation roles.
pub mod role;
/// In-memory implementations of the actor facade and world.
pub mod sandbox;
/// The catalog of named numeric stats.
pub mod stat;
/// The actor facade trait.
pub mod talker;
/// In-game time points and durations.
pub mod time;
/// String-keyed variable stores.
pub mod vars;
/// The world collaborator trait.
pub mod world;

/// Re-export action types.
pub use action::{Consequence, NamedAction};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export item types.
pub use item::{Item, ItemType};
/// Re-export mission types.
pub use mission::{Mission, MissionId, MissionStatus};
/// Re-export opinion types.
pub use opinion::Opinion;
/// Re-export the role enum.
pub use role::Role;
/// Re-export the stat catalog.
pub use stat::Stat;
/// Re-export the actor facade.
pub use talker::{Gender, Talker, TalkerId};
/// Re-export time types.
pub use time::{TimeDuration, TimePoint};
/// Re-export the variable store.
pub use vars::VarStore;
/// Re-export the world collaborator.
pub use world::{GameWorld, Tripoint};
