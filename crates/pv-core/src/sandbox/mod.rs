//! In-memory implementations of [`Talker`](crate::Talker) and
//! [`GameWorld`](crate::GameWorld).
//!
//! A [`Character`] keeps all of its state in plain fields and records what
//! was done to it; a [`Sandbox`] keeps a log of every world event. Both are
//! deserializable so a scene can be described in JSON.

mod character;
mod world;

pub use character::Character;
pub use world::{Sandbox, WorldEvent};
